//! Region hierarchy
//!
//! `RegionList` declares a tree of regions that target regions, LCN tables and
//! prominence lists refer to by `regionID`. The tree is checked as it is read
//! and every accepted identifier lands in a [`RegionTable`], which records
//! whether anything refers to it.

use crate::documents::{ElementExt, XmlDocument};
use crate::limits::MAX_SUBREGION_LEVELS;
use crate::report::{Finding, Report, SourceRef};
use crate::validators::helpers::{
    is_latitude, is_longitude, is_postcode, is_wildcard_postcode, parse_bool,
};
use crate::validators::multilingual::{check_language_uniqueness, LanguageRule};
use crate::validators::validation::ValidationContext;
use crate::versions::{VersionRange, SL_V4};
use indexmap::IndexMap;
use roxmltree::Node;

/// Category key for a repeated `regionID`
pub const KEY_DUPLICATE_REGION: &str = "duplicate regionID";
/// Category key for regions nested too deeply
pub const KEY_REGION_DEPTH: &str = "region depth";
/// Category key for a reference to an undeclared region
pub const KEY_UNKNOWN_REGION: &str = "unknown region";
/// Category key for a declared region nothing refers to
pub const KEY_UNUSED_REGION: &str = "unused region";
/// Category key for selectability problems
pub const KEY_SELECTABLE: &str = "selectable";

const CODE: &str = "RG001";

/// Schema revisions in which a sub-region may not carry `@countryCodes`
const SUBREGION_COUNTRY_CHECK: VersionRange = VersionRange::Until(SL_V4 - 1);

/// A declared region
#[derive(Debug, Clone)]
pub struct RegionEntry {
    /// Nesting level, 1 for a top-level region
    pub depth: usize,
    /// Whether a receiver may offer it for selection
    pub selectable: bool,
    /// Country codes in force, declared or inherited
    pub countries: Vec<String>,
    /// Whether anything refers to it
    pub used: bool,
    source: SourceRef,
}

/// Every region declared by a document
#[derive(Debug, Clone, Default)]
pub struct RegionTable {
    regions: IndexMap<String, RegionEntry>,
}

impl RegionTable {
    /// Whether `id` was declared
    pub fn contains(&self, id: &str) -> bool {
        self.regions.contains_key(id)
    }

    /// The entry for `id`
    pub fn get(&self, id: &str) -> Option<&RegionEntry> {
        self.regions.get(id)
    }

    /// Number of declared regions
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Whether no region was declared
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Note a reference to `id`; `false` when it was never declared
    pub fn mark_used(&mut self, id: &str) -> bool {
        match self.regions.get_mut(id) {
            Some(entry) => {
                entry.used = true;
                true
            }
            None => false,
        }
    }

    /// Identifiers that nothing referred to, in declaration order
    pub fn unused(&self) -> impl Iterator<Item = (&str, &RegionEntry)> {
        self.regions
            .iter()
            .filter(|(_, e)| !e.used)
            .map(|(id, e)| (id.as_str(), e))
    }

    /// Resolve a reference found at `node`, reporting unknown regions
    pub fn check_reference(
        &mut self,
        doc: &XmlDocument,
        node: Node,
        id: &str,
        code: &str,
        report: &mut Report,
    ) -> bool {
        if self.mark_used(id) {
            return true;
        }
        report.add(
            Finding::error(code, format!("region \"{}\" is not declared in the RegionList", id))
                .with_key(KEY_UNKNOWN_REGION)
                .at(doc.source_ref(node)),
        );
        false
    }

    /// Warn about every region nothing referred to
    pub fn report_unused(&self, report: &mut Report) {
        for (id, entry) in self.unused() {
            report.add(
                Finding::warning(CODE, format!("region \"{}\" is not used", id))
                    .with_key(KEY_UNUSED_REGION)
                    .at(entry.source.clone()),
            );
        }
    }
}

/// Read and check a `RegionList`
pub fn check_region_list(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    list: Node,
    report: &mut Report,
) -> RegionTable {
    let mut table = RegionTable::default();
    for region in list.find_children("Region") {
        check_region(doc, ctx, region, 1, &[], &mut table, report);
    }
    table
}

fn check_region(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    region: Node,
    depth: usize,
    inherited: &[String],
    table: &mut RegionTable,
    report: &mut Report,
) {
    if depth > MAX_SUBREGION_LEVELS {
        report.add(
            Finding::error(
                CODE,
                format!("regions may be nested at most {} levels deep", MAX_SUBREGION_LEVELS),
            )
            .with_key(KEY_REGION_DEPTH)
            .at(doc.source_ref(region)),
        );
        return;
    }

    let Some(id) = ctx.required_attribute(doc, region, "regionID", CODE, report) else {
        return;
    };

    let mut countries = inherited.to_vec();
    if let Some(codes) = region.attribute("countryCodes") {
        if depth > 1 && SUBREGION_COUNTRY_CHECK.contains(ctx.ordinal()) {
            report.add(
                Finding::error(
                    CODE,
                    format!("sub-region \"{}\" must not declare @countryCodes", id),
                )
                .with_key("subregion countryCodes")
                .at(doc.source_ref(region)),
            );
        }
        countries = codes
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|c| !c.is_empty())
            .map(str::to_string)
            .collect();
        for country in &countries {
            ctx.check_country(doc, region, country, CODE, report);
        }
    }

    let children = region.find_children("Region");
    let selectable = match region.attribute("selectable") {
        None => true,
        Some(value) => parse_bool(value).unwrap_or_else(|| {
            report.add(
                Finding::error(CODE, format!("@selectable=\"{}\" is not a boolean", value))
                    .with_key(KEY_SELECTABLE)
                    .at(doc.source_ref(region)),
            );
            true
        }),
    };
    if !selectable && (children.is_empty() || depth == MAX_SUBREGION_LEVELS) {
        report.add(
            Finding::error(
                CODE,
                format!("region \"{}\" has no sub-regions and must be selectable", id),
            )
            .with_key(KEY_SELECTABLE)
            .at(doc.source_ref(region)),
        );
    }

    check_language_uniqueness(doc, ctx, region, LanguageRule::new("RegionName", CODE), report);
    check_region_area(doc, region, report);

    if table.contains(id) {
        report.add(
            Finding::error(CODE, format!("regionID \"{}\" is already declared", id))
                .with_key(KEY_DUPLICATE_REGION)
                .at(doc.source_ref(region)),
        );
    } else {
        table.regions.insert(
            id.to_string(),
            RegionEntry {
                depth,
                selectable,
                countries: countries.clone(),
                used: false,
                source: doc.source_ref(region),
            },
        );
    }

    for child in children {
        check_region(doc, ctx, child, depth + 1, &countries, table, report);
    }
}

fn check_region_area(doc: &XmlDocument, region: Node, report: &mut Report) {
    let mut invalid = |node: Node, what: &str, value: &str| {
        report.add(
            Finding::error(CODE, format!("\"{}\" is not a valid {}", value, what))
                .with_key("invalid area")
                .at(doc.source_ref(node)),
        );
    };

    for postcode in region.find_children("Postcode") {
        let value = postcode.text_content();
        if !is_postcode(value.trim()) {
            invalid(postcode, "postcode", value.trim());
        }
    }
    for wildcard in region.find_children("WildcardPostcode") {
        let value = wildcard.text_content();
        if !is_wildcard_postcode(value.trim()) {
            invalid(wildcard, "wildcard postcode", value.trim());
        }
    }
    for range in region.find_children("PostcodeRange") {
        for bound in ["from", "to"] {
            let value = range.attribute(bound).unwrap_or_default();
            if !is_postcode(value) {
                invalid(range, "postcode range bound", value);
            }
        }
    }
    for coordinates in region.find_children("Coordinates") {
        if let Some(lat) = coordinates.first_child_named("Latitude") {
            let value = lat.text_content();
            if !is_latitude(&value) {
                invalid(lat, "latitude", value.trim());
            }
        }
        if let Some(lon) = coordinates.first_child_named("Longitude") {
            let value = lon.text_content();
            if !is_longitude(&value) {
                invalid(lon, "longitude", value.trim());
            }
        }
    }
}
