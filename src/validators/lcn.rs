//! Logical channel number tables
//!
//! Each `LCNTable` applies to a set of target regions and subscription
//! packages. No two tables may apply to the same (region, package) pair, a
//! table may not hand out a channel number twice, and every entry must point
//! at a service declared in the same list.

use crate::documents::{ElementExt, XmlDocument};
use crate::report::{Finding, Report};
use crate::validators::regions::RegionTable;
use crate::validators::validation::{ValidationContext, KEY_INVALID_VALUE};
use roxmltree::Node;
use std::collections::{HashMap, HashSet};

/// Category key for an entry pointing at an undeclared service
pub const KEY_UNKNOWN_SERVICE: &str = "LCN unknown service";
/// Category key for tables that apply to the same region and package
pub const KEY_DUPLICATE_QUALIFIERS: &str = "duplicate LCN qualifiers";
/// Category key for a channel number used twice in a table
pub const KEY_DUPLICATE_CHANNEL: &str = "duplicate channel number";
/// Category key for a reference to an undeclared subscription package
pub const KEY_UNKNOWN_PACKAGE: &str = "unknown subscription package";

const CODE: &str = "LCN001";

/// Identifiers that LCN entries may refer to
#[derive(Debug, Clone, Copy)]
pub struct LcnScope<'s> {
    /// `UniqueIdentifier` of every declared service
    pub services: &'s HashSet<String>,
    /// Every declared subscription package
    pub packages: &'s HashSet<String>,
}

/// Check every `LCNTable` in an `LCNTableList`
pub fn check_lcn_tables(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    list: Node,
    scope: LcnScope,
    regions: &mut RegionTable,
    report: &mut Report,
) {
    let mut qualifiers: HashMap<(Option<String>, Option<String>), Node> = HashMap::new();

    for table in list.find_children("LCNTable") {
        let mut targets: Vec<Option<String>> = Vec::new();
        for target in table.find_children("TargetRegion") {
            let id = target.text_content().trim().to_string();
            regions.check_reference(doc, target, &id, CODE, report);
            targets.push(Some(id));
        }
        if targets.is_empty() {
            targets.push(None);
        }

        let mut packages: Vec<Option<String>> = Vec::new();
        for package in table.find_children("SubscriptionPackage") {
            let name = package.text_content().trim().to_string();
            if !scope.packages.contains(&name) {
                report.add(
                    Finding::error(
                        CODE,
                        format!("subscription package \"{}\" is not declared", name),
                    )
                    .with_key(KEY_UNKNOWN_PACKAGE)
                    .at(doc.source_ref(package)),
                );
            }
            packages.push(Some(name));
        }
        if packages.is_empty() {
            packages.push(None);
        }

        for region in &targets {
            for package in &packages {
                let key = (region.clone(), package.clone());
                if let Some(&first) = qualifiers.get(&key) {
                    report.add(
                        Finding::error(
                            CODE,
                            format!(
                                "more than one LCNTable for region \"{}\" and package \"{}\"",
                                region.as_deref().unwrap_or("(any)"),
                                package.as_deref().unwrap_or("(any)")
                            ),
                        )
                        .with_key(KEY_DUPLICATE_QUALIFIERS)
                        .at_all(vec![doc.source_ref(first), doc.source_ref(table)]),
                    );
                } else {
                    qualifiers.insert(key, table);
                }
            }
        }

        check_lcn_entries(doc, ctx, table, scope, report);
    }
}

fn check_lcn_entries(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    table: Node,
    scope: LcnScope,
    report: &mut Report,
) {
    let mut numbers: HashMap<u32, Node> = HashMap::new();

    for lcn in table.find_children("LCN") {
        if let Some(number) = ctx.required_attribute(doc, lcn, "channelNumber", CODE, report) {
            match number.trim().parse::<u32>() {
                Ok(n) if n > 0 => {
                    if let Some(&first) = numbers.get(&n) {
                        report.add(
                            Finding::error(CODE, format!("channel number {} is used more than once", n))
                                .with_key(KEY_DUPLICATE_CHANNEL)
                                .at_all(vec![doc.source_ref(first), doc.source_ref(lcn)]),
                        );
                    } else {
                        numbers.insert(n, lcn);
                    }
                }
                _ => report.add(
                    Finding::error(CODE, format!("channelNumber \"{}\" is not a positive integer", number))
                        .with_key(KEY_INVALID_VALUE)
                        .at(doc.source_ref(lcn)),
                ),
            }
        }

        if let Some(service) = ctx.required_attribute(doc, lcn, "serviceRef", CODE, report) {
            if !scope.services.contains(service.trim()) {
                report.add(
                    Finding::error(
                        CODE,
                        format!("LCN reference to unknown service \"{}\"", service),
                    )
                    .with_key(KEY_UNKNOWN_SERVICE)
                    .at(doc.source_ref(lcn)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::SL_2023;
    use crate::reference::ReferenceData;
    use crate::report::Severity;
    use crate::validators::regions::check_region_list;
    use crate::versions::{resolve, SERVICE_LIST_VERSIONS};

    fn run(body: &str) -> Report {
        let xml = format!(
            "<ServiceList xmlns=\"{}\"><RegionList><Region regionID=\"R1\"/><Region regionID=\"R2\"/></RegionList><LCNTableList>{}</LCNTableList></ServiceList>",
            SL_2023, body
        );
        let doc = XmlDocument::parse(&xml).unwrap();
        let data = ReferenceData::new();
        let version = resolve(SERVICE_LIST_VERSIONS, SL_2023).unwrap();
        let ctx = ValidationContext::new(doc.root(), version, &data);
        let mut report = Report::new();
        let mut regions = check_region_list(
            &doc,
            &ctx,
            doc.root().first_child_named("RegionList").unwrap(),
            &mut report,
        );
        let services: HashSet<String> = ["tag:example.com,2024:a".to_string()].into();
        let packages: HashSet<String> = ["Premium".to_string()].into();
        let scope = LcnScope {
            services: &services,
            packages: &packages,
        };
        let list = doc.root().first_child_named("LCNTableList").unwrap();
        check_lcn_tables(&doc, &ctx, list, scope, &mut regions, &mut report);
        report
    }

    #[test]
    fn test_unknown_service() {
        let report = run(
            r#"<LCNTable><LCN channelNumber="1" serviceRef="tag:example.com,2024:a"/><LCN channelNumber="2" serviceRef="tag:example.com,2024:missing"/></LCNTable>"#,
        );
        assert_eq!(report.key_count(Severity::Error, KEY_UNKNOWN_SERVICE), 1);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_duplicate_channel_numbers() {
        let report = run(
            r#"<LCNTable><LCN channelNumber="1" serviceRef="tag:example.com,2024:a"/><LCN channelNumber="1" serviceRef="tag:example.com,2024:a"/></LCNTable>"#,
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_CHANNEL), 1);
    }

    #[test]
    fn test_duplicate_qualifiers() {
        let report = run(
            r#"<LCNTable><TargetRegion>R1</TargetRegion><SubscriptionPackage>Premium</SubscriptionPackage></LCNTable>
               <LCNTable><TargetRegion>R2</TargetRegion><TargetRegion>R1</TargetRegion><SubscriptionPackage>Premium</SubscriptionPackage></LCNTable>
               <LCNTable><TargetRegion>R2</TargetRegion></LCNTable>"#,
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_QUALIFIERS), 1);
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_unknown_region_and_package() {
        let report = run(
            r#"<LCNTable><TargetRegion>R9</TargetRegion><SubscriptionPackage>Basic</SubscriptionPackage></LCNTable>"#,
        );
        assert_eq!(report.key_count(Severity::Error, crate::validators::regions::KEY_UNKNOWN_REGION), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_UNKNOWN_PACKAGE), 1);
    }
}
