//! Service List validation
//!
//! [`ServiceListChecker`] runs one document through parse, schema revision
//! resolution, optional schema validation, the business rules and a final
//! pass for document-wide checks such as unused regions. Each stage only
//! starts when the previous one let the document through.

use crate::documents::{ElementExt, XmlDocument};
use crate::limits::Limits;
use crate::namespaces::SERVICE_LIST_ROOT;
use crate::reference::{ReferenceData, ReferenceStore, Vocabulary};
use crate::report::{Finding, Report};
use crate::terms::{NVOD_REFERENCE, NVOD_TIMESHIFTED};
use crate::validators::delivery::{check_content_protection, check_delivery, signals_application};
use crate::validators::helpers::{
    is_frame_rate, is_http_url, is_iso_duration, is_ratio, is_tag_uri, is_utc_datetime,
};
use crate::validators::lcn::{check_lcn_tables, LcnScope};
use crate::validators::multilingual::{check_language_uniqueness, LanguageRule};
use crate::validators::regions::{check_region_list, RegionTable};
use crate::validators::related_material::{check_related_material, MaterialLocation};
use crate::validators::validation::{
    Outcome, Stage, ValidationContext, KEY_INVALID_LANGUAGE, KEY_INVALID_VALUE, KEY_MISSING,
    KEY_REFERENCE_UNAVAILABLE,
};
use crate::validators::{open_document, SchemaCheck};
use crate::versions::SERVICE_LIST_VERSIONS;
use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use roxmltree::Node;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// Category key for a duplicated identifier
pub const KEY_DUPLICATE_ID: &str = "duplicate identifier";
/// Category key for a reference that does not resolve
pub const KEY_UNRESOLVED: &str = "unresolved reference";
/// Category key for NVOD signalling errors
pub const KEY_NVOD: &str = "NVOD";
/// Category key for prominence list errors
pub const KEY_PROMINENCE: &str = "prominence";
/// Category key for availability errors
pub const KEY_AVAILABILITY: &str = "availability";

const DOCUMENT: &str = "SL001";
const LIST: &str = "SL010";
const PACKAGES: &str = "SL020";
const CG_SOURCE: &str = "SL030";
const LIST_MATERIAL: &str = "SL040";
const SERVICE_ID: &str = "SL100";
const SERVICE_NAMES: &str = "SL110";
const SERVICE_TERMS: &str = "SL120";
const CG_REFS: &str = "SL130";
const NVOD: &str = "SL140";
const PROMINENCE: &str = "SL150";
const SERVICE_MATERIAL: &str = "SL160";
const INSTANCE_NAMES: &str = "SL200";
const ATTRIBUTES: &str = "SL210";
const AVAILABILITY: &str = "SL220";
const INSTANCE_MATERIAL: &str = "SL240";

const CODES: &[(&str, &str)] = &[
    (DOCUMENT, "document structure and namespace"),
    (LIST, "service list attributes"),
    (PACKAGES, "subscription packages"),
    (CG_SOURCE, "content guide sources"),
    (LIST_MATERIAL, "service list related material"),
    (SERVICE_ID, "service identifiers"),
    (SERVICE_NAMES, "service names"),
    (SERVICE_TERMS, "service classification terms"),
    (CG_REFS, "content guide references"),
    (NVOD, "NVOD signalling"),
    (PROMINENCE, "prominence lists"),
    (SERVICE_MATERIAL, "service related material"),
    (INSTANCE_NAMES, "service instance names"),
    (ATTRIBUTES, "content attributes"),
    (AVAILABILITY, "availability"),
    (INSTANCE_MATERIAL, "service instance related material"),
];

const ENDPOINTS: &[(&str, bool)] = &[
    ("ScheduleInfoEndpoint", true),
    ("ProgramInfoEndpoint", false),
    ("GroupInfoEndpoint", false),
    ("MoreEpisodesEndpoint", false),
];

static DAYS_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-7]( [1-7])*$").unwrap());
static ZULU_TIME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01][0-9]|2[0-3]):[0-5][0-9]:[0-5][0-9](\.[0-9]+)?Z$").unwrap());

/// Validates DVB-I Service List documents
pub struct ServiceListChecker<'r> {
    data: &'r ReferenceData,
    limits: Limits,
    schema: Option<Arc<dyn SchemaCheck>>,
}

impl<'r> ServiceListChecker<'r> {
    /// Create a checker consulting `data`
    pub fn new(data: &'r ReferenceData) -> Self {
        Self {
            data,
            limits: Limits::default(),
            schema: None,
        }
    }

    /// Use `limits` instead of the defaults
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Run `schema` before the business rules
    pub fn with_schema(mut self, schema: Arc<dyn SchemaCheck>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Validate one Service List document
    pub fn validate(&self, xml: &str) -> Report {
        self.validate_with_outcome(xml).0
    }

    /// Validate one Service List document, also returning how far it got
    pub fn validate_with_outcome(&self, xml: &str) -> (Report, Outcome) {
        let mut report = Report::new();
        for (code, description) in CODES {
            report.describe_code(*code, *description);
        }

        let (doc, version) = match open_document(
            xml,
            &self.limits,
            SERVICE_LIST_ROOT,
            SERVICE_LIST_VERSIONS,
            DOCUMENT,
            &mut report,
        ) {
            Ok(opened) => opened,
            Err(stage) => {
                debug!(stage = %stage, "service list rejected");
                return (report, Outcome::Rejected(stage));
            }
        };

        if let Some(schema) = &self.schema {
            debug!(stage = %Stage::SchemaValidate, schema = version.schema_file);
            if !schema.validate(&doc, version, &mut report) {
                debug!("schema validation reported errors, continuing with rule checks");
            }
        }

        debug!(stage = %Stage::RuleCheck, namespace = version.namespace);
        let ctx = ValidationContext::new(doc.root(), version, self.data);
        let mut pass = ServiceListPass {
            doc: &doc,
            ctx,
            report,
            regions: RegionTable::default(),
            packages: HashSet::new(),
            cg_sources: HashSet::new(),
            services: HashMap::new(),
        };
        pass.run();

        debug!(stage = %Stage::Finalize);
        pass.regions.report_unused(&mut pass.report);

        let report = pass.report;
        info!(
            "Validated service list ({}): {} errors, {} warnings",
            version.namespace,
            report.error_count(),
            report.warning_count()
        );
        (report, Outcome::Completed)
    }
}

struct ServiceListPass<'d, 'input, 'r> {
    doc: &'d XmlDocument<'input>,
    ctx: ValidationContext<'r>,
    report: Report,
    regions: RegionTable,
    packages: HashSet<String>,
    cg_sources: HashSet<String>,
    /// Declared services and their NVOD mode
    services: HashMap<String, Option<&'d str>>,
}

impl<'d, 'input, 'r> ServiceListPass<'d, 'input, 'r> {
    fn run(&mut self) {
        let root = self.doc.root();

        match self.ctx.required_attribute(self.doc, root, "version", LIST, &mut self.report) {
            Some(v) if v.trim().parse::<u64>().map_or(false, |n| n > 0) => {}
            Some(v) => self.report.add(
                Finding::error(LIST, format!("ServiceList@version \"{}\" is not a positive integer", v))
                    .with_key(KEY_INVALID_VALUE)
                    .at(self.doc.source_ref(root)),
            ),
            None => {}
        }

        check_language_uniqueness(
            self.doc,
            &self.ctx,
            root,
            LanguageRule::new("Name", LIST).mandatory(),
            &mut self.report,
        );
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            root,
            LanguageRule::new("ProviderName", LIST).mandatory(),
            &mut self.report,
        );
        for material in root.find_children("RelatedMaterial") {
            check_related_material(
                self.doc,
                &self.ctx,
                material,
                MaterialLocation::ServiceList,
                LIST_MATERIAL,
                &mut self.report,
            );
        }

        if let Some(list) = root.first_child_named("RegionList") {
            self.regions = check_region_list(self.doc, &self.ctx, list, &mut self.report);
        }
        for target in root.find_children("TargetRegion") {
            let id = target.text_content();
            self.regions
                .check_reference(self.doc, target, id.trim(), LIST, &mut self.report);
        }

        if let Some(list) = root.first_child_named("SubscriptionPackageList") {
            self.collect_packages(list);
        }

        if let Some(list) = root.first_child_named("ContentGuideSourceList") {
            for source in list.find_children("ContentGuideSource") {
                if let Some(id) =
                    self.ctx
                        .required_attribute(self.doc, source, "CGSID", CG_SOURCE, &mut self.report)
                {
                    if !self.cg_sources.insert(id.to_string()) {
                        self.report.add(
                            Finding::error(CG_SOURCE, format!("CGSID \"{}\" is not unique", id))
                                .with_key(KEY_DUPLICATE_ID)
                                .at(self.doc.source_ref(source)),
                        );
                    }
                }
                self.check_cg_source(source);
            }
        }
        if let Some(source) = root.first_child_named("ContentGuideSource") {
            self.check_cg_source(source);
        }

        let services = root.find_children("Service");
        self.collect_services(&services);

        if let Some(list) = root.first_child_named("LCNTableList") {
            let ids: HashSet<String> = self.services.keys().cloned().collect();
            let scope = LcnScope {
                services: &ids,
                packages: &self.packages,
            };
            check_lcn_tables(
                self.doc,
                &self.ctx,
                list,
                scope,
                &mut self.regions,
                &mut self.report,
            );
        }

        for service in services {
            self.check_service(service);
        }
    }

    fn collect_packages(&mut self, list: Node) {
        let mut seen: HashMap<(String, Option<String>), Node> = HashMap::new();
        for package in list.find_children("SubscriptionPackage") {
            let name = package.text_content().trim().to_string();
            if name.is_empty() {
                self.report.add(
                    Finding::error(PACKAGES, "SubscriptionPackage is empty")
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(package)),
                );
                continue;
            }
            if let Some(lang) = package.xml_lang() {
                self.ctx
                    .check_language(self.doc, package, lang, PACKAGES, &mut self.report);
            }
            let key = (name.clone(), package.xml_lang().map(str::to_ascii_lowercase));
            if let Some(&first) = seen.get(&key) {
                self.report.add(
                    Finding::error(PACKAGES, format!("SubscriptionPackage \"{}\" is declared more than once", name))
                        .with_key(KEY_DUPLICATE_ID)
                        .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(package)]),
                );
            } else {
                seen.insert(key, package);
            }
            self.packages.insert(name);
        }
    }

    fn check_cg_source(&mut self, source: Node) {
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            source,
            LanguageRule::new("Name", CG_SOURCE).mandatory(),
            &mut self.report,
        );
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            source,
            LanguageRule::new("ProviderName", CG_SOURCE).mandatory(),
            &mut self.report,
        );
        for material in source.find_children("RelatedMaterial") {
            check_related_material(
                self.doc,
                &self.ctx,
                material,
                MaterialLocation::ContentGuideSource,
                CG_SOURCE,
                &mut self.report,
            );
        }

        for &(name, mandatory) in ENDPOINTS {
            let endpoint = if mandatory {
                self.ctx
                    .required_child(self.doc, source, name, CG_SOURCE, &mut self.report)
            } else {
                source.first_child_named(name)
            };
            let Some(endpoint) = endpoint else {
                continue;
            };
            if let Some(uri) = self
                .ctx
                .required_child(self.doc, endpoint, "URI", CG_SOURCE, &mut self.report)
            {
                let value = uri.text_content();
                if !is_http_url(value.trim()) {
                    self.report.add(
                        Finding::error(
                            CG_SOURCE,
                            format!("{} URI \"{}\" is not a valid HTTP(S) URL", name, value.trim()),
                        )
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(uri)),
                    );
                }
            }
        }
    }

    /// Record every service before the rules that refer across services run
    fn collect_services(&mut self, services: &[Node<'d, 'input>]) {
        let mut first_seen: HashMap<String, Node> = HashMap::new();
        for &service in services {
            let Some(id_node) = service.first_child_named("UniqueIdentifier") else {
                continue;
            };
            let id = id_node.text_content().trim().to_string();
            if let Some(&first) = first_seen.get(&id) {
                self.report.add(
                    Finding::error(SERVICE_ID, format!("UniqueIdentifier \"{}\" is not unique", id))
                        .with_key(KEY_DUPLICATE_ID)
                        .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(id_node)]),
                );
                continue;
            }
            first_seen.insert(id.clone(), id_node);
            let mode = service
                .first_child_named("NVOD")
                .and_then(|n| n.attribute("mode"));
            self.services.insert(id, mode);
        }
    }

    fn check_service(&mut self, service: Node<'d, 'input>) {
        let id = self
            .ctx
            .required_child(self.doc, service, "UniqueIdentifier", SERVICE_ID, &mut self.report)
            .map(|n| (n, n.text_content().trim().to_string()));
        if let Some((node, id)) = &id {
            if !is_tag_uri(id) {
                self.report.add(
                    Finding::error(SERVICE_ID, format!("UniqueIdentifier \"{}\" is not a tag URI", id))
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(*node)),
                );
            }
        }
        let own_id = id.map(|(_, id)| id);

        check_language_uniqueness(
            self.doc,
            &self.ctx,
            service,
            LanguageRule::new("ServiceName", SERVICE_NAMES).mandatory(),
            &mut self.report,
        );
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            service,
            LanguageRule::new("ProviderName", SERVICE_NAMES),
            &mut self.report,
        );
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            service,
            LanguageRule::new("ServiceDescription", SERVICE_NAMES),
            &mut self.report,
        );

        for target in service.find_children("TargetRegion") {
            let region = target.text_content();
            self.regions
                .check_reference(self.doc, target, region.trim(), SERVICE_ID, &mut self.report);
        }

        for (element, vocabulary) in [
            ("ServiceGenre", Vocabulary::Genre),
            ("ServiceType", Vocabulary::ServiceType),
            ("RecordingInfo", Vocabulary::RecordingInfo),
        ] {
            for node in service.find_children(element) {
                if let Some(href) =
                    self.ctx
                        .required_attribute(self.doc, node, "href", SERVICE_TERMS, &mut self.report)
                {
                    self.ctx.check_term(
                        self.doc,
                        node,
                        vocabulary,
                        href,
                        SERVICE_TERMS,
                        &mut self.report,
                    );
                }
            }
        }

        for material in service.find_children("RelatedMaterial") {
            check_related_material(
                self.doc,
                &self.ctx,
                material,
                MaterialLocation::Service,
                SERVICE_MATERIAL,
                &mut self.report,
            );
        }

        self.check_guide_references(service, own_id.as_deref());
        if let Some(nvod) = service.first_child_named("NVOD") {
            self.check_nvod(nvod, own_id.as_deref());
        }
        if let Some(list) = service.first_child_named("ProminenceList") {
            self.check_prominence(list);
        }

        let instances = service.find_children("ServiceInstance");
        if instances.is_empty() && !signals_application(service) {
            self.report.add(
                Finding::error(SERVICE_ID, "a Service requires at least one ServiceInstance")
                    .with_key(KEY_MISSING)
                    .at(self.doc.source_ref(service)),
            );
        }
        for instance in instances {
            self.check_instance(instance, service);
        }
    }

    fn check_guide_references(&mut self, service: Node, own_id: Option<&str>) {
        if let Some(reference) = service.first_child_named("ContentGuideSourceRef") {
            let id = reference.text_content();
            if !self.cg_sources.contains(id.trim()) {
                self.report.add(
                    Finding::error(
                        CG_REFS,
                        format!("ContentGuideSourceRef \"{}\" does not match a CGSID", id.trim()),
                    )
                    .with_key(KEY_UNRESOLVED)
                    .at(self.doc.source_ref(reference)),
                );
            }
        }
        if let Some(source) = service.first_child_named("ContentGuideSource") {
            self.check_cg_source(source);
        }
        if let Some(reference) = service.first_child_named("ContentGuideServiceRef") {
            let target = reference.text_content();
            let target = target.trim();
            if Some(target) == own_id {
                self.report.add(
                    Finding::error(CG_REFS, "ContentGuideServiceRef may not refer to its own service")
                        .with_key(KEY_UNRESOLVED)
                        .at(self.doc.source_ref(reference)),
                );
            } else if !self.services.contains_key(target) {
                self.report.add(
                    Finding::error(
                        CG_REFS,
                        format!("ContentGuideServiceRef \"{}\" does not match a service", target),
                    )
                    .with_key(KEY_UNRESOLVED)
                    .at(self.doc.source_ref(reference)),
                );
            }
        }
    }

    fn check_nvod(&mut self, nvod: Node, own_id: Option<&str>) {
        let Some(mode) = self
            .ctx
            .required_attribute(self.doc, nvod, "mode", NVOD, &mut self.report)
        else {
            return;
        };
        match mode {
            NVOD_REFERENCE => {
                let Some(target) =
                    self.ctx
                        .required_attribute(self.doc, nvod, "reference", NVOD, &mut self.report)
                else {
                    return;
                };
                let target = target.trim();
                let message = match self.services.get(target) {
                    _ if Some(target) == own_id => {
                        Some(format!("NVOD@reference \"{}\" refers to its own service", target))
                    }
                    None => Some(format!("NVOD@reference \"{}\" does not match a service", target)),
                    Some(Some(NVOD_REFERENCE)) => None,
                    Some(_) => Some(format!(
                        "NVOD@reference \"{}\" refers to a service not in {} mode",
                        target, NVOD_REFERENCE
                    )),
                };
                if let Some(message) = message {
                    self.report.add(
                        Finding::error(NVOD, message)
                            .with_key(KEY_NVOD)
                            .at(self.doc.source_ref(nvod)),
                    );
                }
                if let Some(offset) = nvod.attribute("offset") {
                    if !is_iso_duration(offset) {
                        self.report.add(
                            Finding::error(NVOD, format!("NVOD@offset \"{}\" is not a duration", offset))
                                .with_key(KEY_INVALID_VALUE)
                                .at(self.doc.source_ref(nvod)),
                        );
                    }
                }
            }
            NVOD_TIMESHIFTED => {
                for attribute in ["reference", "offset"] {
                    if nvod.attribute(attribute).is_some() {
                        self.report.add(
                            Finding::error(
                                NVOD,
                                format!("NVOD@{} is not permitted in {} mode", attribute, NVOD_TIMESHIFTED),
                            )
                            .with_key(KEY_NVOD)
                            .at(self.doc.source_ref(nvod)),
                        );
                    }
                }
            }
            other => self.report.add(
                Finding::error(NVOD, format!("NVOD@mode \"{}\" is not valid", other))
                    .with_key(KEY_INVALID_VALUE)
                    .at(self.doc.source_ref(nvod)),
            ),
        }
    }

    fn check_prominence(&mut self, list: Node) {
        let mut tuples: HashMap<(Option<String>, Option<String>, Option<String>), Node> =
            HashMap::new();
        let mut rankings: HashMap<(Option<String>, Option<String>), Node> = HashMap::new();

        for prominence in list.find_children("Prominence") {
            let country = prominence.attribute("country").map(|c| c.trim().to_ascii_uppercase());
            let region = prominence.attribute("region").map(|r| r.trim().to_string());
            let ranking = prominence.attribute("ranking").map(|r| r.trim().to_string());

            if let Some(country) = &country {
                self.ctx
                    .check_country(self.doc, prominence, country, PROMINENCE, &mut self.report);
            }
            if let Some(region) = &region {
                if self
                    .regions
                    .check_reference(self.doc, prominence, region, PROMINENCE, &mut self.report)
                {
                    let declared = self
                        .regions
                        .get(region)
                        .map(|e| e.countries.clone())
                        .unwrap_or_default();
                    if let Some(country) = &country {
                        if !declared.is_empty()
                            && !declared.iter().any(|c| c.eq_ignore_ascii_case(country))
                        {
                            self.report.add(
                                Finding::error(
                                    PROMINENCE,
                                    format!("region \"{}\" is not in country \"{}\"", region, country),
                                )
                                .with_key(KEY_PROMINENCE)
                                .at(self.doc.source_ref(prominence)),
                            );
                        }
                    }
                }
            }
            if let Some(ranking) = &ranking {
                if ranking.parse::<u32>().map_or(true, |n| n == 0) {
                    self.report.add(
                        Finding::error(PROMINENCE, format!("ranking \"{}\" is not a positive integer", ranking))
                            .with_key(KEY_INVALID_VALUE)
                            .at(self.doc.source_ref(prominence)),
                    );
                }
            }

            let tuple = (country.clone(), region.clone(), ranking.clone());
            if let Some(&first) = tuples.get(&tuple) {
                self.report.add(
                    Finding::error(PROMINENCE, "Prominence is given more than once")
                        .with_key(KEY_PROMINENCE)
                        .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(prominence)]),
                );
                continue;
            }
            tuples.insert(tuple, prominence);

            if ranking.is_some() {
                let scope = (country, region);
                if let Some(&first) = rankings.get(&scope) {
                    self.report.add(
                        Finding::error(
                            PROMINENCE,
                            "more than one ranking for the same country and region",
                        )
                        .with_key(KEY_PROMINENCE)
                        .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(prominence)]),
                    );
                } else {
                    rankings.insert(scope, prominence);
                }
            }
        }
    }

    fn check_instance(&mut self, instance: Node, service: Node) {
        check_language_uniqueness(
            self.doc,
            &self.ctx,
            instance,
            LanguageRule::new("DisplayName", INSTANCE_NAMES),
            &mut self.report,
        );
        for material in instance.find_children("RelatedMaterial") {
            check_related_material(
                self.doc,
                &self.ctx,
                material,
                MaterialLocation::ServiceInstance,
                INSTANCE_MATERIAL,
                &mut self.report,
            );
        }
        for protection in instance.find_children("ContentProtection") {
            check_content_protection(self.doc, self.ctx.data, protection, &mut self.report);
        }
        if let Some(attributes) = instance.first_child_named("ContentAttributes") {
            self.check_content_attributes(attributes);
        }
        for availability in instance.find_children("Availability") {
            self.check_availability(availability);
        }
        for package in instance.find_children("SubscriptionPackage") {
            let name = package.text_content();
            if !self.packages.contains(name.trim()) {
                self.report.add(
                    Finding::error(
                        PACKAGES,
                        format!("subscription package \"{}\" is not declared", name.trim()),
                    )
                    .with_key(KEY_UNRESOLVED)
                    .at(self.doc.source_ref(package)),
                );
            }
        }
        check_delivery(self.doc, &self.ctx, instance, service, &mut self.report);
    }

    fn check_href(&mut self, node: Node, vocabulary: Vocabulary) {
        if let Some(href) = self
            .ctx
            .required_attribute(self.doc, node, "href", ATTRIBUTES, &mut self.report)
        {
            self.ctx
                .check_term(self.doc, node, vocabulary, href, ATTRIBUTES, &mut self.report);
        }
    }

    fn check_content_attributes(&mut self, attributes: Node) {
        for audio in attributes.find_children("AudioAttributes") {
            for coding in audio.find_children("Coding") {
                self.check_href(coding, Vocabulary::AudioCodec);
            }
            for mix in audio.find_children("MixType") {
                self.check_href(mix, Vocabulary::AudioPresentation);
            }
            for language in audio.find_children("AudioLanguage") {
                let tag = language.text_content();
                self.ctx
                    .check_language(self.doc, language, tag.trim(), ATTRIBUTES, &mut self.report);
                if let Some(purpose) = language.attribute("purpose") {
                    self.ctx.check_term(
                        self.doc,
                        language,
                        Vocabulary::AudioPurpose,
                        purpose,
                        ATTRIBUTES,
                        &mut self.report,
                    );
                }
            }
        }

        for video in attributes.find_children("VideoAttributes") {
            for coding in video.find_children("Coding") {
                self.check_href(coding, Vocabulary::VideoCodec);
            }
            for format in video.find_children("PictureFormat") {
                self.check_href(format, Vocabulary::PictureFormat);
            }
            for colorimetry in video.find_children("Colorimetry") {
                self.check_href(colorimetry, Vocabulary::Colorimetry);
            }
            for rate in video.find_children("FrameRate") {
                let value = rate.text_content();
                if !is_frame_rate(value.trim()) {
                    self.report.add(
                        Finding::error(ATTRIBUTES, format!("FrameRate \"{}\" is not valid", value.trim()))
                            .with_key(KEY_INVALID_VALUE)
                            .at(self.doc.source_ref(rate)),
                    );
                }
            }
            for ratio in video.find_children("AspectRatio") {
                let value = ratio.text_content();
                if !is_ratio(value.trim()) {
                    self.report.add(
                        Finding::error(ATTRIBUTES, format!("AspectRatio \"{}\" is not a ratio", value.trim()))
                            .with_key(KEY_INVALID_VALUE)
                            .at(self.doc.source_ref(ratio)),
                    );
                }
            }
        }

        for point in attributes.find_children("AudioConformancePoint") {
            self.check_href(point, Vocabulary::AudioConformance);
        }
        for point in attributes.find_children("VideoConformancePoint") {
            self.check_href(point, Vocabulary::VideoConformance);
        }

        for caption in attributes.find_children("CaptionLanguage") {
            let tag = caption.text_content();
            self.ctx
                .check_language(self.doc, caption, tag.trim(), ATTRIBUTES, &mut self.report);
        }
        for subtitles in attributes.find_children("SubtitleAttributes") {
            for purpose in subtitles.find_children("Purpose") {
                self.check_href(purpose, Vocabulary::SubtitlePurpose);
            }
        }
        for sign in attributes.find_children("SignLanguage") {
            self.check_sign_language(sign);
        }
        for accessibility in attributes.find_children("AccessibilityAttributes") {
            for node in accessibility.descendants().filter(|n| n.is_element()) {
                if let Some(purpose) = node.attribute("purpose") {
                    self.ctx.check_term(
                        self.doc,
                        node,
                        Vocabulary::AccessibilityPurpose,
                        purpose,
                        ATTRIBUTES,
                        &mut self.report,
                    );
                }
            }
        }
    }

    fn check_sign_language(&mut self, sign: Node) {
        let tag = sign.text_content();
        let tag = tag.trim();
        let Some(store) = &self.ctx.data.languages else {
            return;
        };
        if store.is_empty() {
            self.report.add(
                Finding::warning(ATTRIBUTES, format!("language registry not loaded, \"{}\" not checked", tag))
                    .with_key(KEY_REFERENCE_UNAVAILABLE)
                    .at(self.doc.source_ref(sign)),
            );
        } else if !store.is_known_sign_language(tag) {
            self.report.add(
                Finding::error(ATTRIBUTES, format!("\"{}\" is not a sign language", tag))
                    .with_key(KEY_INVALID_LANGUAGE)
                    .at(self.doc.source_ref(sign)),
            );
        }
    }

    fn check_availability(&mut self, availability: Node) {
        for period in availability.find_children("Period") {
            let mut bounds = Vec::new();
            for name in ["validFrom", "validTo"] {
                let Some(value) = period.attribute(name) else {
                    bounds.push(None);
                    continue;
                };
                if is_utc_datetime(value) {
                    bounds.push(DateTime::parse_from_rfc3339(value).ok());
                } else {
                    self.report.add(
                        Finding::error(AVAILABILITY, format!("Period@{} \"{}\" is not a UTC time", name, value))
                            .with_key(KEY_INVALID_VALUE)
                            .at(self.doc.source_ref(period)),
                    );
                    bounds.push(None);
                }
            }
            if let [Some(from), Some(to)] = &bounds[..] {
                if from >= to {
                    self.report.add(
                        Finding::error(AVAILABILITY, "Period@validFrom must be before Period@validTo")
                            .with_key(KEY_AVAILABILITY)
                            .at(self.doc.source_ref(period)),
                    );
                }
            }

            for interval in period.find_children("Interval") {
                if let Some(days) = interval.attribute("days") {
                    if !DAYS_REGEX.is_match(days.trim()) {
                        self.report.add(
                            Finding::error(AVAILABILITY, format!("Interval@days \"{}\" is not valid", days))
                                .with_key(KEY_INVALID_VALUE)
                                .at(self.doc.source_ref(interval)),
                        );
                    }
                }
                for name in ["startTime", "endTime"] {
                    if let Some(time) = interval.attribute(name) {
                        if !ZULU_TIME_REGEX.is_match(time) {
                            self.report.add(
                                Finding::error(
                                    AVAILABILITY,
                                    format!("Interval@{} \"{}\" is not a UTC time of day", name, time),
                                )
                                .with_key(KEY_INVALID_VALUE)
                                .at(self.doc.source_ref(interval)),
                            );
                        }
                    }
                }
            }
        }
    }
}
