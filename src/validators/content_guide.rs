//! Content Guide validation
//!
//! A content guide response is a `TVAMain` document. What it may contain
//! depends on the query that produced it, so [`ContentGuideChecker`] is told
//! the [`RequestType`] along with the XML.

use crate::documents::{ElementExt, XmlDocument};
use crate::error::Error;
use crate::limits::{Limits, MAX_MINIMUM_AGE, MAX_TITLE_LENGTH};
use crate::namespaces::CONTENT_GUIDE_ROOT;
use crate::reference::{ReferenceData, Vocabulary};
use crate::report::{Finding, Report};
use crate::validators::helpers::{is_crid, is_http_url, is_iso_duration, is_utc_datetime};
use crate::validators::multilingual::{
    resolve_inherited_language, KEY_DUPLICATE_LANG, KEY_EMPTY_VALUE, KEY_TOO_LONG,
};
use crate::validators::related_material::{check_related_material, MaterialLocation};
use crate::validators::synopsis::{check_synopsis_lengths, SynopsisLength};
use crate::validators::validation::{
    Outcome, Stage, ValidationContext, KEY_INVALID_VALUE, KEY_MISSING,
};
use crate::validators::{open_document, SchemaCheck};
use crate::versions::CONTENT_GUIDE_VERSIONS;
use chrono::{DateTime, FixedOffset};
use roxmltree::Node;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info};

/// Category key for a table or element the request does not allow
pub const KEY_NOT_PERMITTED: &str = "not permitted for request";
/// Category key for a duplicated CRID
pub const KEY_DUPLICATE_CRID: &str = "duplicate CRID";
/// Category key for a CRID that matches no declared programme
pub const KEY_UNKNOWN_PROGRAMME: &str = "unknown programme";
/// Category key for a time window whose end is not after its start
pub const KEY_TIME_ORDER: &str = "time order";

const DOCUMENT: &str = "CG001";
const TABLES: &str = "CG010";
const PROGRAMME: &str = "CG020";
const TITLE: &str = "CG030";
const SYNOPSIS: &str = "CG040";
const CLASSIFICATION: &str = "CG050";
const MATERIAL: &str = "CG060";
const GROUP: &str = "CG070";
const LOCATION: &str = "CG080";

const CODES: &[(&str, &str)] = &[
    (DOCUMENT, "document structure and namespace"),
    (TABLES, "tables permitted for the request"),
    (PROGRAMME, "programme information"),
    (TITLE, "titles"),
    (SYNOPSIS, "synopses"),
    (CLASSIFICATION, "genres, parental guidance and credits"),
    (MATERIAL, "programme related material"),
    (GROUP, "group information"),
    (LOCATION, "schedules and on-demand programmes"),
];

const PROGRAM_INFORMATION_TABLE: &str = "ProgramInformationTable";
const GROUP_INFORMATION_TABLE: &str = "GroupInformationTable";
const PROGRAM_LOCATION_TABLE: &str = "ProgramLocationTable";

/// The content guide query a response answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestType {
    /// Schedule for a time range
    Schedule,
    /// Now and next events
    NowNext,
    /// Events in a window around now
    Window,
    /// Information about one programme
    ProgramInfo,
    /// Further episodes of a programme
    MoreEpisodes,
    /// Box set categories
    BoxSetCategories,
    /// Box sets in a category
    BoxSetLists,
    /// Contents of a box set
    BoxSetContents,
}

/// What a response to one request type may contain
#[derive(Debug, Clone, Copy)]
pub struct RequestRules {
    /// Tables permitted under `ProgramDescription`
    pub tables: &'static [&'static str],
    /// Whether `ProgramLocationTable` may hold `Schedule`
    pub schedule: bool,
    /// Whether `ProgramLocationTable` may hold `OnDemandProgram`
    pub on_demand: bool,
    /// Synopsis lengths every programme must give
    pub required_synopses: &'static [SynopsisLength],
    /// Synopsis lengths a programme may give
    pub optional_synopses: &'static [SynopsisLength],
}

const SCHEDULE_RULES: RequestRules = RequestRules {
    tables: &[
        PROGRAM_INFORMATION_TABLE,
        GROUP_INFORMATION_TABLE,
        PROGRAM_LOCATION_TABLE,
    ],
    schedule: true,
    on_demand: false,
    required_synopses: &[SynopsisLength::Medium],
    optional_synopses: &[SynopsisLength::Short, SynopsisLength::Long],
};

const PROGRAM_INFO_RULES: RequestRules = RequestRules {
    tables: &[PROGRAM_INFORMATION_TABLE, PROGRAM_LOCATION_TABLE],
    schedule: false,
    on_demand: true,
    required_synopses: &[SynopsisLength::Medium],
    optional_synopses: &[
        SynopsisLength::Short,
        SynopsisLength::Long,
        SynopsisLength::Extended,
    ],
};

const EPISODE_RULES: RequestRules = RequestRules {
    tables: &[
        PROGRAM_INFORMATION_TABLE,
        GROUP_INFORMATION_TABLE,
        PROGRAM_LOCATION_TABLE,
    ],
    schedule: false,
    on_demand: true,
    required_synopses: &[SynopsisLength::Medium],
    optional_synopses: &[SynopsisLength::Short, SynopsisLength::Long],
};

const GROUP_ONLY_RULES: RequestRules = RequestRules {
    tables: &[GROUP_INFORMATION_TABLE],
    schedule: false,
    on_demand: false,
    required_synopses: &[],
    optional_synopses: &[],
};

impl RequestType {
    /// Every request type
    pub const ALL: [RequestType; 8] = [
        RequestType::Schedule,
        RequestType::NowNext,
        RequestType::Window,
        RequestType::ProgramInfo,
        RequestType::MoreEpisodes,
        RequestType::BoxSetCategories,
        RequestType::BoxSetLists,
        RequestType::BoxSetContents,
    ];

    /// Name used on the command line and in configuration
    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Schedule => "schedule",
            RequestType::NowNext => "now-next",
            RequestType::Window => "window",
            RequestType::ProgramInfo => "program-info",
            RequestType::MoreEpisodes => "more-episodes",
            RequestType::BoxSetCategories => "box-set-categories",
            RequestType::BoxSetLists => "box-set-lists",
            RequestType::BoxSetContents => "box-set-contents",
        }
    }

    /// What a response may contain
    pub fn rules(self) -> &'static RequestRules {
        match self {
            RequestType::Schedule | RequestType::NowNext | RequestType::Window => &SCHEDULE_RULES,
            RequestType::ProgramInfo => &PROGRAM_INFO_RULES,
            RequestType::MoreEpisodes | RequestType::BoxSetContents => &EPISODE_RULES,
            RequestType::BoxSetCategories | RequestType::BoxSetLists => &GROUP_ONLY_RULES,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        RequestType::ALL
            .into_iter()
            .find(|r| r.as_str() == wanted)
            .ok_or_else(|| Error::Config(format!("unknown request type: {}", s)))
    }
}

/// Validates DVB-I content guide responses
pub struct ContentGuideChecker<'r> {
    data: &'r ReferenceData,
    limits: Limits,
    schema: Option<Arc<dyn SchemaCheck>>,
}

impl<'r> ContentGuideChecker<'r> {
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

    /// Validate a response to `request`
    pub fn validate(&self, xml: &str, request: RequestType) -> Report {
        self.validate_with_outcome(xml, request).0
    }

    /// Validate a response to `request`, also returning how far it got
    pub fn validate_with_outcome(&self, xml: &str, request: RequestType) -> (Report, Outcome) {
        let mut report = Report::new();
        for (code, description) in CODES {
            report.describe_code(*code, *description);
        }

        let (doc, version) = match open_document(
            xml,
            &self.limits,
            CONTENT_GUIDE_ROOT,
            CONTENT_GUIDE_VERSIONS,
            DOCUMENT,
            &mut report,
        ) {
            Ok(opened) => opened,
            Err(stage) => {
                debug!(stage = %stage, request = %request, "content guide rejected");
                return (report, Outcome::Rejected(stage));
            }
        };

        if let Some(schema) = &self.schema {
            debug!(stage = %Stage::SchemaValidate, schema = version.schema_file);
            schema.validate(&doc, version, &mut report);
        }

        debug!(stage = %Stage::RuleCheck, request = %request);
        let mut pass = ContentGuidePass {
            doc: &doc,
            ctx: ValidationContext::new(doc.root(), version, self.data),
            rules: request.rules(),
            report,
            programmes: HashSet::new(),
        };
        pass.run();

        debug!(stage = %Stage::Finalize);
        let report = pass.report;
        info!(
            "Validated {} response ({}): {} errors, {} warnings",
            request,
            version.namespace,
            report.error_count(),
            report.warning_count()
        );
        (report, Outcome::Completed)
    }
}

struct ContentGuidePass<'d, 'input, 'r> {
    doc: &'d XmlDocument<'input>,
    ctx: ValidationContext<'r>,
    rules: &'static RequestRules,
    report: Report,
    /// Lowercased programme CRIDs
    programmes: HashSet<String>,
}

impl<'d, 'input, 'r> ContentGuidePass<'d, 'input, 'r> {
    fn run(&mut self) {
        let root = self.doc.root();
        if root.xml_lang().is_none() {
            self.report.add(
                Finding::warning(DOCUMENT, "TVAMain@xml:lang is recommended")
                    .with_key(KEY_MISSING)
                    .at(self.doc.source_ref(root)),
            );
        }

        let Some(description) =
            self.ctx
                .required_child(self.doc, root, "ProgramDescription", DOCUMENT, &mut self.report)
        else {
            return;
        };

        for table in description.element_children() {
            if !self.rules.tables.contains(&table.local_name()) {
                self.report.add(
                    Finding::error(
                        TABLES,
                        format!("{} is not permitted in this response", self.ctx.qualified(table.local_name())),
                    )
                    .with_key(KEY_NOT_PERMITTED)
                    .at(self.doc.source_ref(table)),
                );
            }
        }

        if let Some(table) = description.first_child_named(PROGRAM_INFORMATION_TABLE) {
            self.check_programmes(table);
        }
        if let Some(table) = description.first_child_named(GROUP_INFORMATION_TABLE) {
            self.check_groups(table);
        }
        if let Some(table) = description.first_child_named(PROGRAM_LOCATION_TABLE) {
            self.check_locations(table);
        }
    }

    fn check_programmes(&mut self, table: Node) {
        let mut seen: HashMap<String, Node> = HashMap::new();
        for programme in table.find_children("ProgramInformation") {
            if let Some(crid) =
                self.ctx
                    .required_attribute(self.doc, programme, "programId", PROGRAMME, &mut self.report)
            {
                self.check_crid(programme, crid, "programId", &mut seen);
            }
            if let Some(basic) =
                self.ctx
                    .required_child(self.doc, programme, "BasicDescription", PROGRAMME, &mut self.report)
            {
                self.check_basic_description(basic, true);
            }
        }
        self.programmes.extend(seen.into_keys());
    }

    fn check_crid<'n, 'i>(
        &mut self,
        node: Node<'n, 'i>,
        crid: &str,
        attribute: &str,
        seen: &mut HashMap<String, Node<'n, 'i>>,
    ) {
        let code = if attribute == "groupId" { GROUP } else { PROGRAMME };
        if !is_crid(crid.trim()) {
            self.report.add(
                Finding::error(code, format!("@{} \"{}\" is not a CRID", attribute, crid))
                    .with_key(KEY_INVALID_VALUE)
                    .at(self.doc.source_ref(node)),
            );
            return;
        }
        let key = crid.trim().to_ascii_lowercase();
        if let Some(&first) = seen.get(&key) {
            self.report.add(
                Finding::error(code, format!("@{} \"{}\" is not unique", attribute, crid))
                    .with_key(KEY_DUPLICATE_CRID)
                    .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(node)]),
            );
        } else {
            seen.insert(key, node);
        }
    }

    fn check_basic_description(&mut self, basic: Node, programme: bool) {
        self.check_titles(basic);

        if programme {
            check_synopsis_lengths(
                self.doc,
                &self.ctx,
                basic,
                self.rules.required_synopses,
                self.rules.optional_synopses,
                SYNOPSIS,
                &mut self.report,
            );
        } else {
            check_synopsis_lengths(
                self.doc,
                &self.ctx,
                basic,
                &[],
                &[SynopsisLength::Short, SynopsisLength::Medium, SynopsisLength::Long],
                SYNOPSIS,
                &mut self.report,
            );
        }

        for genre in basic.find_children("Genre") {
            if let Some(href) =
                self.ctx
                    .required_attribute(self.doc, genre, "href", CLASSIFICATION, &mut self.report)
            {
                self.ctx.check_term(
                    self.doc,
                    genre,
                    Vocabulary::Genre,
                    href,
                    CLASSIFICATION,
                    &mut self.report,
                );
            }
        }

        for guidance in basic.find_children("ParentalGuidance") {
            self.check_parental_guidance(guidance);
        }

        if let Some(credits) = basic.first_child_named("CreditsList") {
            for item in credits.find_children("CreditsItem") {
                if let Some(role) =
                    self.ctx
                        .required_attribute(self.doc, item, "role", CLASSIFICATION, &mut self.report)
                {
                    self.ctx.check_term(
                        self.doc,
                        item,
                        Vocabulary::Role,
                        role,
                        CLASSIFICATION,
                        &mut self.report,
                    );
                }
            }
        }

        for material in basic.find_children("RelatedMaterial") {
            check_related_material(
                self.doc,
                &self.ctx,
                material,
                MaterialLocation::Programme,
                MATERIAL,
                &mut self.report,
            );
        }
    }

    /// Titles are unique per (type, language) and a `main` title is required
    fn check_titles(&mut self, basic: Node) {
        let titles = basic.find_children("Title");
        let mut seen: HashMap<(&str, Option<String>), Node> = HashMap::new();
        let mut has_main = false;

        for &title in &titles {
            let kind = title.attribute("type").unwrap_or("main");
            has_main |= kind == "main";

            if let Some(lang) = title.xml_lang() {
                self.ctx
                    .check_language(self.doc, title, lang, TITLE, &mut self.report);
            }

            let text = title.text_content();
            let length = text.chars().count();
            if text.trim().is_empty() {
                self.report.add(
                    Finding::error(TITLE, "Title must not be empty")
                        .with_key(KEY_EMPTY_VALUE)
                        .at(self.doc.source_ref(title)),
                );
            } else if length > MAX_TITLE_LENGTH {
                self.report.add(
                    Finding::error(
                        TITLE,
                        format!(
                            "Title is {} characters, at most {} are permitted",
                            length, MAX_TITLE_LENGTH
                        ),
                    )
                    .with_key(KEY_TOO_LONG)
                    .at(self.doc.source_ref(title)),
                );
            }

            let language = resolve_inherited_language(title).map(|l| l.trim().to_ascii_lowercase());
            let key = (kind, language);
            if let Some(&first) = seen.get(&key) {
                self.report.add(
                    Finding::error(
                        TITLE,
                        format!(
                            "more than one {} Title for language \"{}\"",
                            kind,
                            key.1.as_deref().unwrap_or("no language")
                        ),
                    )
                    .with_key(KEY_DUPLICATE_LANG)
                    .at_all(vec![self.doc.source_ref(first), self.doc.source_ref(title)]),
                );
            } else {
                seen.insert(key, title);
            }
        }

        if !has_main {
            self.report.add(
                Finding::error(TITLE, "a Title of type main is required")
                    .with_key(KEY_MISSING)
                    .at(self.doc.source_ref(basic)),
            );
        }
    }

    fn check_parental_guidance(&mut self, guidance: Node) {
        let age = guidance.first_child_named("MinimumAge");
        let rating = guidance.first_child_named("ParentalRating");

        match (age, rating) {
            (Some(age), _) => {
                let value = age.text_content();
                match value.trim().parse::<u32>() {
                    Ok(n) if n <= MAX_MINIMUM_AGE => {}
                    _ => self.report.add(
                        Finding::error(
                            CLASSIFICATION,
                            format!("MinimumAge \"{}\" is not in 0..={}", value.trim(), MAX_MINIMUM_AGE),
                        )
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(age)),
                    ),
                }
            }
            (None, Some(rating)) => {
                if let Some(href) =
                    self.ctx
                        .required_attribute(self.doc, rating, "href", CLASSIFICATION, &mut self.report)
                {
                    self.ctx.check_term(
                        self.doc,
                        rating,
                        Vocabulary::ParentalRating,
                        href,
                        CLASSIFICATION,
                        &mut self.report,
                    );
                }
            }
            (None, None) => self.report.add(
                Finding::error(CLASSIFICATION, "ParentalGuidance requires MinimumAge or ParentalRating")
                    .with_key(KEY_MISSING)
                    .at(self.doc.source_ref(guidance)),
            ),
        }
    }

    fn check_groups(&mut self, table: Node) {
        let mut seen: HashMap<String, Node> = HashMap::new();
        for group in table.find_children("GroupInformation") {
            if let Some(crid) =
                self.ctx
                    .required_attribute(self.doc, group, "groupId", GROUP, &mut self.report)
            {
                self.check_crid(group, crid, "groupId", &mut seen);
            }
            self.ctx
                .required_child(self.doc, group, "GroupType", GROUP, &mut self.report);
            if let Some(basic) = group.first_child_named("BasicDescription") {
                self.check_basic_description(basic, false);
            }
        }
    }

    fn check_locations(&mut self, table: Node) {
        for schedule in table.find_children("Schedule") {
            if !self.rules.schedule {
                self.not_permitted(schedule);
                continue;
            }
            self.check_schedule(schedule);
        }
        for on_demand in table.find_children("OnDemandProgram") {
            if !self.rules.on_demand {
                self.not_permitted(on_demand);
                continue;
            }
            self.check_on_demand(on_demand);
        }
    }

    fn not_permitted(&mut self, node: Node) {
        self.report.add(
            Finding::error(
                TABLES,
                format!("{} is not permitted in this response", self.ctx.qualified(node.local_name())),
            )
            .with_key(KEY_NOT_PERMITTED)
            .at(self.doc.source_ref(node)),
        );
    }

    fn check_schedule(&mut self, schedule: Node) {
        self.ctx
            .required_attribute(self.doc, schedule, "serviceIDRef", LOCATION, &mut self.report);
        let start = self.utc_attribute(schedule, "start", true);
        let end = self.utc_attribute(schedule, "end", true);
        self.check_order(schedule, start, end, "Schedule@start", "Schedule@end");

        for event in schedule.find_children("ScheduleEvent") {
            self.check_programme_reference(event);
            if let Some(start) = event.first_child_named("PublishedStartTime") {
                let value = start.text_content();
                if !is_utc_datetime(value.trim()) {
                    self.report.add(
                        Finding::error(LOCATION, format!("PublishedStartTime \"{}\" is not a UTC time", value.trim()))
                            .with_key(KEY_INVALID_VALUE)
                            .at(self.doc.source_ref(start)),
                    );
                }
            }
            self.check_duration(event);
        }
    }

    fn check_on_demand(&mut self, on_demand: Node) {
        self.check_programme_reference(on_demand);
        if let Some(url) =
            self.ctx
                .required_child(self.doc, on_demand, "ProgramURL", LOCATION, &mut self.report)
        {
            let value = url.text_content();
            if !is_http_url(value.trim()) {
                self.report.add(
                    Finding::error(LOCATION, format!("ProgramURL \"{}\" is not a valid HTTP(S) URL", value.trim()))
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(url)),
                );
            }
        }
        let begin = self.utc_element(on_demand, "StartOfAvailability");
        let end = self.utc_element(on_demand, "EndOfAvailability");
        self.check_order(
            on_demand,
            begin,
            end,
            "StartOfAvailability",
            "EndOfAvailability",
        );
        self.check_duration(on_demand);
    }

    fn check_programme_reference(&mut self, node: Node) {
        let Some(program) =
            self.ctx
                .required_child(self.doc, node, "Program", LOCATION, &mut self.report)
        else {
            return;
        };
        let Some(crid) =
            self.ctx
                .required_attribute(self.doc, program, "crid", LOCATION, &mut self.report)
        else {
            return;
        };
        if !self.programmes.contains(&crid.trim().to_ascii_lowercase()) {
            self.report.add(
                Finding::error(
                    LOCATION,
                    format!("Program@crid \"{}\" does not match a ProgramInformation", crid),
                )
                .with_key(KEY_UNKNOWN_PROGRAMME)
                .at(self.doc.source_ref(program)),
            );
        }
    }

    fn check_duration(&mut self, node: Node) {
        if let Some(duration) = node.first_child_named("PublishedDuration") {
            let value = duration.text_content();
            if !is_iso_duration(value.trim()) {
                self.report.add(
                    Finding::error(LOCATION, format!("PublishedDuration \"{}\" is not a duration", value.trim()))
                        .with_key(KEY_INVALID_VALUE)
                        .at(self.doc.source_ref(duration)),
                );
            }
        }
    }

    fn utc_attribute(&mut self, node: Node, name: &str, required: bool) -> Option<DateTime<FixedOffset>> {
        let value = if required {
            self.ctx
                .required_attribute(self.doc, node, name, LOCATION, &mut self.report)?
        } else {
            node.attribute(name)?
        };
        self.parse_utc(node, value, &format!("@{}", name))
    }

    fn utc_element(&mut self, parent: Node, name: &str) -> Option<DateTime<FixedOffset>> {
        let node = parent.first_child_named(name)?;
        let value = node.text_content();
        self.parse_utc(node, value.trim(), name)
    }

    fn parse_utc(&mut self, node: Node, value: &str, label: &str) -> Option<DateTime<FixedOffset>> {
        if is_utc_datetime(value) {
            if let Ok(time) = DateTime::parse_from_rfc3339(value) {
                return Some(time);
            }
        }
        self.report.add(
            Finding::error(LOCATION, format!("{} \"{}\" is not a UTC time", label, value))
                .with_key(KEY_INVALID_VALUE)
                .at(self.doc.source_ref(node)),
        );
        None
    }

    fn check_order(
        &mut self,
        node: Node,
        start: Option<DateTime<FixedOffset>>,
        end: Option<DateTime<FixedOffset>>,
        start_label: &str,
        end_label: &str,
    ) {
        if let (Some(start), Some(end)) = (start, end) {
            if start >= end {
                self.report.add(
                    Finding::error(LOCATION, format!("{} must be before {}", start_label, end_label))
                        .with_key(KEY_TIME_ORDER)
                        .at(self.doc.source_ref(node)),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::TVA_2019;
    use crate::report::Severity;

    const CRID: &str = "crid://example.com/programme/1";

    fn programme(crid: &str, synopsis: &str) -> String {
        format!(
            r#"<ProgramInformation programId="{}"><BasicDescription><Title type="main">Show</Title>{}</BasicDescription></ProgramInformation>"#,
            crid, synopsis
        )
    }

    fn wrap(body: &str) -> String {
        format!(
            r#"<TVAMain xmlns="{}" xml:lang="en"><ProgramDescription>{}</ProgramDescription></TVAMain>"#,
            TVA_2019, body
        )
    }

    fn check(body: &str, request: RequestType) -> Report {
        let data = ReferenceData::new();
        ContentGuideChecker::new(&data).validate(&wrap(body), request)
    }

    #[test]
    fn test_request_type_names() {
        for request in RequestType::ALL {
            assert_eq!(request.as_str().parse::<RequestType>().unwrap(), request);
        }
        assert_eq!("NOW_NEXT".parse::<RequestType>().unwrap(), RequestType::NowNext);
        assert!("yesterday".parse::<RequestType>().is_err());
    }

    #[test]
    fn test_valid_schedule() {
        let body = format!(
            r#"<ProgramInformationTable>{}</ProgramInformationTable><ProgramLocationTable><Schedule serviceIDRef="tag:example.com,2024:one" start="2024-01-01T00:00:00Z" end="2024-01-02T00:00:00Z"><ScheduleEvent><Program crid="{}"/><PublishedStartTime>2024-01-01T06:00:00Z</PublishedStartTime><PublishedDuration>PT30M</PublishedDuration></ScheduleEvent></Schedule></ProgramLocationTable>"#,
            programme(CRID, r#"<Synopsis length="medium">A programme.</Synopsis>"#),
            CRID
        );
        let report = check(&body, RequestType::Schedule);
        assert!(report.is_valid(), "{:?}", report.findings());
    }

    #[test]
    fn test_missing_lang_warns() {
        let data = ReferenceData::new();
        let xml = format!(r#"<TVAMain xmlns="{}"><ProgramDescription/></TVAMain>"#, TVA_2019);
        let report = ContentGuideChecker::new(&data).validate(&xml, RequestType::BoxSetCategories);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.error_count(), 0);
    }

    #[test]
    fn test_unknown_programme_and_order() {
        let body = r#"<ProgramLocationTable><Schedule serviceIDRef="s" start="2024-01-02T00:00:00Z" end="2024-01-01T00:00:00Z"><ScheduleEvent><Program crid="crid://example.com/none"/></ScheduleEvent></Schedule></ProgramLocationTable>"#;
        let report = check(body, RequestType::NowNext);
        assert_eq!(report.key_count(Severity::Error, KEY_UNKNOWN_PROGRAMME), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_TIME_ORDER), 1);
    }

    #[test]
    fn test_tables_by_request() {
        let body = format!(
            "<ProgramInformationTable>{}</ProgramInformationTable>",
            programme(CRID, r#"<Synopsis length="medium">A programme.</Synopsis>"#)
        );
        let report = check(&body, RequestType::BoxSetCategories);
        assert_eq!(report.key_count(Severity::Error, KEY_NOT_PERMITTED), 1);

        let body = r#"<ProgramLocationTable><Schedule serviceIDRef="s" start="2024-01-01T00:00:00Z" end="2024-01-02T00:00:00Z"/></ProgramLocationTable>"#;
        let report = check(body, RequestType::ProgramInfo);
        assert_eq!(report.key_count(Severity::Error, KEY_NOT_PERMITTED), 1);
    }

    #[test]
    fn test_duplicate_program_id_and_titles() {
        let body = format!(
            "<ProgramInformationTable>{}{}</ProgramInformationTable>",
            programme(CRID, r#"<Synopsis length="medium">A.</Synopsis>"#),
            programme(
                CRID,
                r#"<Title type="main">Again</Title><Synopsis length="medium">B.</Synopsis>"#
            )
        );
        let report = check(&body, RequestType::ProgramInfo);
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_CRID), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 1);
    }

    #[test]
    fn test_parental_guidance() {
        let body = format!(
            "<ProgramInformationTable>{}</ProgramInformationTable>",
            programme(
                CRID,
                r#"<Synopsis length="medium">A.</Synopsis><ParentalGuidance><MinimumAge>256</MinimumAge></ParentalGuidance><ParentalGuidance/>"#
            )
        );
        let report = check(&body, RequestType::ProgramInfo);
        assert_eq!(report.key_count(Severity::Error, KEY_INVALID_VALUE), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_MISSING), 1);
    }
}
