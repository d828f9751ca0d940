//! Service List validation against whole documents

mod common;

use common::{dash_service, fixture, reference_data, service_list};
use dvbi_validator::locations::Location;
use dvbi_validator::namespaces::{SL_2019, SL_2023};
use dvbi_validator::reference::ClassificationScheme;
use dvbi_validator::validators::lcn::KEY_UNKNOWN_SERVICE;
use dvbi_validator::validators::multilingual::{KEY_DUPLICATE_LANG, KEY_REQUIRED_LANG};
use dvbi_validator::validators::regions::{KEY_DUPLICATE_REGION, KEY_UNUSED_REGION};
use dvbi_validator::validators::related_material::{KEY_INVALID_HREF, KEY_INVALID_IMAGE};
use dvbi_validator::validators::validation::{
    KEY_INVALID_VALUE, KEY_MISSING, KEY_REFERENCE_UNAVAILABLE,
};
use dvbi_validator::validators::KEY_REJECTED;
use dvbi_validator::{
    Loader, Outcome, ReferenceData, Severity, ServiceListChecker, SharedReferenceData, Stage,
    Vocabulary,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const GENRES: &str = r#"<ClassificationScheme uri="urn:tva:metadata:cs:ContentCS:2011">
  <Term termID="3"><Term termID="3.1"/></Term>
</ClassificationScheme>"#;

fn validate(data: &ReferenceData, xml: &str) -> dvbi_validator::Report {
    ServiceListChecker::new(data).validate(xml)
}

// ============================================================================
// Whole documents
// ============================================================================

#[test]
fn test_fixture_is_valid_with_reference_data() {
    let data = reference_data();
    let report = validate(&data, &fixture("service_list_valid.xml"));

    assert!(report.is_valid(), "unexpected errors: {:#?}", report.errors().collect::<Vec<_>>());
    assert_eq!(report.key_count(Severity::Warning, KEY_REFERENCE_UNAVAILABLE), 0);
    assert_eq!(report.key_count(Severity::Warning, KEY_UNUSED_REGION), 0);
}

#[test]
fn test_fixture_is_valid_without_reference_data() {
    let data = ReferenceData::new();
    let (report, outcome) =
        ServiceListChecker::new(&data).validate_with_outcome(&fixture("service_list_valid.xml"));

    assert_eq!(outcome, Outcome::Completed);
    assert!(report.findings().is_empty(), "{:#?}", report.findings());
}

#[test]
fn test_empty_stores_only_warn() {
    let data = ReferenceData::with_empty_stores();
    let report = validate(&data, &fixture("service_list_valid.xml"));

    assert!(report.is_valid());
    assert!(report.key_count(Severity::Warning, KEY_REFERENCE_UNAVAILABLE) > 0);
}

#[test]
fn test_deprecated_namespace_still_checked() {
    let data = ReferenceData::new();
    let xml = service_list(SL_2019, &dash_service("tag:example.com,2024:one", ""));
    let (report, outcome) = ServiceListChecker::new(&data).validate_with_outcome(&xml);

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(report.warning_count(), 1);
    assert!(report.is_valid());
}

#[test]
fn test_rejections() {
    let data = ReferenceData::new();
    let cases = [
        ("<ServiceList><Name>", Stage::Parse),
        ("<TVAMain xmlns=\"urn:tva:metadata:2019\"/>", Stage::ResolveSchemaVersion),
        ("<ServiceList xmlns=\"urn:dvb:metadata:servicediscovery:1999\"/>", Stage::ResolveSchemaVersion),
    ];
    for (xml, stage) in cases {
        let (report, outcome) = ServiceListChecker::new(&data).validate_with_outcome(xml);
        assert_eq!(outcome, Outcome::Rejected(stage), "{}", xml);
        assert_eq!(report.findings().len(), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_REJECTED), 1);
    }
}

#[test]
fn test_malformed_xml_reports_line() {
    let data = ReferenceData::new();
    let report = validate(&data, "<ServiceList>\n<Name>\n</ServiceList>");
    let lines = report.findings()[0].lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0] >= 2, "{:?}", lines);
}

// ============================================================================
// Individual rules
// ============================================================================

#[test]
fn test_programme_image_not_valid_for_service_list() {
    let body = r#"
  <RelatedMaterial>
    <HowRelated href="urn:tva:metadata:cs:HowRelatedCS:2012:19"/>
    <MediaLocator>
      <MediaUri contentType="image/jpeg">https://example.com/still.jpg</MediaUri>
    </MediaLocator>
  </RelatedMaterial>"#;
    let data = ReferenceData::new();
    let report = validate(&data, &service_list(SL_2023, body));

    assert_eq!(report.key_count(Severity::Error, KEY_INVALID_HREF), 1);
    assert_eq!(report.key_count(Severity::Error, KEY_INVALID_IMAGE), 0);
}

#[test]
fn test_duplicate_region_id() {
    let body = r#"
  <RegionList>
    <Region regionID="A"><RegionName>First</RegionName></Region>
    <Region regionID="A"><RegionName>Second</RegionName></Region>
  </RegionList>
  <TargetRegion>A</TargetRegion>"#;
    let data = ReferenceData::new();
    let report = validate(&data, &service_list(SL_2023, body));

    assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_REGION), 1);
}

#[test]
fn test_lcn_unknown_service() {
    let body = format!(
        r#"
  <LCNTableList>
    <LCNTable>
      <LCN channelNumber="1" serviceRef="tag:example.com,2024:one"/>
      <LCN channelNumber="2" serviceRef="tag:example.com,2024:missing"/>
    </LCNTable>
  </LCNTableList>
{}"#,
        dash_service("tag:example.com,2024:one", "")
    );
    let data = ReferenceData::new();
    let report = validate(&data, &service_list(SL_2023, &body));

    assert_eq!(report.key_count(Severity::Error, KEY_UNKNOWN_SERVICE), 1);
    assert_eq!(report.error_count(), 1);
}

#[test]
fn test_service_name_languages() {
    let extra = r#"    <ServiceName xml:lang="en">Again</ServiceName>"#;
    let data = ReferenceData::new();
    let report = validate(
        &data,
        &service_list(SL_2023, &dash_service("tag:example.com,2024:one", extra)),
    );

    // the unqualified name inherits "en" from the root
    assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 1);
    assert_eq!(report.key_count(Severity::Error, KEY_REQUIRED_LANG), 1);
}

#[test]
fn test_application_only_service() {
    let service = r#"
  <Service version="1">
    <UniqueIdentifier>tag:example.com,2024:app</UniqueIdentifier>
    <ServiceName>App</ServiceName>
    <RelatedMaterial>
      <HowRelated href="urn:dvb:metadata:cs:LinkedApplicationCS:2019:1.2"/>
      <MediaLocator>
        <MediaUri contentType="application/vnd.dvb.ait+xml">https://example.com/ait.xml</MediaUri>
      </MediaLocator>
    </RelatedMaterial>
  </Service>"#;
    let data = ReferenceData::new();
    let report = validate(&data, &service_list(SL_2023, service));

    assert!(report.is_valid(), "{:#?}", report.findings());

    let without_app = service.replace("LinkedApplicationCS:2019:1.2", "LinkedApplicationCS:2019:2");
    let report = validate(&data, &service_list(SL_2023, &without_app));
    assert_eq!(report.key_count(Severity::Error, KEY_MISSING), 1);
}

#[test]
fn test_unknown_genre_by_store_state() {
    let xml = service_list(
        SL_2023,
        &dash_service(
            "tag:example.com,2024:one",
            r#"    <ServiceGenre href="urn:tva:metadata:cs:ContentCS:2011:9.9"/>"#,
        ),
    );

    let mut genres = ClassificationScheme::new();
    let used = Loader::new().populate(&mut genres, &[Location::text("genres", GENRES)], true);
    assert_eq!(used, 1);

    let loaded = ReferenceData::new().with_scheme(Vocabulary::Genre, genres);
    let report = validate(&loaded, &xml);
    assert_eq!(report.key_count(Severity::Error, KEY_INVALID_VALUE), 1);

    let empty = ReferenceData::new().with_scheme(Vocabulary::Genre, Vocabulary::Genre.empty_store());
    let report = validate(&empty, &xml);
    assert_eq!(report.error_count(), 0);
    assert_eq!(report.key_count(Severity::Warning, KEY_REFERENCE_UNAVAILABLE), 1);

    let report = validate(&ReferenceData::new(), &xml);
    assert!(report.findings().is_empty());
}

#[test]
fn test_finding_lines_point_at_elements() {
    let xml = service_list(
        SL_2023,
        &dash_service("tag:example.com,2024:one", "    <ContentGuideSourceRef>nope</ContentGuideSourceRef>"),
    );
    let data = ReferenceData::new();
    let report = validate(&data, &xml);

    assert_eq!(report.error_count(), 1);
    let line = report.findings()[0].lines()[0] as usize;
    let text = xml.lines().nth(line - 1).unwrap_or_default();
    assert!(text.contains("ContentGuideSourceRef"), "line {}: {}", line, text);
}

// ============================================================================
// Shared reference data
// ============================================================================

#[test]
fn test_concurrent_validation_with_snapshots() {
    let shared = SharedReferenceData::new(reference_data());
    let xml = fixture("service_list_valid.xml");

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let data = shared.snapshot();
                    ServiceListChecker::new(&data).validate(&xml).is_valid()
                })
            })
            .collect();
        shared.replace(ReferenceData::new());
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    });
}

// ============================================================================
// Robustness
// ============================================================================

proptest! {
    #[test]
    fn prop_arbitrary_input_never_panics(input in "\\PC{0,200}") {
        let data = ReferenceData::new();
        let _ = ServiceListChecker::new(&data).validate(&input);
    }

    #[test]
    fn prop_truncated_fixture_rejects_once(cut in 0usize..4000) {
        let xml = fixture("service_list_valid.xml");
        let mut cut = cut.min(xml.len());
        while !xml.is_char_boundary(cut) {
            cut -= 1;
        }
        let data = reference_data();
        let (report, outcome) = ServiceListChecker::new(&data).validate_with_outcome(&xml[..cut]);
        if let Outcome::Rejected(_) = outcome {
            prop_assert_eq!(report.findings().len(), 1);
        }
    }

    #[test]
    fn prop_mutated_attributes_never_panic(value in "[ -~]{0,24}") {
        let xml = fixture("service_list_valid.xml")
            .replace("ranking=\"1\"", &format!("ranking=\"{}\"", value.replace(['"', '<', '&'], "")))
            .replace("channelNumber=\"2\"", &format!("channelNumber=\"{}\"", value.replace(['"', '<', '&'], "")));
        let data = ReferenceData::new();
        let _ = ServiceListChecker::new(&data).validate(&xml);
    }
}
