//! DVB-I rule checks
//!
//! The two document checkers, [`ServiceListChecker`] and
//! [`ContentGuideChecker`], walk a parsed document and write findings into a
//! [`Report`]. The other modules hold the reusable pieces they are built from.

pub mod content_guide;
pub mod delivery;
pub mod helpers;
pub mod lcn;
pub mod multilingual;
pub mod regions;
pub mod related_material;
pub mod service_list;
pub mod synopsis;
pub mod validation;

pub use content_guide::{ContentGuideChecker, RequestType};
pub use service_list::ServiceListChecker;
pub use validation::{Outcome, Stage, ValidationContext};

use crate::documents::XmlDocument;
use crate::limits::Limits;
use crate::report::{Finding, Report, SourceRef};
use crate::versions::{resolve, SchemaStatus, SchemaVersion};
use tracing::debug;

/// Category key for a document that could not be validated at all
pub const KEY_REJECTED: &str = "document rejected";

/// Structural validation against the XML Schema of a revision
///
/// Implementations add their diagnostics to `report` and return whether the
/// document conforms. Business rules run either way.
pub trait SchemaCheck: Send + Sync {
    /// Validate `doc` against the schema for `version`
    fn validate(&self, doc: &XmlDocument, version: &SchemaVersion, report: &mut Report) -> bool;
}

/// Parse `xml`, check the root element and resolve its schema revision
///
/// On rejection exactly one finding has been added and the failing stage is
/// returned.
pub(crate) fn open_document<'x>(
    xml: &'x str,
    limits: &Limits,
    root_name: &str,
    versions: &'static [SchemaVersion],
    code: &str,
    report: &mut Report,
) -> std::result::Result<(XmlDocument<'x>, &'static SchemaVersion), Stage> {
    debug!(stage = %Stage::Parse, "validating {} document", root_name);
    if let Err(e) = limits.check_xml_size(xml.len()) {
        report.add(Finding::error(code, e.to_string()).with_key(KEY_REJECTED));
        return Err(Stage::Parse);
    }
    let doc = match XmlDocument::parse(xml) {
        Ok(doc) => doc,
        Err(crate::error::Error::Xml(e)) => {
            report.add(
                Finding::error(code, format!("XML is not well-formed: {}", e))
                    .with_key(KEY_REJECTED)
                    .at(SourceRef::new(e.pos().row, "")),
            );
            return Err(Stage::Parse);
        }
        Err(e) => {
            report.add(
                Finding::error(code, format!("XML is not well-formed: {}", e)).with_key(KEY_REJECTED),
            );
            return Err(Stage::Parse);
        }
    };

    debug!(stage = %Stage::ResolveSchemaVersion);
    let root = doc.root();
    if root.tag_name().name() != root_name {
        report.add(
            Finding::error(
                code,
                format!(
                    "root element is {}, expected {}",
                    root.tag_name().name(),
                    root_name
                ),
            )
            .with_key(KEY_REJECTED)
            .at(doc.source_ref(root)),
        );
        return Err(Stage::ResolveSchemaVersion);
    }
    let Some(namespace) = root.tag_name().namespace() else {
        report.add(
            Finding::error(code, format!("{} has no namespace", root_name))
                .with_key(KEY_REJECTED)
                .at(doc.source_ref(root)),
        );
        return Err(Stage::ResolveSchemaVersion);
    };
    let Some(version) = resolve(versions, namespace) else {
        report.add(
            Finding::error(code, format!("Unsupported namespace \"{}\"", namespace))
                .with_key(KEY_REJECTED)
                .at(doc.source_ref(root)),
        );
        return Err(Stage::ResolveSchemaVersion);
    };

    match version.status {
        SchemaStatus::Deprecated => report.add(
            Finding::warning(code, format!("namespace \"{}\" is deprecated", namespace))
                .with_key("schema status")
                .at(doc.source_ref(root)),
        ),
        SchemaStatus::Draft => report.add(
            Finding::information(code, format!("namespace \"{}\" is a draft revision", namespace))
                .with_key("schema status")
                .at(doc.source_ref(root)),
        ),
        SchemaStatus::Current | SchemaStatus::Old => {}
    }
    Ok((doc, version))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespaces::SL_2019;
    use crate::versions::SERVICE_LIST_VERSIONS;

    fn open(xml: &str) -> (Option<u32>, Report) {
        let mut report = Report::new();
        let result = open_document(
            xml,
            &Limits::default(),
            "ServiceList",
            SERVICE_LIST_VERSIONS,
            "SL001",
            &mut report,
        );
        (result.ok().map(|(_, v)| v.ordinal), report)
    }

    #[test]
    fn test_rejections_produce_one_finding() {
        for xml in [
            "<ServiceList",
            "<Other xmlns=\"urn:dvb:metadata:servicediscovery:2023\"/>",
            "<ServiceList/>",
            "<ServiceList xmlns=\"urn:example\"/>",
        ] {
            let (ordinal, report) = open(xml);
            assert_eq!(ordinal, None);
            assert_eq!(report.findings().len(), 1, "{}", xml);
            assert_eq!(report.key_count(crate::report::Severity::Error, KEY_REJECTED), 1);
        }
    }

    #[test]
    fn test_deprecated_namespace_warns() {
        let (ordinal, report) = open(&format!("<ServiceList xmlns=\"{}\"/>", SL_2019));
        assert_eq!(ordinal, Some(1));
        assert_eq!(report.warning_count(), 1);
    }
}
