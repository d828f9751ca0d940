//! Per-document validation context
//!
//! A [`ValidationContext`] is built once the root namespace has been resolved
//! and is threaded through every rule check of that document. It also carries
//! the reference data, so checks never reach for process-wide state.

use crate::documents::XmlDocument;
use crate::namespaces::prefix_for;
use crate::reference::{LanguageState, Lookup, ReferenceData, ReferenceStore, Vocabulary};
use crate::report::{Finding, Report};
use crate::validators::helpers::is_language_tag_syntax;
use crate::versions::SchemaVersion;
use roxmltree::Node;
use std::fmt;

/// Category key for a value missing from a loaded vocabulary
pub const KEY_INVALID_VALUE: &str = "invalid value";
/// Category key for lookups against a store that holds nothing
pub const KEY_REFERENCE_UNAVAILABLE: &str = "reference data unavailable";
/// Category key for an unknown or malformed language
pub const KEY_INVALID_LANGUAGE: &str = "invalid language";
/// Category key for a deprecated language
pub const KEY_DEPRECATED_LANGUAGE: &str = "deprecated language";
/// Category key for a missing mandatory element or attribute
pub const KEY_MISSING: &str = "missing";

/// Stages of one validation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Reading the XML text
    Parse,
    /// Selecting the schema revision from the root namespace
    ResolveSchemaVersion,
    /// Structural validation by the schema collaborator
    SchemaValidate,
    /// Business rules
    RuleCheck,
    /// End-of-document checks
    Finalize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Parse => "parse",
            Stage::ResolveSchemaVersion => "resolve schema version",
            Stage::SchemaValidate => "schema validation",
            Stage::RuleCheck => "rule check",
            Stage::Finalize => "finalize",
        };
        f.write_str(name)
    }
}

/// How a validation pass ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Stopped at `Stage` with a single finding
    Rejected(Stage),
    /// Every applicable rule ran
    Completed,
}

/// Transient state for validating one document
#[derive(Debug, Clone)]
pub struct ValidationContext<'r> {
    /// Namespace of the root element
    pub namespace: &'static str,
    /// Prefix bound to that namespace in the document, empty for the default namespace
    pub prefix: String,
    /// Resolved schema revision
    pub version: &'static SchemaVersion,
    /// Reference data consulted by the rules
    pub data: &'r ReferenceData,
}

impl<'r> ValidationContext<'r> {
    /// Create the context for a document whose root resolved to `version`
    pub fn new(root: Node, version: &'static SchemaVersion, data: &'r ReferenceData) -> Self {
        Self {
            namespace: version.namespace,
            prefix: prefix_for(root, version.namespace),
            version,
            data,
        }
    }

    /// Ordinal of the resolved revision
    pub fn ordinal(&self) -> u32 {
        self.version.ordinal
    }

    /// Element name as written in the document, for messages
    pub fn qualified(&self, local_name: &str) -> String {
        if self.prefix.is_empty() {
            local_name.to_string()
        } else {
            format!("{}:{}", self.prefix, local_name)
        }
    }

    /// Check `value` against a controlled vocabulary
    ///
    /// Returns `false` only when the vocabulary is loaded and lacks the value.
    pub fn check_term(
        &self,
        doc: &XmlDocument,
        node: Node,
        vocabulary: Vocabulary,
        value: &str,
        code: &str,
        report: &mut Report,
    ) -> bool {
        match self.data.lookup_term(vocabulary, value) {
            Lookup::Known | Lookup::NotSupplied => true,
            Lookup::Unavailable => {
                report.add(
                    Finding::warning(code, format!("{} not loaded, \"{}\" not checked", vocabulary, value))
                        .with_key(KEY_REFERENCE_UNAVAILABLE)
                        .at(doc.source_ref(node)),
                );
                true
            }
            Lookup::Unknown => {
                report.add(
                    Finding::error(
                        code,
                        format!("\"{}\" is not a valid {} for {}", value, vocabulary, node.tag_name().name()),
                    )
                    .with_key(KEY_INVALID_VALUE)
                    .at(doc.source_ref(node)),
                );
                false
            }
        }
    }

    /// Check a language tag for syntax and registry membership
    pub fn check_language(
        &self,
        doc: &XmlDocument,
        node: Node,
        tag: &str,
        code: &str,
        report: &mut Report,
    ) -> bool {
        if !is_language_tag_syntax(tag.trim()) {
            report.add(
                Finding::error(code, format!("\"{}\" is not a valid language tag", tag))
                    .with_key(KEY_INVALID_LANGUAGE)
                    .at(doc.source_ref(node)),
            );
            return false;
        }
        let Some(store) = &self.data.languages else {
            return true;
        };
        if store.is_empty() {
            report.add(
                Finding::warning(code, format!("language registry not loaded, \"{}\" not checked", tag))
                    .with_key(KEY_REFERENCE_UNAVAILABLE)
                    .at(doc.source_ref(node)),
            );
            return true;
        }
        match store.is_known(tag) {
            LanguageState::Known => true,
            LanguageState::Deprecated { preferred } => {
                let hint = preferred
                    .map(|p| format!(", use \"{}\"", p))
                    .unwrap_or_default();
                report.add(
                    Finding::warning(code, format!("language \"{}\" is deprecated{}", tag, hint))
                        .with_key(KEY_DEPRECATED_LANGUAGE)
                        .at(doc.source_ref(node)),
                );
                true
            }
            LanguageState::Unknown | LanguageState::NotSpecified => {
                report.add(
                    Finding::error(code, format!("language \"{}\" is not registered", tag))
                        .with_key(KEY_INVALID_LANGUAGE)
                        .at(doc.source_ref(node)),
                );
                false
            }
        }
    }

    /// Check an ISO 3166 alpha-3 country code
    pub fn check_country(
        &self,
        doc: &XmlDocument,
        node: Node,
        code_value: &str,
        code: &str,
        report: &mut Report,
    ) -> bool {
        match self.data.lookup_country(code_value) {
            Lookup::Known | Lookup::NotSupplied => true,
            Lookup::Unavailable => {
                report.add(
                    Finding::warning(code, format!("country list not loaded, \"{}\" not checked", code_value))
                        .with_key(KEY_REFERENCE_UNAVAILABLE)
                        .at(doc.source_ref(node)),
                );
                true
            }
            Lookup::Unknown => {
                report.add(
                    Finding::error(code, format!("\"{}\" is not a valid country code", code_value))
                        .with_key("invalid country code")
                        .at(doc.source_ref(node)),
                );
                false
            }
        }
    }

    /// Value of a mandatory attribute, reporting its absence
    pub fn required_attribute<'a>(
        &self,
        doc: &XmlDocument,
        node: Node<'a, '_>,
        name: &str,
        code: &str,
        report: &mut Report,
    ) -> Option<&'a str> {
        let value = node.attribute(name);
        if value.is_none() {
            report.add(
                Finding::error(
                    code,
                    format!("@{} is required for {}", name, self.qualified(node.tag_name().name())),
                )
                .with_key(KEY_MISSING)
                .at(doc.source_ref(node)),
            );
        }
        value
    }

    /// The single mandatory child `name` of `node`, reporting its absence
    pub fn required_child<'a, 'input>(
        &self,
        doc: &XmlDocument,
        node: Node<'a, 'input>,
        name: &str,
        code: &str,
        report: &mut Report,
    ) -> Option<Node<'a, 'input>> {
        let child = node
            .children()
            .find(|c| c.is_element() && c.tag_name().name() == name);
        if child.is_none() {
            report.add(
                Finding::error(
                    code,
                    format!(
                        "{} is required in {}",
                        self.qualified(name),
                        self.qualified(node.tag_name().name())
                    ),
                )
                .with_key(KEY_MISSING)
                .at(doc.source_ref(node)),
            );
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ClassificationScheme, LanguageStore, ReferenceStore};
    use crate::versions::{resolve, SERVICE_LIST_VERSIONS};

    const XML: &str = r#"<sl:ServiceList xmlns:sl="urn:dvb:metadata:servicediscovery:2023"><sl:Genre href="urn:x:1"/></sl:ServiceList>"#;

    fn version() -> &'static SchemaVersion {
        resolve(SERVICE_LIST_VERSIONS, "urn:dvb:metadata:servicediscovery:2023").unwrap()
    }

    #[test]
    fn test_prefix_and_qualified_names() {
        let doc = XmlDocument::parse(XML).unwrap();
        let data = ReferenceData::new();
        let ctx = ValidationContext::new(doc.root(), version(), &data);
        assert_eq!(ctx.prefix, "sl");
        assert_eq!(ctx.qualified("Service"), "sl:Service");
        assert_eq!(ctx.ordinal(), 6);
    }

    #[test]
    fn test_check_term_degrades() {
        let doc = XmlDocument::parse(XML).unwrap();
        let node = doc.root().first_element_child().unwrap();

        let none = ReferenceData::new();
        let ctx = ValidationContext::new(doc.root(), version(), &none);
        let mut report = Report::new();
        assert!(ctx.check_term(&doc, node, Vocabulary::Genre, "urn:x:1", "T1", &mut report));
        assert!(report.findings().is_empty());

        let empty = ReferenceData::new().with_scheme(Vocabulary::Genre, ClassificationScheme::new());
        let ctx = ValidationContext::new(doc.root(), version(), &empty);
        assert!(ctx.check_term(&doc, node, Vocabulary::Genre, "urn:x:1", "T1", &mut report));
        assert_eq!(report.key_count(crate::report::Severity::Warning, KEY_REFERENCE_UNAVAILABLE), 1);

        let loaded = ReferenceData::new()
            .with_scheme(Vocabulary::Genre, ClassificationScheme::from_terms(["urn:x:2"]));
        let ctx = ValidationContext::new(doc.root(), version(), &loaded);
        assert!(!ctx.check_term(&doc, node, Vocabulary::Genre, "urn:x:1", "T1", &mut report));
        assert_eq!(report.error_count(), 1);
    }

    #[test]
    fn test_check_language() {
        let doc = XmlDocument::parse(XML).unwrap();
        let mut store = LanguageStore::new();
        let batch = store
            .parse("%%\nType: language\nSubtag: en\nDescription: English\n")
            .unwrap();
        store.extend(batch);
        let data = ReferenceData::new().with_languages(store);
        let ctx = ValidationContext::new(doc.root(), version(), &data);

        let mut report = Report::new();
        assert!(ctx.check_language(&doc, doc.root(), "en", "L1", &mut report));
        assert!(!ctx.check_language(&doc, doc.root(), "fr", "L1", &mut report));
        assert!(!ctx.check_language(&doc, doc.root(), "en_GB", "L1", &mut report));
        assert_eq!(report.error_count(), 2);
    }
}
