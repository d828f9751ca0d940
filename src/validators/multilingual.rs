//! Multilingual sibling groups
//!
//! Elements such as `Name`, `ServiceName` or `Title` may repeat once per
//! language. When more than one instance is present each must say which
//! language it is in, and no two may resolve to the same language. An
//! instance without any `xml:lang` in scope counts as being in "no language",
//! which is itself a language for duplicate detection.

use crate::documents::{ElementExt, XmlDocument};
use crate::report::{Finding, Report};
use crate::validators::validation::{ValidationContext, KEY_MISSING};
use roxmltree::Node;
use std::collections::HashMap;

/// Category key for a missing `xml:lang` in a multilingual group
pub const KEY_REQUIRED_LANG: &str = "required @xml:lang";
/// Category key for two instances in the same language
pub const KEY_DUPLICATE_LANG: &str = "duplicate @xml:lang";
/// Category key for an instance with no text
pub const KEY_EMPTY_VALUE: &str = "empty value";
/// Category key for text longer than permitted
pub const KEY_TOO_LONG: &str = "length exceeded";

/// Nearest `xml:lang` on `node` or its ancestors, `None` for no language
pub fn resolve_inherited_language<'a>(node: Node<'a, '_>) -> Option<&'a str> {
    node.ancestors()
        .filter(|n| n.is_element())
        .find_map(|n| n.xml_lang())
}

/// How one multilingual element is checked
#[derive(Debug, Clone, Copy)]
pub struct LanguageRule<'n> {
    /// Local name of the repeated element
    pub element: &'n str,
    /// Finding code
    pub code: &'n str,
    /// At least one instance is required
    pub mandatory: bool,
    /// Longest permitted text, in characters
    pub max_length: Option<usize>,
}

impl<'n> LanguageRule<'n> {
    /// An optional element with no length limit
    pub fn new(element: &'n str, code: &'n str) -> Self {
        Self {
            element,
            code,
            mandatory: false,
            max_length: None,
        }
    }

    /// Require at least one instance
    pub fn mandatory(mut self) -> Self {
        self.mandatory = true;
        self
    }

    /// Limit the text length
    pub fn max_length(mut self, length: usize) -> Self {
        self.max_length = Some(length);
        self
    }
}

/// Check the instances of `rule.element` directly under `parent`
///
/// Returns the number of instances found.
pub fn check_language_uniqueness(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    parent: Node,
    rule: LanguageRule,
    report: &mut Report,
) -> usize {
    let instances = parent.find_children(rule.element);
    if instances.is_empty() {
        if rule.mandatory {
            report.add(
                Finding::error(
                    rule.code,
                    format!(
                        "{} is required in {}",
                        ctx.qualified(rule.element),
                        ctx.qualified(parent.local_name())
                    ),
                )
                .with_key(KEY_MISSING)
                .at(doc.source_ref(parent)),
            );
        }
        return 0;
    }

    let several = instances.len() > 1;
    let mut seen: HashMap<Option<String>, Node> = HashMap::new();

    for &element in &instances {
        let explicit = element.xml_lang();
        if several && explicit.is_none() {
            report.add(
                Finding::error(
                    rule.code,
                    format!(
                        "@xml:lang is required for each {} when more than one is given",
                        ctx.qualified(rule.element)
                    ),
                )
                .with_key(KEY_REQUIRED_LANG)
                .at(doc.source_ref(element)),
            );
        }
        if let Some(lang) = explicit {
            ctx.check_language(doc, element, lang, rule.code, report);
        }

        let resolved = resolve_inherited_language(element).map(|l| l.trim().to_ascii_lowercase());
        match seen.get(&resolved) {
            Some(&first) => {
                let shown = resolved.as_deref().unwrap_or("no language");
                report.add(
                    Finding::error(
                        rule.code,
                        format!(
                            "{} is given more than once for language \"{}\"",
                            ctx.qualified(rule.element),
                            shown
                        ),
                    )
                    .with_key(KEY_DUPLICATE_LANG)
                    .at_all(vec![doc.source_ref(first), doc.source_ref(element)]),
                );
            }
            None => {
                seen.insert(resolved, element);
            }
        }

        let text = element.text_content();
        if text.trim().is_empty() {
            report.add(
                Finding::error(
                    rule.code,
                    format!("{} must not be empty", ctx.qualified(rule.element)),
                )
                .with_key(KEY_EMPTY_VALUE)
                .at(doc.source_ref(element)),
            );
        } else if let Some(max) = rule.max_length {
            let length = text.chars().count();
            if length > max {
                report.add(
                    Finding::error(
                        rule.code,
                        format!(
                            "{} is {} characters, at most {} are permitted",
                            ctx.qualified(rule.element),
                            length,
                            max
                        ),
                    )
                    .with_key(KEY_TOO_LONG)
                    .at(doc.source_ref(element)),
                );
            }
        }
    }
    instances.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceData;
    use crate::report::Severity;
    use crate::versions::{resolve, SERVICE_LIST_VERSIONS};
    use crate::namespaces::SL_2023;

    fn run(xml: &str, rule: LanguageRule) -> Report {
        let doc = XmlDocument::parse(xml).unwrap();
        let data = ReferenceData::new();
        let version = resolve(SERVICE_LIST_VERSIONS, SL_2023).unwrap();
        let ctx = ValidationContext::new(doc.root(), version, &data);
        let mut report = Report::new();
        check_language_uniqueness(&doc, &ctx, doc.root(), rule, &mut report);
        report
    }

    #[test]
    fn test_inherited_language() {
        let doc = XmlDocument::parse(r#"<a xml:lang="de"><b><c/></b></a>"#).unwrap();
        let c = doc.root().descendants().find(|n| n.has_tag_name("c")).unwrap();
        assert_eq!(resolve_inherited_language(c), Some("de"));

        let doc = XmlDocument::parse("<a><b/></a>").unwrap();
        assert_eq!(resolve_inherited_language(doc.root()), None);
    }

    #[test]
    fn test_single_instance_needs_no_lang() {
        let report = run("<p><Name>One</Name></p>", LanguageRule::new("Name", "ML001"));
        assert!(report.findings().is_empty());
    }

    #[test]
    fn test_missing_lang_in_group() {
        let report = run(
            r#"<p><Name xml:lang="en">One</Name><Name>Two</Name></p>"#,
            LanguageRule::new("Name", "ML001"),
        );
        assert_eq!(report.key_count(Severity::Error, KEY_REQUIRED_LANG), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 0);
    }

    #[test]
    fn test_duplicate_languages() {
        let report = run(
            r#"<p><Name xml:lang="en">One</Name><Name xml:lang="EN">Two</Name></p>"#,
            LanguageRule::new("Name", "ML001"),
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 1);
    }

    #[test]
    fn test_no_language_sentinel_duplicates() {
        let report = run("<p><Name>One</Name><Name>Two</Name></p>", LanguageRule::new("Name", "ML001"));
        assert_eq!(report.key_count(Severity::Error, KEY_REQUIRED_LANG), 2);
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 1);
    }

    #[test]
    fn test_inherited_language_counts_for_duplicates() {
        let report = run(
            r#"<p xml:lang="fr"><Name>Un</Name><Name xml:lang="fr">Deux</Name></p>"#,
            LanguageRule::new("Name", "ML001"),
        );
        assert_eq!(report.key_count(Severity::Error, KEY_DUPLICATE_LANG), 1);
    }

    #[test]
    fn test_empty_and_long_values() {
        let report = run(
            r#"<p><Name xml:lang="en"> </Name><Name xml:lang="de">abcdef</Name></p>"#,
            LanguageRule::new("Name", "ML001").max_length(5),
        );
        assert_eq!(report.key_count(Severity::Error, KEY_EMPTY_VALUE), 1);
        assert_eq!(report.key_count(Severity::Error, KEY_TOO_LONG), 1);
    }

    #[test]
    fn test_mandatory() {
        let report = run("<p/>", LanguageRule::new("Name", "ML001").mandatory());
        assert_eq!(report.key_count(Severity::Error, KEY_MISSING), 1);
    }
}
