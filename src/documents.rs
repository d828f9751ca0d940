//! XML document handling
//!
//! [`XmlDocument`] wraps a parsed `roxmltree` tree together with its source
//! text so that any node can be mapped back to a 1-based line and a short
//! excerpt for findings. [`ElementExt`] adds the child lookups the rule checks
//! use everywhere. Lookups go by local name: namespace conformance is the job
//! of schema validation, and DVB-I mixes the Service List, TV-Anytime and
//! MPEG-7 namespaces inside one document.

use crate::error::Result;
use crate::namespaces::XML_NAMESPACE;
use crate::report::SourceRef;
use roxmltree::Node;

/// Longest start-tag excerpt kept in a finding
const MAX_FRAGMENT_LENGTH: usize = 120;

/// A parsed XML document and its source text
#[derive(Debug)]
pub struct XmlDocument<'input> {
    source: &'input str,
    tree: roxmltree::Document<'input>,
}

impl<'input> XmlDocument<'input> {
    /// Parse an XML document from a string
    pub fn parse(source: &'input str) -> Result<Self> {
        let tree = roxmltree::Document::parse(source)?;
        Ok(Self { source, tree })
    }

    /// The root element
    pub fn root(&self) -> Node<'_, 'input> {
        self.tree.root_element()
    }

    /// The original source text
    pub fn source(&self) -> &'input str {
        self.source
    }

    /// 1-based source line on which `node` starts
    pub fn line_of(&self, node: Node) -> u32 {
        self.tree.text_pos_at(node.range().start).row
    }

    /// The start tag of `node`, shortened for display
    pub fn fragment_of(&self, node: Node) -> String {
        let range = node.range();
        let text = self.source.get(range.clone()).unwrap_or_default();
        let start_tag = match text.find('>') {
            Some(end) => &text[..=end],
            None => text,
        };
        let collapsed: String = start_tag.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.chars().count() > MAX_FRAGMENT_LENGTH {
            let mut short: String = collapsed.chars().take(MAX_FRAGMENT_LENGTH).collect();
            short.push_str("...");
            short
        } else {
            collapsed
        }
    }

    /// Position reference for a finding about `node`
    pub fn source_ref(&self, node: Node) -> SourceRef {
        SourceRef::new(self.line_of(node), self.fragment_of(node))
    }
}

/// Convenience lookups on element nodes
pub trait ElementExt<'a, 'input: 'a> {
    /// Local name of the element
    fn local_name(&self) -> &'a str;

    /// Child elements, in document order
    fn element_children(&self) -> Vec<Node<'a, 'input>>;

    /// Child elements with the given local name
    fn find_children(&self, local_name: &str) -> Vec<Node<'a, 'input>>;

    /// First child element with the given local name
    fn first_child_named(&self, local_name: &str) -> Option<Node<'a, 'input>>;

    /// Concatenated text of all descendant text nodes
    fn text_content(&self) -> String;

    /// Explicit `xml:lang` on this element (not inherited)
    fn xml_lang(&self) -> Option<&'a str>;
}

impl<'a, 'input: 'a> ElementExt<'a, 'input> for Node<'a, 'input> {
    fn local_name(&self) -> &'a str {
        self.tag_name().name()
    }

    fn element_children(&self) -> Vec<Node<'a, 'input>> {
        self.children().filter(|n| n.is_element()).collect()
    }

    fn find_children(&self, local_name: &str) -> Vec<Node<'a, 'input>> {
        self.children()
            .filter(|n| n.is_element() && n.tag_name().name() == local_name)
            .collect()
    }

    fn first_child_named(&self, local_name: &str) -> Option<Node<'a, 'input>> {
        self.children()
            .find(|n| n.is_element() && n.tag_name().name() == local_name)
    }

    fn text_content(&self) -> String {
        self.descendants()
            .filter(|n| n.is_text())
            .filter_map(|n| n.text())
            .collect()
    }

    fn xml_lang(&self) -> Option<&'a str> {
        self.attribute((XML_NAMESPACE, "lang"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xml() {
        let xml = "<root>\n  <child>text</child>\n</root>";
        let doc = XmlDocument::parse(xml).unwrap();

        let root = doc.root();
        assert_eq!(root.local_name(), "root");
        let children = root.element_children();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text_content(), "text");
        assert_eq!(doc.line_of(children[0]), 2);
    }

    #[test]
    fn test_malformed_xml_is_error() {
        assert!(XmlDocument::parse("<root><child></root>").is_err());
    }

    #[test]
    fn test_find_children() {
        let xml = r#"<root><child1/><child2/><child1/></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();

        assert_eq!(doc.root().find_children("child1").len(), 2);
        assert!(doc.root().first_child_named("child3").is_none());
    }

    #[test]
    fn test_fragment_is_start_tag() {
        let xml = "<root><Region regionID=\"R1\"\n   selectable=\"false\"><RegionName>x</RegionName></Region></root>";
        let doc = XmlDocument::parse(xml).unwrap();
        let region = doc.root().first_child_named("Region").unwrap();
        assert_eq!(
            doc.fragment_of(region),
            r#"<Region regionID="R1" selectable="false">"#
        );
    }

    #[test]
    fn test_xml_lang_is_explicit_only() {
        let xml = r#"<root xml:lang="en"><Name>x</Name></root>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        assert_eq!(doc.root().xml_lang(), Some("en"));
        assert_eq!(doc.root().first_child_named("Name").unwrap().xml_lang(), None);
    }
}
