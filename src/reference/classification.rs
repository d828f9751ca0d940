//! Classification scheme vocabularies
//!
//! A TV-Anytime / DVB classification scheme is a tree of `Term` elements under
//! a `ClassificationScheme` root carrying the scheme URI. The store flattens the
//! tree into qualified `uri:termID` strings. Flat sources (one term per line)
//! are accepted for vocabularies that are published as plain lists.

use super::ReferenceStore;
use crate::error::{ReferenceError, Result};
use std::collections::HashSet;

/// A set of qualified classification scheme terms
#[derive(Debug, Clone, Default)]
pub struct ClassificationScheme {
    name: String,
    leaf_only: bool,
    values: HashSet<String>,
    uris: HashSet<String>,
}

/// Terms parsed from one source, ready to merge into a store
#[derive(Debug, Clone, Default)]
pub struct TermBatch {
    uris: Vec<String>,
    terms: Vec<String>,
}

impl ClassificationScheme {
    /// Create an empty store that keeps every term
    pub fn new() -> Self {
        Self {
            name: "classification scheme".to_string(),
            ..Self::default()
        }
    }

    /// Create an empty store that keeps only terms without children
    pub fn leaf_only() -> Self {
        Self {
            leaf_only: true,
            ..Self::new()
        }
    }

    /// Set the name used in log messages
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Build a store directly from qualified terms
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut cs = Self::new();
        cs.values.extend(terms.into_iter().map(Into::into));
        cs
    }

    /// Whether this store only keeps leaf terms
    pub fn is_leaf_only(&self) -> bool {
        self.leaf_only
    }

    /// Exact-match lookup of a qualified term
    pub fn is_known(&self, term: &str) -> bool {
        self.values.contains(term)
    }

    /// Whether `uri` is the URI of a loaded scheme
    pub fn has_scheme(&self, uri: &str) -> bool {
        self.uris.contains(uri)
    }

    /// Iterate over all qualified terms
    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }
}

impl ReferenceStore for ClassificationScheme {
    type Batch = TermBatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, text: &str) -> Result<TermBatch> {
        if text.trim_start().starts_with('<') {
            parse_hierarchical(text, self.leaf_only)
        } else {
            Ok(parse_flat(text))
        }
    }

    fn extend(&mut self, batch: TermBatch) {
        self.uris.extend(batch.uris);
        self.values.extend(batch.terms);
    }

    fn clear(&mut self) {
        self.uris.clear();
        self.values.clear();
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

fn parse_hierarchical(text: &str, leaf_only: bool) -> Result<TermBatch> {
    let doc = roxmltree::Document::parse(text)?;
    let mut batch = TermBatch::default();

    let schemes = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "ClassificationScheme");
    for scheme in schemes {
        let line = doc.text_pos_at(scheme.range().start).row;
        let uri = scheme.attribute("uri").ok_or_else(|| {
            ReferenceError::new("ClassificationScheme without @uri").with_line(line)
        })?;
        batch.uris.push(uri.to_string());

        for term in scheme
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "Term")
        {
            let Some(id) = term.attribute("termID") else {
                let line = doc.text_pos_at(term.range().start).row;
                return Err(ReferenceError::new("Term without @termID").with_line(line).into());
            };
            let is_leaf = !term
                .children()
                .any(|c| c.is_element() && c.tag_name().name() == "Term");
            if !leaf_only || is_leaf {
                batch.terms.push(format!("{}:{}", uri, id));
            }
        }
    }

    if batch.uris.is_empty() {
        return Err(ReferenceError::new("no ClassificationScheme element found").into());
    }
    Ok(batch)
}

fn parse_flat(text: &str) -> TermBatch {
    TermBatch {
        uris: Vec::new(),
        terms: text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENRES: &str = r#"<?xml version="1.0"?>
<ClassificationScheme uri="urn:tva:metadata:cs:ContentCS:2011">
  <Term termID="3">
    <Name>CONTENT</Name>
    <Term termID="3.1">
      <Term termID="3.1.1"/>
      <Term termID="3.1.2"/>
    </Term>
  </Term>
</ClassificationScheme>"#;

    fn loaded(mut cs: ClassificationScheme, text: &str) -> ClassificationScheme {
        let batch = cs.parse(text).unwrap();
        cs.extend(batch);
        cs
    }

    #[test]
    fn test_all_terms_known() {
        let cs = loaded(ClassificationScheme::new(), GENRES);
        assert!(cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3"));
        assert!(cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3.1.2"));
        assert!(!cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3.2"));
        assert!(cs.has_scheme("urn:tva:metadata:cs:ContentCS:2011"));
        assert_eq!(cs.len(), 4);
    }

    #[test]
    fn test_leaf_only() {
        let cs = loaded(ClassificationScheme::leaf_only(), GENRES);
        assert!(!cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3.1"));
        assert!(cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3.1.1"));
        assert_eq!(cs.len(), 2);
    }

    #[test]
    fn test_no_prefix_inference() {
        let cs = loaded(ClassificationScheme::new(), GENRES);
        assert!(!cs.is_known("urn:tva:metadata:cs:ContentCS:2011"));
        assert!(!cs.is_known("urn:tva:metadata:cs:ContentCS:2011:3.1.1.4"));
    }

    #[test]
    fn test_flat_list() {
        let cs = loaded(
            ClassificationScheme::new(),
            "# roles\nurn:tva:metadata:cs:TVARoleCS:2011:AUTHOR\n\nurn:tva:metadata:cs:TVARoleCS:2011:ACTOR\n",
        );
        assert_eq!(cs.len(), 2);
        assert!(cs.is_known("urn:tva:metadata:cs:TVARoleCS:2011:ACTOR"));
    }

    #[test]
    fn test_term_without_id_is_error() {
        let cs = ClassificationScheme::new();
        let err = cs
            .parse(r#"<ClassificationScheme uri="u"><Term/></ClassificationScheme>"#)
            .unwrap_err();
        assert!(err.to_string().contains("termID"));
    }
}
