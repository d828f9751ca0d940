//! Language subtag registry
//!
//! Loads the IANA Language Subtag Registry (records separated by `%%`, one
//! `Field: value` per line, continuation lines indented) and answers whether a
//! language tag is known.
//!
//! A compound tag such as `en-GB` is known when every one of its subtags is a
//! registered subtag (of any type) or falls inside a registered private-use
//! range, or when the whole tag is registered as a redundant or grandfathered
//! tag. A tag with an empty subtag is never known.

use super::ReferenceStore;
use crate::error::{ReferenceError, Result};
use std::collections::{HashMap, HashSet};

/// Result of a language lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LanguageState {
    /// Registered and current
    Known,
    /// Registered but deprecated, with the replacement if the registry names one
    Deprecated {
        /// Preferred replacement tag
        preferred: Option<String>,
    },
    /// Not registered
    Unknown,
    /// No tag given
    NotSpecified,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Deprecation {
    preferred: Option<String>,
}

/// Records parsed from one registry source
#[derive(Debug, Clone, Default)]
pub struct RegistryBatch {
    subtags: HashMap<String, Option<Deprecation>>,
    tags: HashMap<String, Option<Deprecation>>,
    ranges: Vec<(String, String)>,
    sign_languages: HashSet<String>,
}

/// Registered language subtags and tags
#[derive(Debug, Clone, Default)]
pub struct LanguageStore {
    subtags: HashMap<String, Option<Deprecation>>,
    tags: HashMap<String, Option<Deprecation>>,
    ranges: Vec<(String, String)>,
    sign_languages: HashSet<String>,
}

impl LanguageStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a language tag
    pub fn is_known(&self, tag: &str) -> LanguageState {
        let tag = tag.trim();
        if tag.is_empty() {
            return LanguageState::NotSpecified;
        }
        let lower = tag.to_ascii_lowercase();

        if let Some(entry) = self.tags.get(&lower) {
            return state_of(entry.as_ref());
        }
        if self.in_range(&lower) {
            return LanguageState::Known;
        }

        let parts: Vec<&str> = lower.split('-').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return LanguageState::Unknown;
        }

        let mut deprecated = false;
        let mut preferred_parts: Vec<Option<String>> = Vec::with_capacity(parts.len());
        for part in &parts {
            match self.subtags.get(*part) {
                Some(Some(dep)) => {
                    deprecated = true;
                    preferred_parts.push(dep.preferred.clone());
                }
                Some(None) => preferred_parts.push(Some(part.to_string())),
                None if self.in_range(part) => preferred_parts.push(Some(part.to_string())),
                None => return LanguageState::Unknown,
            }
        }

        if deprecated {
            let preferred = preferred_parts
                .into_iter()
                .collect::<Option<Vec<String>>>()
                .map(|p| p.join("-"));
            LanguageState::Deprecated { preferred }
        } else {
            LanguageState::Known
        }
    }

    /// Whether `tag` names a sign language
    pub fn is_known_sign_language(&self, tag: &str) -> bool {
        let lower = tag.trim().to_ascii_lowercase();
        if self.sign_languages.contains(&lower) {
            return true;
        }
        // sgn-xx style tags use the extlang or a registered redundant tag
        match lower.split_once('-') {
            Some(("sgn", rest)) => {
                self.sign_languages.contains(rest) || self.tags.contains_key(&lower)
            }
            _ => false,
        }
    }

    fn in_range(&self, value: &str) -> bool {
        self.ranges.iter().any(|(lo, hi)| {
            value.len() == lo.len() && value >= lo.as_str() && value <= hi.as_str()
        })
    }
}

fn state_of(entry: Option<&Deprecation>) -> LanguageState {
    match entry {
        None => LanguageState::Known,
        Some(dep) => LanguageState::Deprecated {
            preferred: dep.preferred.clone(),
        },
    }
}

impl ReferenceStore for LanguageStore {
    type Batch = RegistryBatch;

    fn name(&self) -> &str {
        "language subtag registry"
    }

    fn parse(&self, text: &str) -> Result<RegistryBatch> {
        parse_registry(text)
    }

    fn extend(&mut self, batch: RegistryBatch) {
        self.subtags.extend(batch.subtags);
        self.tags.extend(batch.tags);
        self.ranges.extend(batch.ranges);
        self.sign_languages.extend(batch.sign_languages);
    }

    fn clear(&mut self) {
        self.subtags.clear();
        self.tags.clear();
        self.ranges.clear();
        self.sign_languages.clear();
    }

    fn len(&self) -> usize {
        self.subtags.len() + self.tags.len() + self.ranges.len()
    }
}

/// One `%%`-separated registry record
#[derive(Debug, Default)]
struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.fields
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn split_records(text: &str) -> Result<Vec<Record>> {
    let mut records = Vec::new();
    let mut current = Record::default();

    for (index, line) in text.lines().enumerate() {
        if line.trim() == "%%" {
            records.push(std::mem::take(&mut current));
            continue;
        }
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            match current.fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                None => {
                    return Err(ReferenceError::new("continuation line without a field")
                        .with_line(index as u32 + 1)
                        .into())
                }
            }
            continue;
        }
        match line.split_once(':') {
            Some((key, value)) => current
                .fields
                .push((key.trim().to_string(), value.trim().to_string())),
            None => {
                return Err(ReferenceError::new(format!("malformed registry line '{}'", line))
                    .with_line(index as u32 + 1)
                    .into())
            }
        }
    }
    records.push(current);
    Ok(records)
}

fn parse_registry(text: &str) -> Result<RegistryBatch> {
    let records = split_records(text)?;
    let mut batch = RegistryBatch::default();
    let mut typed = 0usize;

    for record in records {
        let Some(kind) = record.get("Type") else {
            // the leading File-Date record
            continue;
        };
        typed += 1;

        let deprecation = record.get("Deprecated").map(|_| Deprecation {
            preferred: record.get("Preferred-Value").map(str::to_ascii_lowercase),
        });

        match kind {
            "language" | "extlang" | "script" | "region" | "variant" => {
                let Some(subtag) = record.get("Subtag") else {
                    return Err(ReferenceError::new(format!("{} record without Subtag", kind)).into());
                };
                let subtag = subtag.to_ascii_lowercase();

                let is_sign = record.all("Description").any(|d| d.contains("Sign Language"));
                if is_sign || (kind == "extlang" && record.get("Prefix") == Some("sgn")) {
                    batch.sign_languages.insert(subtag.clone());
                }

                if let Some((lo, hi)) = subtag.split_once("..") {
                    batch.ranges.push((lo.to_string(), hi.to_string()));
                } else {
                    batch.subtags.insert(subtag, deprecation);
                }
            }
            "grandfathered" | "redundant" => {
                let Some(tag) = record.get("Tag") else {
                    return Err(ReferenceError::new(format!("{} record without Tag", kind)).into());
                };
                batch.tags.insert(tag.to_ascii_lowercase(), deprecation);
            }
            _ => {}
        }
    }

    if typed == 0 {
        return Err(ReferenceError::new("no registry records found").into());
    }
    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTRY: &str = "File-Date: 2024-01-01
%%
Type: language
Subtag: en
Description: English
Added: 2005-10-16
%%
Type: language
Subtag: iw
Description: Hebrew
Added: 2005-10-16
Deprecated: 1989-01-01
Preferred-Value: he
%%
Type: language
Subtag: qaa..qtz
Description: Private use
Added: 2005-10-16
%%
Type: language
Subtag: bfi
Description: British Sign Language
Added: 2009-07-29
%%
Type: extlang
Subtag: bfi
Description: British Sign Language
Added: 2009-07-29
Prefix: sgn
%%
Type: region
Subtag: GB
Description: United Kingdom
Added: 2005-10-16
%%
Type: grandfathered
Tag: i-klingon
Description: Klingon
  tlhIngan Hol
Added: 1999-05-26
Deprecated: 2004-02-24
Preferred-Value: tlh
";

    fn store() -> LanguageStore {
        let mut store = LanguageStore::new();
        let batch = store.parse(REGISTRY).unwrap();
        store.extend(batch);
        store
    }

    #[test]
    fn test_simple_and_compound_tags() {
        let s = store();
        assert_eq!(s.is_known("en"), LanguageState::Known);
        assert_eq!(s.is_known("en-GB"), LanguageState::Known);
        assert_eq!(s.is_known("EN-gb"), LanguageState::Known);
        assert_eq!(s.is_known("en-US"), LanguageState::Unknown);
        assert_eq!(s.is_known("xx-zzz"), LanguageState::Unknown);
        assert_eq!(s.is_known("en-"), LanguageState::Unknown);
        assert_eq!(s.is_known(""), LanguageState::NotSpecified);
    }

    #[test]
    fn test_private_use_range() {
        let s = store();
        assert_eq!(s.is_known("qab"), LanguageState::Known);
        assert_eq!(s.is_known("qzz"), LanguageState::Unknown);
    }

    #[test]
    fn test_deprecated_subtag_and_tag() {
        let s = store();
        assert_eq!(
            s.is_known("iw"),
            LanguageState::Deprecated {
                preferred: Some("he".to_string())
            }
        );
        assert_eq!(
            s.is_known("iw-GB"),
            LanguageState::Deprecated {
                preferred: Some("he-gb".to_string())
            }
        );
        assert_eq!(
            s.is_known("i-klingon"),
            LanguageState::Deprecated {
                preferred: Some("tlh".to_string())
            }
        );
    }

    #[test]
    fn test_sign_language() {
        let s = store();
        assert!(s.is_known_sign_language("bfi"));
        assert!(s.is_known_sign_language("sgn-bfi"));
        assert!(!s.is_known_sign_language("en"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(LanguageStore::new().parse("this is not a registry").is_err());
    }
}
