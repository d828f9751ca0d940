//! Synopsis length rules
//!
//! A programme may carry several `Synopsis` elements distinguished by
//! `@length` and language. Each length category has a character budget
//! (`extended` has a floor instead); text is measured in characters after
//! entity references have been resolved by the parser.

use crate::documents::{ElementExt, XmlDocument};
use crate::limits::{
    SYNOPSIS_BRIEF_LENGTH, SYNOPSIS_LONG_LENGTH, SYNOPSIS_MEDIUM_LENGTH, SYNOPSIS_SHORT_LENGTH,
};
use crate::report::{Finding, Report};
use crate::validators::multilingual::{resolve_inherited_language, KEY_DUPLICATE_LANG};
use crate::validators::validation::{ValidationContext, KEY_MISSING};
use roxmltree::Node;
use std::collections::HashMap;
use std::fmt;

/// Category key for a synopsis outside its length budget
pub const KEY_SYNOPSIS_LENGTH: &str = "synopsis length";
/// Category key for a length category not permitted here
pub const KEY_INVALID_LENGTH: &str = "invalid @length";

/// The `@length` categories of a synopsis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SynopsisLength {
    /// Up to 40 characters
    Brief,
    /// Up to 90 characters
    Short,
    /// Up to 250 characters
    Medium,
    /// Up to 1200 characters
    Long,
    /// At least 1200 characters
    Extended,
}

impl SynopsisLength {
    /// Parse the attribute value
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "brief" => Some(Self::Brief),
            "short" => Some(Self::Short),
            "medium" => Some(Self::Medium),
            "long" => Some(Self::Long),
            "extended" => Some(Self::Extended),
            _ => None,
        }
    }

    /// Attribute value
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Short => "short",
            Self::Medium => "medium",
            Self::Long => "long",
            Self::Extended => "extended",
        }
    }

    /// Largest permitted character count, if bounded above
    pub fn max_chars(self) -> Option<usize> {
        match self {
            Self::Brief => Some(SYNOPSIS_BRIEF_LENGTH),
            Self::Short => Some(SYNOPSIS_SHORT_LENGTH),
            Self::Medium => Some(SYNOPSIS_MEDIUM_LENGTH),
            Self::Long => Some(SYNOPSIS_LONG_LENGTH),
            Self::Extended => None,
        }
    }

    /// Smallest permitted character count, if bounded below
    pub fn min_chars(self) -> Option<usize> {
        match self {
            Self::Extended => Some(SYNOPSIS_LONG_LENGTH),
            _ => None,
        }
    }

    /// Whether `chars` characters is acceptable for this category
    pub fn accepts(self, chars: usize) -> bool {
        self.max_chars().map_or(true, |max| chars <= max)
            && self.min_chars().map_or(true, |min| chars >= min)
    }
}

impl fmt::Display for SynopsisLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check the `Synopsis` children of `parent`
///
/// `required` categories must each appear at least once; `optional` ones
/// may appear; anything else is an error.
pub fn check_synopsis_lengths(
    doc: &XmlDocument,
    ctx: &ValidationContext,
    parent: Node,
    required: &[SynopsisLength],
    optional: &[SynopsisLength],
    code: &str,
    report: &mut Report,
) {
    let mut present: HashMap<SynopsisLength, usize> = HashMap::new();
    let mut seen: HashMap<(SynopsisLength, Option<String>), Node> = HashMap::new();

    for synopsis in parent.find_children("Synopsis") {
        let Some(value) = ctx.required_attribute(doc, synopsis, "length", code, report) else {
            continue;
        };
        let length = match SynopsisLength::parse(value) {
            Some(l) if required.contains(&l) || optional.contains(&l) => l,
            _ => {
                report.add(
                    Finding::error(
                        code,
                        format!("{} with @length=\"{}\" is not permitted here", ctx.qualified("Synopsis"), value),
                    )
                    .with_key(KEY_INVALID_LENGTH)
                    .at(doc.source_ref(synopsis)),
                );
                continue;
            }
        };
        *present.entry(length).or_insert(0) += 1;

        if let Some(lang) = synopsis.xml_lang() {
            ctx.check_language(doc, synopsis, lang, code, report);
        }

        let chars = synopsis.text_content().chars().count();
        if !length.accepts(chars) {
            let bound = match (length.max_chars(), length.min_chars()) {
                (Some(max), _) => format!("at most {}", max),
                (None, Some(min)) => format!("at least {}", min),
                (None, None) => String::new(),
            };
            report.add(
                Finding::error(
                    code,
                    format!("{} synopsis has {} characters, {} expected", length, chars, bound),
                )
                .with_key(KEY_SYNOPSIS_LENGTH)
                .at(doc.source_ref(synopsis)),
            );
        }

        let lang = resolve_inherited_language(synopsis).map(|l| l.to_ascii_lowercase());
        let shown = lang.clone().unwrap_or_else(|| "no language".to_string());
        match seen.get(&(length, lang.clone())) {
            Some(&first) => report.add(
                Finding::error(
                    code,
                    format!("more than one {} synopsis for language \"{}\"", length, shown),
                )
                .with_key(KEY_DUPLICATE_LANG)
                .at_all(vec![doc.source_ref(first), doc.source_ref(synopsis)]),
            ),
            None => {
                seen.insert((length, lang), synopsis);
            }
        }
    }

    for length in required {
        if !present.contains_key(length) {
            report.add(
                Finding::error(
                    code,
                    format!(
                        "a {} with @length=\"{}\" is required in {}",
                        ctx.qualified("Synopsis"),
                        length,
                        ctx.qualified(parent.local_name())
                    ),
                )
                .with_key(KEY_MISSING)
                .at(doc.source_ref(parent)),
            );
        }
    }
}
