//! Reference data locations
//!
//! A reference data source is a local file, a network URL, or text already held
//! in memory (tests, embedded defaults).

use crate::error::Result;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use url::Url;

/// Location of a reference data source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File system path
    Path(PathBuf),
    /// http or https URL
    Url(Url),
    /// In-memory source text, with a label used in log messages
    Text {
        /// Label shown in diagnostics
        label: String,
        /// The source content
        content: String,
    },
}

impl Location {
    /// Create a location from a string, detecting URLs by scheme
    pub fn parse(s: &str) -> Result<Self> {
        if let Ok(url) = Url::parse(s) {
            if matches!(url.scheme(), "http" | "https") {
                return Ok(Location::Url(url));
            }
            if url.scheme() == "file" {
                if let Ok(path) = url.to_file_path() {
                    return Ok(Location::Path(path));
                }
            }
        }
        Ok(Location::Path(PathBuf::from(s)))
    }

    /// Wrap in-memory text as a location
    pub fn text(label: impl Into<String>, content: impl Into<String>) -> Self {
        Location::Text {
            label: label.into(),
            content: content.into(),
        }
    }

    /// Check if this is a remote location (URL)
    pub fn is_remote(&self) -> bool {
        matches!(self, Location::Url(_))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Path(p) => write!(f, "{}", p.display()),
            Location::Url(u) => write!(f, "{}", u),
            Location::Text { label, .. } => write!(f, "<{}>", label),
        }
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Location::parse(&s).map_err(serde::de::Error::custom)
    }
}
