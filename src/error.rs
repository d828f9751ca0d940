//! Error types for dvbi-validator
//!
//! These are failures of the library itself (loading reference data, reading
//! configuration, parsing registries). Problems found *in* a validated document
//! are never errors in this sense; they are [`Finding`](crate::report::Finding)s
//! collected into a [`Report`](crate::report::Report).

use std::fmt;
use thiserror::Error;

/// Result type alias using the crate Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dvbi-validator operations
#[derive(Error, Debug)]
pub enum Error {
    /// Reference data could not be parsed
    #[error("reference data error: {0}")]
    Reference(#[from] ReferenceError),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

/// Failure to interpret a reference data source, with context
#[derive(Debug, Clone)]
pub struct ReferenceError {
    /// Error message
    pub message: String,
    /// Which source was being read
    pub source_name: Option<String>,
    /// 1-based line in the source, where known
    pub line: Option<u32>,
}

impl ReferenceError {
    /// Create a new reference data error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source_name: None,
            line: None,
        }
    }

    /// Set the source the error came from
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_name = Some(source.into());
        self
    }

    /// Set the line
    pub fn with_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(ref source) = self.source_name {
            write!(f, " (in {}", source)?;
            if let Some(line) = self.line {
                write!(f, ", line {}", line)?;
            }
            write!(f, ")")?;
        } else if let Some(line) = self.line {
            write!(f, " (line {})", line)?;
        }

        Ok(())
    }
}

impl std::error::Error for ReferenceError {}
