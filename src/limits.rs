//! Limits and constants for DVB-I document processing
//!
//! Size limits protect the loader and the engine from oversized inputs. The
//! constants below are fixed by the DVB-I specification and used by the rule
//! checks.

use crate::error::{Error, Result};

/// Deepest permitted nesting of `Region` elements inside a `RegionList`
pub const MAX_SUBREGION_LEVELS: usize = 3;

/// Maximum characters in a `brief` synopsis
pub const SYNOPSIS_BRIEF_LENGTH: usize = 40;
/// Maximum characters in a `short` synopsis
pub const SYNOPSIS_SHORT_LENGTH: usize = 90;
/// Maximum characters in a `medium` synopsis
pub const SYNOPSIS_MEDIUM_LENGTH: usize = 250;
/// Maximum characters in a `long` synopsis, and minimum for `extended`
pub const SYNOPSIS_LONG_LENGTH: usize = 1200;

/// Maximum characters in a programme `Title`
pub const MAX_TITLE_LENGTH: usize = 256;

/// Maximum value of `ParentalGuidance/MinimumAge`
pub const MAX_MINIMUM_AGE: u32 = 255;

/// Size limits applied while loading and parsing
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum size of a validated document in bytes
    pub max_xml_size: usize,

    /// Maximum size of a single reference data source in bytes
    pub max_reference_size: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_xml_size: 50 * 1024 * 1024,       // 50 MB
            max_reference_size: 20 * 1024 * 1024, // 20 MB
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create strict limits, suited to a public-facing service
    pub fn strict() -> Self {
        Self {
            max_xml_size: 5 * 1024 * 1024,
            max_reference_size: 5 * 1024 * 1024,
        }
    }

    /// Check if a document is within limits
    pub fn check_xml_size(&self, size: usize) -> Result<()> {
        if size > self.max_xml_size {
            Err(Error::LimitExceeded(format!(
                "XML size {} bytes exceeds maximum {} bytes",
                size, self.max_xml_size
            )))
        } else {
            Ok(())
        }
    }

    /// Check if a reference data source is within limits
    pub fn check_reference_size(&self, size: usize) -> Result<()> {
        if size > self.max_reference_size {
            Err(Error::LimitExceeded(format!(
                "reference source size {} bytes exceeds maximum {} bytes",
                size, self.max_reference_size
            )))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = Limits::default();
        assert!(limits.check_xml_size(1024).is_ok());
        assert!(limits.check_xml_size(60 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_strict_limits() {
        let limits = Limits::strict();
        assert!(limits.max_xml_size < Limits::default().max_xml_size);
        assert!(limits.check_reference_size(6 * 1024 * 1024).is_err());
    }

    #[test]
    fn test_synopsis_lengths_ascend() {
        assert!(SYNOPSIS_BRIEF_LENGTH < SYNOPSIS_SHORT_LENGTH);
        assert!(SYNOPSIS_SHORT_LENGTH < SYNOPSIS_MEDIUM_LENGTH);
        assert!(SYNOPSIS_MEDIUM_LENGTH < SYNOPSIS_LONG_LENGTH);
    }
}
