//! ISO 3166 country codes

use super::ReferenceStore;
use crate::error::{ReferenceError, Result};
use serde::Deserialize;
use std::collections::HashSet;

/// One country record of the source JSON
#[derive(Debug, Clone, Deserialize)]
pub struct CountryRecord {
    /// Country name
    #[serde(default)]
    pub name: Option<String>,
    /// Two letter code
    #[serde(alias = "alpha-2", default)]
    pub alpha2: Option<String>,
    /// Three letter code
    #[serde(alias = "alpha-3", default)]
    pub alpha3: Option<String>,
}

/// Known ISO 3166-1 codes
///
/// Two- and three-letter lookups are enabled independently; DVB-I uses the
/// three-letter form almost everywhere.
#[derive(Debug, Clone)]
pub struct CountryStore {
    use2: bool,
    use3: bool,
    alpha2: HashSet<String>,
    alpha3: HashSet<String>,
}

impl CountryStore {
    /// Create an empty store with the given code lengths enabled
    pub fn new(use2: bool, use3: bool) -> Self {
        Self {
            use2,
            use3,
            alpha2: HashSet::new(),
            alpha3: HashSet::new(),
        }
    }

    /// Whether `code` is a known code of an enabled length
    pub fn is_iso3166_code(&self, code: &str, case_sensitive: bool) -> bool {
        let code = if case_sensitive {
            code.to_string()
        } else {
            code.to_ascii_uppercase()
        };
        match code.len() {
            2 => self.use2 && self.alpha2.contains(&code),
            3 => self.use3 && self.alpha3.contains(&code),
            _ => false,
        }
    }
}

impl Default for CountryStore {
    fn default() -> Self {
        Self::new(false, true)
    }
}

impl ReferenceStore for CountryStore {
    type Batch = Vec<CountryRecord>;

    fn name(&self) -> &str {
        "ISO 3166 countries"
    }

    fn parse(&self, text: &str) -> Result<Vec<CountryRecord>> {
        let records: Vec<CountryRecord> = serde_json::from_str(text)?;
        if records.iter().all(|r| r.alpha2.is_none() && r.alpha3.is_none()) {
            return Err(ReferenceError::new("no country codes found").into());
        }
        Ok(records)
    }

    fn extend(&mut self, batch: Vec<CountryRecord>) {
        for record in batch {
            if let Some(code) = record.alpha2 {
                self.alpha2.insert(code.to_ascii_uppercase());
            }
            if let Some(code) = record.alpha3 {
                self.alpha3.insert(code.to_ascii_uppercase());
            }
        }
    }

    fn clear(&mut self) {
        self.alpha2.clear();
        self.alpha3.clear();
    }

    fn len(&self) -> usize {
        self.alpha2.len().max(self.alpha3.len())
    }
}
