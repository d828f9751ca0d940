//! Content protection registries
//!
//! DVB CA system identifiers are 16-bit values allocated in ranges; DRM
//! systems are identified by the UUIDs of the DASH-IF registry.

use super::ReferenceStore;
use crate::error::{ReferenceError, Result};
use crate::validators::helpers::parse_dec_or_hex;
use serde::Deserialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Deserialize)]
struct CaSystemRecord {
    start: String,
    #[serde(default)]
    end: Option<String>,
}

/// Allocated CA system identifier ranges
#[derive(Debug, Clone, Default)]
pub struct CaSystemRegistry {
    ranges: Vec<(u32, u32)>,
}

impl CaSystemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` lies in an allocated range
    pub fn is_known(&self, id: u32) -> bool {
        self.ranges.iter().any(|&(lo, hi)| (lo..=hi).contains(&id))
    }
}

impl ReferenceStore for CaSystemRegistry {
    type Batch = Vec<(u32, u32)>;

    fn name(&self) -> &str {
        "CA system registry"
    }

    fn parse(&self, text: &str) -> Result<Vec<(u32, u32)>> {
        let records: Vec<CaSystemRecord> = serde_json::from_str(text)?;
        records
            .into_iter()
            .map(|r| {
                let lo = parse_dec_or_hex(&r.start).ok_or_else(|| {
                    ReferenceError::new(format!("invalid CA system id '{}'", r.start))
                })?;
                let hi = match r.end {
                    Some(end) => parse_dec_or_hex(&end).ok_or_else(|| {
                        ReferenceError::new(format!("invalid CA system id '{}'", end))
                    })?,
                    None => lo,
                };
                Ok((lo.min(hi), lo.max(hi)))
            })
            .collect()
    }

    fn extend(&mut self, batch: Vec<(u32, u32)>) {
        self.ranges.extend(batch);
    }

    fn clear(&mut self) {
        self.ranges.clear();
    }

    fn len(&self) -> usize {
        self.ranges.len()
    }
}

#[derive(Debug, Clone, Deserialize)]
struct DrmSystemRecord {
    uuid: String,
}

/// Registered DRM system UUIDs
#[derive(Debug, Clone, Default)]
pub struct DrmSystemRegistry {
    uuids: HashSet<String>,
}

impl DrmSystemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `uuid` (with or without a `urn:uuid:` prefix) is registered
    pub fn is_known(&self, uuid: &str) -> bool {
        let uuid = uuid.trim().to_ascii_lowercase();
        let bare = uuid.strip_prefix("urn:uuid:").unwrap_or(&uuid);
        self.uuids.contains(bare)
    }
}

impl ReferenceStore for DrmSystemRegistry {
    type Batch = Vec<String>;

    fn name(&self) -> &str {
        "DRM system registry"
    }

    fn parse(&self, text: &str) -> Result<Vec<String>> {
        let records: Vec<DrmSystemRecord> = serde_json::from_str(text)?;
        Ok(records
            .into_iter()
            .map(|r| {
                let uuid = r.uuid.trim().to_ascii_lowercase();
                uuid.strip_prefix("urn:uuid:").map(str::to_string).unwrap_or(uuid)
            })
            .collect())
    }

    fn extend(&mut self, batch: Vec<String>) {
        self.uuids.extend(batch);
    }

    fn clear(&mut self) {
        self.uuids.clear();
    }

    fn len(&self) -> usize {
        self.uuids.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ca_system_ranges() {
        let mut reg = CaSystemRegistry::new();
        let batch = reg
            .parse(r#"[{"start": "0x0100", "end": "0x01FF"}, {"start": "2560"}]"#)
            .unwrap();
        reg.extend(batch);

        assert!(reg.is_known(0x0100));
        assert!(reg.is_known(0x01AB));
        assert!(reg.is_known(2560));
        assert!(!reg.is_known(0x0200));
    }

    #[test]
    fn test_ca_system_bad_id() {
        assert!(CaSystemRegistry::new().parse(r#"[{"start": "0xZZ"}]"#).is_err());
    }

    #[test]
    fn test_drm_systems() {
        let mut reg = DrmSystemRegistry::new();
        let batch = reg
            .parse(r#"[{"uuid": "EDEF8BA9-79D6-4ACE-A3C8-27DCD51D21ED"}]"#)
            .unwrap();
        reg.extend(batch);

        assert!(reg.is_known("edef8ba9-79d6-4ace-a3c8-27dcd51d21ed"));
        assert!(reg.is_known("urn:uuid:EDEF8BA9-79D6-4ACE-A3C8-27DCD51D21ED"));
        assert!(!reg.is_known("9a04f079-9840-4286-ab92-e65be0885f95"));
    }
}
