//! Schema version resolution
//!
//! A document's root namespace selects one [`SchemaVersion`] from an ordered
//! table. Rules that differ between revisions are written as small
//! [`Gated`] tables rather than as branches on the version number.

use crate::namespaces;
use serde::Serialize;

/// Lifecycle state of a schema revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaStatus {
    /// The current published revision
    Current,
    /// Superseded, still accepted
    Old,
    /// Not yet published
    Draft,
    /// Accepted with a warning
    Deprecated,
}

/// One revision of a DVB-I schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SchemaVersion {
    /// Target namespace
    pub namespace: &'static str,
    /// Ordinal; later revisions have larger numbers
    pub ordinal: u32,
    /// Lifecycle state
    pub status: SchemaStatus,
    /// File name of the XSD for this revision, used by schema collaborators
    pub schema_file: &'static str,
}

/// Service List ordinal for the 2019 namespace
pub const SL_V1: u32 = 1;
/// Service List ordinal for the 2020 namespace
pub const SL_V2: u32 = 2;
/// Service List ordinal for the 2021 namespace
pub const SL_V3: u32 = 3;
/// Service List ordinal for the 2022 namespace
pub const SL_V4: u32 = 4;
/// Service List ordinal for the 2022b namespace
pub const SL_V5: u32 = 5;
/// Service List ordinal for the 2023 namespace
pub const SL_V6: u32 = 6;
/// Service List ordinal for the 2024 namespace
pub const SL_V7: u32 = 7;

/// Known Service List revisions, oldest first
pub const SERVICE_LIST_VERSIONS: &[SchemaVersion] = &[
    SchemaVersion {
        namespace: namespaces::SL_2019,
        ordinal: SL_V1,
        status: SchemaStatus::Deprecated,
        schema_file: "dvbi_v1.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2020,
        ordinal: SL_V2,
        status: SchemaStatus::Deprecated,
        schema_file: "dvbi_v2.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2021,
        ordinal: SL_V3,
        status: SchemaStatus::Old,
        schema_file: "dvbi_v3.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2022,
        ordinal: SL_V4,
        status: SchemaStatus::Old,
        schema_file: "dvbi_v4.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2022B,
        ordinal: SL_V5,
        status: SchemaStatus::Old,
        schema_file: "dvbi_v5.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2023,
        ordinal: SL_V6,
        status: SchemaStatus::Current,
        schema_file: "dvbi_v6.0.xsd",
    },
    SchemaVersion {
        namespace: namespaces::SL_2024,
        ordinal: SL_V7,
        status: SchemaStatus::Draft,
        schema_file: "dvbi_v7.0.xsd",
    },
];

/// Content Guide ordinal for the 2019 namespace
pub const CG_V1: u32 = 1;
/// Content Guide ordinal for the 2024 namespace
pub const CG_V2: u32 = 2;

/// Known Content Guide revisions, oldest first
pub const CONTENT_GUIDE_VERSIONS: &[SchemaVersion] = &[
    SchemaVersion {
        namespace: namespaces::TVA_2019,
        ordinal: CG_V1,
        status: SchemaStatus::Current,
        schema_file: "tva_metadata_3-1.xsd",
    },
    SchemaVersion {
        namespace: namespaces::TVA_2024,
        ordinal: CG_V2,
        status: SchemaStatus::Draft,
        schema_file: "tva_metadata_3-1_2024.xsd",
    },
];

/// Find the revision whose namespace is `namespace`
pub fn resolve(table: &'static [SchemaVersion], namespace: &str) -> Option<&'static SchemaVersion> {
    table.iter().find(|v| v.namespace == namespace)
}

/// Which schema ordinals a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionRange {
    /// Every revision
    Any,
    /// Exactly one revision
    Exactly(u32),
    /// This revision and later
    From(u32),
    /// Revisions up to and including this one
    Until(u32),
    /// Inclusive range
    Between(u32, u32),
}

impl VersionRange {
    /// Whether `ordinal` falls in the range
    pub fn contains(&self, ordinal: u32) -> bool {
        match *self {
            VersionRange::Any => true,
            VersionRange::Exactly(v) => ordinal == v,
            VersionRange::From(v) => ordinal >= v,
            VersionRange::Until(v) => ordinal <= v,
            VersionRange::Between(lo, hi) => (lo..=hi).contains(&ordinal),
        }
    }
}

/// A value that is only permitted in some schema revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gated<T> {
    /// Revisions in which `value` is permitted
    pub versions: VersionRange,
    /// The permitted value
    pub value: T,
}

impl<T> Gated<T> {
    /// Create a gated value
    pub const fn new(versions: VersionRange, value: T) -> Self {
        Self { versions, value }
    }

    /// Gated value permitted in every revision
    pub const fn any(value: T) -> Self {
        Self::new(VersionRange::Any, value)
    }
}

/// Whether `value` is permitted for `ordinal` by any entry of `table`
pub fn permitted<T, Q>(table: &[Gated<T>], ordinal: u32, value: Q) -> bool
where
    T: PartialEq<Q>,
{
    table
        .iter()
        .any(|g| g.versions.contains(ordinal) && g.value == value)
}

/// Whether `value` appears in `table` for some revision, permitted or not
pub fn recognised<T, Q>(table: &[Gated<T>], value: Q) -> bool
where
    T: PartialEq<Q>,
{
    table.iter().any(|g| g.value == value)
}

/// Values of `table` permitted for `ordinal`
pub fn values_for<T: Copy>(table: &[Gated<T>], ordinal: u32) -> Vec<T> {
    table
        .iter()
        .filter(|g| g.versions.contains(ordinal))
        .map(|g| g.value)
        .collect()
}
