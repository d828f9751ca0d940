//! # dvbi-validator
//!
//! Business-rule validation of DVB-I Service List and Content Guide documents.
//!
//! Structural checks against the XML Schema are left to a [`SchemaCheck`]
//! collaborator. This crate checks what the schema cannot express:
//! cross-references, uniqueness, language tags, classification terms,
//! version-dependent signalling and the value rules of the DVB-I
//! specification.
//!
//! ## Features
//!
//! - Service List rules: services, instances, delivery parameters, regions,
//!   LCN tables, prominence, NVOD and content guide sources
//! - Content Guide rules per request type: titles, synopses, genres,
//!   parental guidance, credits, schedules and on-demand programmes
//! - Reference data (IANA languages, ISO 3166 countries, DVB and TV-Anytime
//!   classification schemes, CA and DRM registries) loaded from local or
//!   remote sources, shared between validations and reloadable
//! - Reports with per-severity and per-category counts, JSON output and
//!   line-annotated markup
//!
//! ## Example
//!
//! ```rust,ignore
//! use dvbi_validator::{Loader, ReferenceConfig, ReferenceData, ServiceListChecker};
//!
//! let config = ReferenceConfig::from_file("reference.toml")?;
//! let data = ReferenceData::load(&config, &Loader::new());
//!
//! let report = ServiceListChecker::new(&data).validate(&xml);
//! println!("{} errors, {} warnings", report.error_count(), report.warning_count());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Foundation
pub mod error;
pub mod limits;

// Names and identifiers
pub mod namespaces;
pub mod terms;
pub mod versions;

// Resource loading
pub mod config;
pub mod loaders;
pub mod locations;

// Documents and findings
pub mod documents;
pub mod report;

// Reference data
pub mod reference;

// Rule checks
pub mod validators;

// Re-exports for convenience
pub use config::{ReferenceConfig, SourceMode};
pub use error::{Error, Result};
pub use limits::Limits;
pub use loaders::Loader;
pub use reference::{Lookup, ReferenceData, SharedReferenceData, Vocabulary};
pub use report::{Finding, Report, Severity};
pub use validators::{
    ContentGuideChecker, Outcome, RequestType, SchemaCheck, ServiceListChecker, Stage,
};

/// Version of the dvbi-validator library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
