//! Reference data stores
//!
//! Controlled vocabularies and registries that the rule checks consult. Each
//! store is filled through the [`ReferenceStore`] trait by a
//! [`Loader`](crate::loaders::Loader) and is read-only while documents are
//! validated.
//!
//! [`ReferenceData`] bundles the stores handed to a checker. A store that is
//! absent (`None`, or no scheme for a vocabulary) turns the checks that need it
//! into no-ops. A store that is present but empty fails every lookup closed,
//! which the checkers report as a warning rather than as a document error.

mod classification;
mod countries;
mod languages;
mod registries;

pub use classification::{ClassificationScheme, TermBatch};
pub use countries::{CountryRecord, CountryStore};
pub use languages::{LanguageState, LanguageStore, RegistryBatch};
pub use registries::{CaSystemRegistry, DrmSystemRegistry};

use crate::config::ReferenceConfig;
use crate::error::Result;
use crate::loaders::Loader;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// A queryable collection filled from one or more text sources
pub trait ReferenceStore {
    /// Parsed content of one source
    type Batch;

    /// Name used in log messages
    fn name(&self) -> &str;

    /// Parse one source without modifying the store
    fn parse(&self, text: &str) -> Result<Self::Batch>;

    /// Merge a parsed source into the store
    fn extend(&mut self, batch: Self::Batch);

    /// Remove everything
    fn clear(&mut self);

    /// Number of entries
    fn len(&self) -> usize;

    /// Whether the store holds nothing
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The controlled vocabularies used by the rule checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vocabulary {
    /// Content subject genres
    Genre,
    /// Service types
    ServiceType,
    /// Video coding formats
    VideoCodec,
    /// Audio coding formats
    AudioCodec,
    /// Picture formats
    PictureFormat,
    /// Colorimetry
    Colorimetry,
    /// Accessibility purposes
    AccessibilityPurpose,
    /// Audio purposes
    AudioPurpose,
    /// Subtitle purposes
    SubtitlePurpose,
    /// Audio presentation
    AudioPresentation,
    /// Recording information
    RecordingInfo,
    /// Audio conformance points
    AudioConformance,
    /// Video conformance points
    VideoConformance,
    /// Credit roles
    Role,
    /// Parental rating schemes
    ParentalRating,
}

impl Vocabulary {
    /// Every vocabulary
    pub const ALL: [Vocabulary; 15] = [
        Vocabulary::Genre,
        Vocabulary::ServiceType,
        Vocabulary::VideoCodec,
        Vocabulary::AudioCodec,
        Vocabulary::PictureFormat,
        Vocabulary::Colorimetry,
        Vocabulary::AccessibilityPurpose,
        Vocabulary::AudioPurpose,
        Vocabulary::SubtitlePurpose,
        Vocabulary::AudioPresentation,
        Vocabulary::RecordingInfo,
        Vocabulary::AudioConformance,
        Vocabulary::VideoConformance,
        Vocabulary::Role,
        Vocabulary::ParentalRating,
    ];

    /// Key used in configuration files
    pub fn key(self) -> &'static str {
        match self {
            Vocabulary::Genre => "genre",
            Vocabulary::ServiceType => "service_type",
            Vocabulary::VideoCodec => "video_codec",
            Vocabulary::AudioCodec => "audio_codec",
            Vocabulary::PictureFormat => "picture_format",
            Vocabulary::Colorimetry => "colorimetry",
            Vocabulary::AccessibilityPurpose => "accessibility_purpose",
            Vocabulary::AudioPurpose => "audio_purpose",
            Vocabulary::SubtitlePurpose => "subtitle_purpose",
            Vocabulary::AudioPresentation => "audio_presentation",
            Vocabulary::RecordingInfo => "recording_info",
            Vocabulary::AudioConformance => "audio_conformance",
            Vocabulary::VideoConformance => "video_conformance",
            Vocabulary::Role => "role",
            Vocabulary::ParentalRating => "parental_rating",
        }
    }

    /// Look up a vocabulary by its configuration key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.key() == key)
    }

    /// Conventional file name of the vocabulary source
    pub fn file_name(self) -> &'static str {
        match self {
            Vocabulary::Genre => "ContentSubject.xml",
            Vocabulary::ServiceType => "ServiceTypeCS.xml",
            Vocabulary::VideoCodec => "VideoCodecCS.xml",
            Vocabulary::AudioCodec => "AudioCodecCS.xml",
            Vocabulary::PictureFormat => "PictureFormatCS.xml",
            Vocabulary::Colorimetry => "ColorimetryCS.xml",
            Vocabulary::AccessibilityPurpose => "AccessibilityPurposeCS.xml",
            Vocabulary::AudioPurpose => "AudioPurposeCS.xml",
            Vocabulary::SubtitlePurpose => "SubtitlePurposeCS.xml",
            Vocabulary::AudioPresentation => "AudioPresentationCS.xml",
            Vocabulary::RecordingInfo => "RecordingInfoCS.xml",
            Vocabulary::AudioConformance => "AudioConformancePointsCS.xml",
            Vocabulary::VideoConformance => "VideoConformancePointsCS.xml",
            Vocabulary::Role => "TVARoleCS.xml",
            Vocabulary::ParentalRating => "ParentalGuidanceCS.xml",
        }
    }

    /// Whether only terms without children are valid values
    pub fn leaf_only(self) -> bool {
        matches!(self, Vocabulary::VideoCodec | Vocabulary::AudioCodec)
    }

    /// An empty store for this vocabulary
    pub fn empty_store(self) -> ClassificationScheme {
        let store = if self.leaf_only() {
            ClassificationScheme::leaf_only()
        } else {
            ClassificationScheme::new()
        };
        store.with_name(self.to_string())
    }
}

impl fmt::Display for Vocabulary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key().replace('_', " "))
    }
}

/// Outcome of a reference lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The value is in the store
    Known,
    /// The store is loaded and does not hold the value
    Unknown,
    /// The store was supplied but holds nothing
    Unavailable,
    /// No store was supplied; the check does not apply
    NotSupplied,
}

/// The stores handed to a checker
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    /// Language subtag registry
    pub languages: Option<LanguageStore>,
    /// ISO 3166 countries
    pub countries: Option<CountryStore>,
    /// CA system identifiers
    pub ca_systems: Option<CaSystemRegistry>,
    /// DRM system identifiers
    pub drm_systems: Option<DrmSystemRegistry>,
    schemes: HashMap<Vocabulary, ClassificationScheme>,
}

impl ReferenceData {
    /// Create a bundle with no stores at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a bundle with an empty store for everything
    pub fn with_empty_stores() -> Self {
        Self {
            languages: Some(LanguageStore::new()),
            countries: Some(CountryStore::default()),
            ca_systems: Some(CaSystemRegistry::new()),
            drm_systems: Some(DrmSystemRegistry::new()),
            schemes: Vocabulary::ALL
                .iter()
                .map(|&v| (v, v.empty_store()))
                .collect(),
        }
    }

    /// Set the language store
    pub fn with_languages(mut self, store: LanguageStore) -> Self {
        self.languages = Some(store);
        self
    }

    /// Set the country store
    pub fn with_countries(mut self, store: CountryStore) -> Self {
        self.countries = Some(store);
        self
    }

    /// Set the CA system registry
    pub fn with_ca_systems(mut self, store: CaSystemRegistry) -> Self {
        self.ca_systems = Some(store);
        self
    }

    /// Set the DRM system registry
    pub fn with_drm_systems(mut self, store: DrmSystemRegistry) -> Self {
        self.drm_systems = Some(store);
        self
    }

    /// Set the store for one vocabulary
    pub fn with_scheme(mut self, vocabulary: Vocabulary, store: ClassificationScheme) -> Self {
        self.schemes.insert(vocabulary, store);
        self
    }

    /// The store for one vocabulary
    pub fn scheme(&self, vocabulary: Vocabulary) -> Option<&ClassificationScheme> {
        self.schemes.get(&vocabulary)
    }

    /// Look up a qualified term in a vocabulary
    pub fn lookup_term(&self, vocabulary: Vocabulary, term: &str) -> Lookup {
        match self.schemes.get(&vocabulary) {
            None => Lookup::NotSupplied,
            Some(cs) if cs.is_empty() => Lookup::Unavailable,
            Some(cs) if cs.is_known(term) => Lookup::Known,
            Some(_) => Lookup::Unknown,
        }
    }

    /// Look up an ISO 3166 alpha-3 code
    pub fn lookup_country(&self, code: &str) -> Lookup {
        match &self.countries {
            None => Lookup::NotSupplied,
            Some(store) if store.is_empty() => Lookup::Unavailable,
            Some(store) if store.is_iso3166_code(code, false) => Lookup::Known,
            Some(_) => Lookup::Unknown,
        }
    }

    /// Build a bundle from configured sources, blocking until loaded
    pub fn load(config: &ReferenceConfig, loader: &Loader) -> Self {
        let mut data = Self::with_empty_stores();
        data.refresh(config, loader);
        data
    }

    /// Build a bundle from configured sources on the async path
    pub async fn load_async(config: &ReferenceConfig, loader: &Loader) -> Self {
        let mut data = Self::with_empty_stores();
        data.refresh_async(config, loader).await;
        data
    }

    /// Reload every supplied store from configured sources
    ///
    /// A store whose sources all fail keeps its current content.
    pub fn refresh(&mut self, config: &ReferenceConfig, loader: &Loader) {
        let purge = config.purge;
        if let Some(store) = self.languages.as_mut() {
            loader.populate(store, &config.language_sources(), purge);
        }
        if let Some(store) = self.countries.as_mut() {
            loader.populate(store, &config.country_sources(), purge);
        }
        if let Some(store) = self.ca_systems.as_mut() {
            loader.populate(store, &config.ca_system_sources(), purge);
        }
        if let Some(store) = self.drm_systems.as_mut() {
            loader.populate(store, &config.drm_system_sources(), purge);
        }
        for (vocabulary, store) in self.schemes.iter_mut() {
            loader.populate(store, &config.sources_for(*vocabulary), purge);
        }
        info!("Reference data ready ({} vocabularies)", self.schemes.len());
    }

    /// Async counterpart of [`refresh`](Self::refresh)
    pub async fn refresh_async(&mut self, config: &ReferenceConfig, loader: &Loader) {
        let purge = config.purge;
        if let Some(store) = self.languages.as_mut() {
            loader
                .populate_async(store, &config.language_sources(), purge)
                .await;
        }
        if let Some(store) = self.countries.as_mut() {
            loader
                .populate_async(store, &config.country_sources(), purge)
                .await;
        }
        if let Some(store) = self.ca_systems.as_mut() {
            loader
                .populate_async(store, &config.ca_system_sources(), purge)
                .await;
        }
        if let Some(store) = self.drm_systems.as_mut() {
            loader
                .populate_async(store, &config.drm_system_sources(), purge)
                .await;
        }
        for (vocabulary, store) in self.schemes.iter_mut() {
            loader
                .populate_async(store, &config.sources_for(*vocabulary), purge)
                .await;
        }
        info!("Reference data ready ({} vocabularies)", self.schemes.len());
    }
}

/// Reference data shared between concurrent validations
///
/// Readers take an [`Arc`] snapshot and keep it for the whole validation. A
/// reload builds a new bundle off to the side and swaps it in, so in-flight
/// validations finish against the data they started with.
#[derive(Debug, Default)]
pub struct SharedReferenceData {
    current: RwLock<Arc<ReferenceData>>,
}

impl SharedReferenceData {
    /// Share `data`
    pub fn new(data: ReferenceData) -> Self {
        Self {
            current: RwLock::new(Arc::new(data)),
        }
    }

    /// The current bundle
    pub fn snapshot(&self) -> Arc<ReferenceData> {
        self.current.read().clone()
    }

    /// Swap in a new bundle
    pub fn replace(&self, data: ReferenceData) {
        *self.current.write() = Arc::new(data);
    }

    /// Reload from configured sources, keeping stores whose sources fail
    pub fn reload(&self, config: &ReferenceConfig, loader: &Loader) {
        let mut fresh = (*self.snapshot()).clone();
        fresh.refresh(config, loader);
        self.replace(fresh);
    }

    /// Async counterpart of [`reload`](Self::reload)
    pub async fn reload_async(&self, config: &ReferenceConfig, loader: &Loader) {
        let mut fresh = (*self.snapshot()).clone();
        fresh.refresh_async(config, loader).await;
        self.replace(fresh);
    }
}
