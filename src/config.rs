//! Reference data configuration
//!
//! Says where each vocabulary and registry is read from. Sources are either
//! files under a local base directory or documents under a remote base URL,
//! and any vocabulary can be pointed at one or more explicit sources instead.
//! Relative explicit paths are taken relative to the base directory.
//!
//! ```toml
//! mode = "local"
//! base_dir = "reference"
//! purge = true
//!
//! [vocabularies]
//! genre = ["ContentSubject.xml", "https://example.com/cs/ExtraGenres.xml"]
//! ```

use crate::error::{Error, Result};
use crate::locations::Location;
use crate::reference::Vocabulary;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use url::Url;

/// IANA Language Subtag Registry
pub const LANGUAGE_REGISTRY_URL: &str =
    "https://www.iana.org/assignments/language-subtag-registry/language-subtag-registry";

const LANGUAGE_FILE: &str = "language-subtag-registry";
const COUNTRY_FILE: &str = "iso3166-countries.json";
const CA_SYSTEM_FILE: &str = "ca-systems.json";
const DRM_SYSTEM_FILE: &str = "drm-systems.json";

/// Where default sources come from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Files under `base_dir`
    #[default]
    Local,
    /// Documents under `remote_base`
    Remote,
}

/// Reference data sources
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceConfig {
    /// Local or remote default sources
    #[serde(default)]
    pub mode: SourceMode,
    /// Directory holding the local sources
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
    /// Base URL of the remote sources
    #[serde(default)]
    pub remote_base: Option<String>,
    /// Clear each store before loading into it
    #[serde(default = "default_purge")]
    pub purge: bool,
    /// Explicit sources per vocabulary key, replacing the default
    #[serde(default)]
    pub vocabularies: HashMap<String, Vec<Location>>,
    /// Explicit language registry sources
    #[serde(default)]
    pub languages: Vec<Location>,
    /// Explicit country list sources
    #[serde(default)]
    pub countries: Vec<Location>,
    /// Explicit CA system registry sources
    #[serde(default)]
    pub ca_systems: Vec<Location>,
    /// Explicit DRM system registry sources
    #[serde(default)]
    pub drm_systems: Vec<Location>,
}

fn default_base_dir() -> PathBuf {
    PathBuf::from("reference")
}

fn default_purge() -> bool {
    true
}

impl Default for ReferenceConfig {
    fn default() -> Self {
        Self {
            mode: SourceMode::Local,
            base_dir: default_base_dir(),
            remote_base: None,
            purge: default_purge(),
            vocabularies: HashMap::new(),
            languages: Vec::new(),
            countries: Vec::new(),
            ca_systems: Vec::new(),
            drm_systems: Vec::new(),
        }
    }
}

impl ReferenceConfig {
    /// Local configuration rooted at `base_dir`
    pub fn local(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    /// Read a TOML configuration file
    ///
    /// A relative `base_dir` is taken relative to the file's directory.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read '{}': {}", path.display(), e))
        })?;
        let mut config = Self::from_toml_str(&text)?;
        if config.base_dir.is_relative() {
            if let Some(dir) = path.parent() {
                config.base_dir = dir.join(&config.base_dir);
            }
        }
        Ok(config)
    }

    /// Parse a TOML configuration
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<()> {
        if self.mode == SourceMode::Remote {
            match &self.remote_base {
                None => {
                    return Err(Error::Config(
                        "remote mode needs a remote_base URL".to_string(),
                    ))
                }
                Some(base) => {
                    Url::parse(base)?;
                }
            }
        }
        for key in self.vocabularies.keys() {
            if Vocabulary::from_key(key).is_none() {
                return Err(Error::Config(format!("unknown vocabulary '{}'", key)));
            }
        }
        Ok(())
    }

    /// Sources of one vocabulary
    pub fn sources_for(&self, vocabulary: Vocabulary) -> Vec<Location> {
        match self.vocabularies.get(vocabulary.key()) {
            Some(explicit) => self.rebase(explicit),
            None => self.default_source(vocabulary.file_name()).into_iter().collect(),
        }
    }

    /// Sources of the language registry
    pub fn language_sources(&self) -> Vec<Location> {
        if !self.languages.is_empty() {
            return self.rebase(&self.languages);
        }
        match self.mode {
            SourceMode::Local => vec![Location::Path(self.base_dir.join(LANGUAGE_FILE))],
            SourceMode::Remote => Location::parse(LANGUAGE_REGISTRY_URL).into_iter().collect(),
        }
    }

    /// Sources of the country list
    pub fn country_sources(&self) -> Vec<Location> {
        self.explicit_or_default(&self.countries, COUNTRY_FILE)
    }

    /// Sources of the CA system registry
    pub fn ca_system_sources(&self) -> Vec<Location> {
        self.explicit_or_default(&self.ca_systems, CA_SYSTEM_FILE)
    }

    /// Sources of the DRM system registry
    pub fn drm_system_sources(&self) -> Vec<Location> {
        self.explicit_or_default(&self.drm_systems, DRM_SYSTEM_FILE)
    }

    fn explicit_or_default(&self, explicit: &[Location], file_name: &str) -> Vec<Location> {
        if explicit.is_empty() {
            self.default_source(file_name).into_iter().collect()
        } else {
            self.rebase(explicit)
        }
    }

    fn rebase(&self, explicit: &[Location]) -> Vec<Location> {
        explicit
            .iter()
            .map(|location| match location {
                Location::Path(path) if path.is_relative() => Location::Path(self.base_dir.join(path)),
                other => other.clone(),
            })
            .collect()
    }

    fn default_source(&self, file_name: &str) -> Option<Location> {
        match self.mode {
            SourceMode::Local => Some(Location::Path(self.base_dir.join(file_name))),
            SourceMode::Remote => {
                let base = Url::parse(self.remote_base.as_deref()?).ok()?;
                base.join(file_name).ok().map(Location::Url)
            }
        }
    }
}
