//! Reference data loading
//!
//! [`Loader`] fetches source text from a [`Location`] and feeds it to a
//! [`ReferenceStore`]. Two paths exist: a blocking one for single-shot use
//! (the CLI must not validate before the vocabularies are in memory) and an
//! async one for services that load at startup on a tokio runtime.
//!
//! A failing source is logged and skipped; the store keeps whatever it held
//! before. With `purge` set, the store is cleared only once at least one source
//! has been read and parsed successfully.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::locations::Location;
use crate::reference::ReferenceStore;
use tracing::{debug, info, warn};

/// Resource loader for reference data
#[derive(Debug, Clone)]
pub struct Loader {
    /// Resource limits
    limits: Limits,
    /// Whether to allow remote resources
    allow_remote: bool,
}

impl Loader {
    /// Create a new loader with default settings
    pub fn new() -> Self {
        Self {
            limits: Limits::default(),
            allow_remote: true,
        }
    }

    /// Set the limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Set whether to allow remote resources
    pub fn with_allow_remote(mut self, allow: bool) -> Self {
        self.allow_remote = allow;
        self
    }

    /// Load a resource as a string, blocking until it is available
    pub fn load(&self, location: &Location) -> Result<String> {
        let content = match location {
            Location::Path(path) => std::fs::read_to_string(path).map_err(|e| {
                Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
            })?,
            Location::Url(url) => {
                self.check_remote()?;
                fetch_blocking(url)?
            }
            Location::Text { content, .. } => content.clone(),
        };
        self.limits.check_reference_size(content.len())?;
        Ok(content)
    }

    /// Load a resource as a string without blocking the runtime
    pub async fn load_async(&self, location: &Location) -> Result<String> {
        let content = match location {
            Location::Path(path) => tokio::fs::read_to_string(path).await.map_err(|e| {
                Error::Resource(format!("Failed to read file '{}': {}", path.display(), e))
            })?,
            Location::Url(url) => {
                self.check_remote()?;
                fetch_async(url).await?
            }
            Location::Text { content, .. } => content.clone(),
        };
        self.limits.check_reference_size(content.len())?;
        Ok(content)
    }

    /// Populate `store` from `sources`, blocking. Returns the number of sources used.
    pub fn populate<S: ReferenceStore>(
        &self,
        store: &mut S,
        sources: &[Location],
        purge: bool,
    ) -> usize {
        let mut texts = Vec::new();
        for location in sources {
            match self.load(location) {
                Ok(text) => texts.push((location.to_string(), text)),
                Err(e) => warn!("Failed to load {} from {}: {}", store.name(), location, e),
            }
        }
        ingest_all(store, texts, purge)
    }

    /// Populate `store` from `sources` on the async path
    pub async fn populate_async<S: ReferenceStore>(
        &self,
        store: &mut S,
        sources: &[Location],
        purge: bool,
    ) -> usize {
        let mut texts = Vec::new();
        for location in sources {
            match self.load_async(location).await {
                Ok(text) => texts.push((location.to_string(), text)),
                Err(e) => warn!("Failed to load {} from {}: {}", store.name(), location, e),
            }
        }
        ingest_all(store, texts, purge)
    }

    fn check_remote(&self) -> Result<()> {
        if self.allow_remote {
            Ok(())
        } else {
            Err(Error::Resource(
                "Remote resources are not allowed".to_string(),
            ))
        }
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

fn ingest_all<S: ReferenceStore>(store: &mut S, texts: Vec<(String, String)>, purge: bool) -> usize {
    // Parse everything before touching the store so a bad source cannot leave it half-purged.
    let mut parsed = Vec::new();
    for (label, text) in texts {
        match parse_source(store, &label, &text) {
            Ok(batch) => parsed.push((label, batch)),
            Err(e) => warn!("Failed to parse {}: {}", store.name(), e),
        }
    }

    if parsed.is_empty() {
        return 0;
    }
    if purge {
        debug!("Purging {} before reload", store.name());
        store.clear();
    }

    let used = parsed.len();
    for (label, batch) in parsed {
        store.extend(batch);
        debug!("Ingested {} from {}", store.name(), label);
    }
    info!("Loaded {} ({} entries from {} sources)", store.name(), store.len(), used);
    used
}

/// Parse one source, naming it in any reference data error
fn parse_source<S: ReferenceStore>(store: &S, label: &str, text: &str) -> Result<S::Batch> {
    store.parse(text).map_err(|e| match e {
        Error::Reference(e) if e.source_name.is_none() => Error::Reference(e.with_source(label)),
        other => other,
    })
}

#[cfg(feature = "remote")]
fn fetch_blocking(url: &url::Url) -> Result<String> {
    let response = reqwest::blocking::get(url.as_str())
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Resource(format!("Failed to fetch '{}': {}", url, e)))?;
    response
        .text()
        .map_err(|e| Error::Resource(format!("Failed to read body of '{}': {}", url, e)))
}

#[cfg(not(feature = "remote"))]
fn fetch_blocking(url: &url::Url) -> Result<String> {
    Err(Error::Resource(format!(
        "URL loading requires the 'remote' feature: {}",
        url
    )))
}

#[cfg(feature = "remote")]
async fn fetch_async(url: &url::Url) -> Result<String> {
    let response = reqwest::get(url.as_str())
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| Error::Resource(format!("Failed to fetch '{}': {}", url, e)))?;
    response
        .text()
        .await
        .map_err(|e| Error::Resource(format!("Failed to read body of '{}': {}", url, e)))
}

#[cfg(not(feature = "remote"))]
async fn fetch_async(url: &url::Url) -> Result<String> {
    fetch_blocking(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ClassificationScheme, LanguageStore};
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CS: &str = r#"<ClassificationScheme uri="urn:test:cs">
        <Term termID="1"><Term termID="1.1"/></Term>
    </ClassificationScheme>"#;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", CS).unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let content = Loader::new().load(&location).unwrap();
        assert!(content.contains("urn:test:cs"));
    }

    #[test]
    fn test_size_limit() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", "x".repeat(6 * 1024 * 1024)).unwrap();

        let location = Location::Path(file.path().to_path_buf());
        let loader = Loader::new().with_limits(Limits::strict());
        assert!(loader.load(&location).is_err());
    }

    #[test]
    fn test_remote_disallowed() {
        let location = Location::parse("https://example.com/cs.xml").unwrap();
        let loader = Loader::new().with_allow_remote(false);
        assert!(loader.load(&location).is_err());
    }

    #[test]
    fn test_failed_source_keeps_prior_state() {
        let loader = Loader::new();
        let mut cs = ClassificationScheme::new();
        loader.populate(&mut cs, &[Location::text("cs", CS)], true);
        assert!(cs.is_known("urn:test:cs:1.1"));

        let used = loader.populate(
            &mut cs,
            &[Location::Path("/nonexistent/ContentSubject.xml".into())],
            true,
        );
        assert_eq!(used, 0);
        assert!(cs.is_known("urn:test:cs:1.1"));
    }

    #[test]
    fn test_parse_errors_name_their_source() {
        let store = LanguageStore::new();
        let err = parse_source(&store, "<languages>", "garbage").unwrap_err();
        assert_eq!(
            err.to_string(),
            "reference data error: malformed registry line 'garbage' (in <languages>, line 1)"
        );
    }

    #[tokio::test]
    async fn test_populate_async_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", CS).unwrap();

        let mut cs = ClassificationScheme::new();
        let used = Loader::new()
            .populate_async(&mut cs, &[Location::Path(file.path().to_path_buf())], false)
            .await;
        assert_eq!(used, 1);
        assert!(cs.is_known("urn:test:cs:1"));
    }
}
