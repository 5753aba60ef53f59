//! Provider schema retrieval and per-run memoization.
//!
//! A [`ProviderCache`] is created once per assembly and passed by reference
//! to everything that needs provider documents. Each `(name, version)` pair
//! is fetched at most once; concurrent callers asking for the same pair wait
//! for the first caller's result instead of issuing a second fetch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info};
use serde_json::Value;

use crate::error::AssembleError;
use crate::loader::{is_url, load_json, parse_document};
use crate::types::ProviderDescriptor;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default location of upstream provider documents.
pub const DEFAULT_SOURCE: &str = "https://raw.githubusercontent.com/pulumi/pulumi-{name}/v{version}/provider/cmd/pulumi-resource-{name}/schema.json";

/// Version as it appears in upstream tags: build metadata (`+abc123`) is
/// dropped.
pub fn url_version(version: &str) -> &str {
    version.split_once('+').map_or(version, |(before, _)| before)
}

/// Somewhere provider documents can be read from.
pub trait SchemaSource: Send + Sync {
    /// Where the document for `(name, version)` lives, for error messages.
    fn location(&self, name: &str, version: &str) -> String;

    /// Read the raw document for `(name, version)`.
    fn fetch(&self, name: &str, version: &str) -> Result<Value, String>;
}

/// Fetches documents over HTTP from a URL template.
///
/// `{name}` and `{version}` in the template are substituted; the version has
/// build metadata stripped.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    template: String,
    timeout: Duration,
}

#[cfg(feature = "remote")]
impl HttpSource {
    pub fn new(template: impl Into<String>, timeout: Duration) -> Self {
        Self {
            template: template.into(),
            timeout,
        }
    }
}

#[cfg(feature = "remote")]
impl SchemaSource for HttpSource {
    fn location(&self, name: &str, version: &str) -> String {
        self.template
            .replace("{name}", name)
            .replace("{version}", url_version(version))
    }

    fn fetch(&self, name: &str, version: &str) -> Result<Value, String> {
        crate::loader::fetch_json(&self.location(name, version), self.timeout)
    }
}

/// Reads documents from a local tree laid out as
/// `<root>/<name>/v<version>/schema.json`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn path_for(&self, name: &str, version: &str) -> PathBuf {
        self.root
            .join(name)
            .join(format!("v{}", url_version(version)))
            .join("schema.json")
    }
}

impl SchemaSource for DirectorySource {
    fn location(&self, name: &str, version: &str) -> String {
        self.path_for(name, version).display().to_string()
    }

    fn fetch(&self, name: &str, version: &str) -> Result<Value, String> {
        load_json(&self.path_for(name, version)).map_err(|e| e.to_string())
    }
}

/// Holds documents in memory. Counts fetches, which makes it the natural
/// stand-in for a remote source in tests.
#[derive(Debug, Default)]
pub struct MemorySource {
    documents: HashMap<(String, String), Value>,
    fetches: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, name: &str, version: &str, document: Value) -> Self {
        self.documents
            .insert((name.to_string(), version.to_string()), document);
        self
    }

    /// Number of `fetch` calls served so far, hits and misses alike.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl SchemaSource for MemorySource {
    fn location(&self, name: &str, version: &str) -> String {
        format!("memory://{}/{}", name, version)
    }

    fn fetch(&self, name: &str, version: &str) -> Result<Value, String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.documents
            .get(&(name.to_string(), version.to_string()))
            .cloned()
            .ok_or_else(|| "no such document".to_string())
    }
}

impl<T: SchemaSource + ?Sized> SchemaSource for Arc<T> {
    fn location(&self, name: &str, version: &str) -> String {
        (**self).location(name, version)
    }

    fn fetch(&self, name: &str, version: &str) -> Result<Value, String> {
        (**self).fetch(name, version)
    }
}

/// Pick a source from a CLI-style string: URL templates go over HTTP,
/// anything else is a local directory.
pub fn source_from_str(
    source: &str,
    #[cfg(feature = "remote")] timeout: Duration,
) -> Result<Box<dyn SchemaSource>, AssembleError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            Ok(Box::new(HttpSource::new(source, timeout)))
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(AssembleError::Fetch {
                provider: "*".to_string(),
                version: "*".to_string(),
                location: source.to_string(),
                message: "HTTP fetching requires 'remote' feature".to_string(),
            })
        }
    } else {
        Ok(Box::new(DirectorySource::new(Path::new(source))))
    }
}

/// Cache key combining provider name and version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    name: String,
    version: String,
}

type Slot = Arc<Mutex<Option<Arc<ProviderDescriptor>>>>;

/// Memoized, single-flight provider document cache.
pub struct ProviderCache {
    source: Box<dyn SchemaSource>,
    slots: Mutex<HashMap<CacheKey, Slot>>,
}

impl ProviderCache {
    pub fn new(source: impl SchemaSource + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn SchemaSource>) -> Self {
        Self {
            source,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve `(name, version)` to a parsed provider document.
    ///
    /// # Errors
    ///
    /// Returns `AssembleError::Fetch` if the document can't be retrieved or
    /// isn't a well-formed package schema. Failures are not cached.
    pub fn resolve(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Arc<ProviderDescriptor>, AssembleError> {
        let key = CacheKey {
            name: name.to_string(),
            version: version.to_string(),
        };

        // Hold the map lock only long enough to find this key's slot.
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key).or_default())
        };

        // Concurrent callers for the same key queue here behind the fetcher.
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = entry.as_ref() {
            debug!("provider cache hit: {} v{}", name, version);
            return Ok(Arc::clone(cached));
        }

        let location = self.source.location(name, version);
        info!("fetching {} v{} from {}", name, version, location);
        let fetch_error = |message: String| AssembleError::Fetch {
            provider: name.to_string(),
            version: version.to_string(),
            location: location.clone(),
            message,
        };

        let raw = self.source.fetch(name, version).map_err(fetch_error)?;
        let mut document = parse_document(raw, &location).map_err(fetch_error)?;
        if document.version.as_deref().map_or(true, str::is_empty) {
            // Version is rarely included upstream, so stamp the one we asked for.
            document.version = Some(format!("v{}", version));
        }

        let descriptor = Arc::new(ProviderDescriptor {
            name: name.to_string(),
            version: version.to_string(),
            document,
        });
        *entry = Some(Arc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Number of distinct providers fetched successfully so far.
    pub fn len(&self) -> usize {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .values()
            .filter(|slot| {
                slot.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some()
            })
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
