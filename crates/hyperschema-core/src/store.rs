//! # Schema Store
//!
//! Loads `<schema_path>/<name>.json`, substitutes `${base_url}`, parses the
//! result, and caches it per `(base_url, name)` in a bounded LRU cache. Cached
//! documents never expire; they live until evicted by capacity pressure.
//!
//! The catalog of schema names is computed on first use and cached as a
//! single entry. Files added or removed afterwards are not seen until
//! [`SchemaStore::reset_catalog`] is called or the process restarts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;

use crate::cache::BoundedCache;
use crate::config::StoreConfig;
use crate::error::HyperSchemaError;

/// Token replaced with the base URL in every schema document.
pub const BASE_URL_PLACEHOLDER: &str = "${base_url}";

/// File extension of schema documents.
pub const SCHEMA_EXTENSION: &str = "json";

type SchemaKey = (String, String);

/// Cache counters shared by all clones of a store.
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    catalog_scans: Arc<AtomicU64>,
}

impl StoreStats {
    /// Loads answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Loads that went to disk.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Directory scans performed to build the catalog.
    pub fn catalog_scans(&self) -> u64 {
        self.catalog_scans.load(Ordering::Relaxed)
    }
}

/// File-backed schema store with an LRU document cache and a cached catalog.
///
/// Cloning is cheap and clones share caches and statistics.
#[derive(Debug, Clone)]
pub struct SchemaStore {
    schema_path: PathBuf,
    default_base_url: Option<String>,
    schemas: BoundedCache<SchemaKey, Arc<Value>>,
    catalog: BoundedCache<(), Arc<Vec<String>>>,
    stats: StoreStats,
}

impl SchemaStore {
    /// Create a store from configuration. No I/O happens until first use.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            schema_path: config.schema_path,
            default_base_url: config.base_url,
            schemas: BoundedCache::new(config.cache_capacity),
            catalog: BoundedCache::new(1),
            stats: StoreStats::default(),
        }
    }

    /// Directory backing this store.
    pub fn schema_path(&self) -> &Path {
        &self.schema_path
    }

    /// Configured fallback base URL.
    pub fn default_base_url(&self) -> Option<&str> {
        self.default_base_url.as_deref()
    }

    /// Cache counters.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }

    /// Maximum number of cached documents.
    pub fn cache_capacity(&self) -> usize {
        self.schemas.capacity()
    }

    /// Whether `(base_url, name)` is currently cached. Does not affect recency.
    pub fn is_cached(&self, base_url: Option<&str>, name: &str) -> bool {
        let key = (self.resolve_base_url(base_url).to_string(), name.to_string());
        self.schemas.contains(&key)
    }

    /// Load a schema by name, substituting `${base_url}`.
    ///
    /// An empty or absent `base_url` falls back to the configured default,
    /// then to the empty string.
    ///
    /// # Errors
    ///
    /// - [`HyperSchemaError::SchemaNotFound`] if no such file exists or the
    ///   name would escape the schema directory.
    /// - [`HyperSchemaError::SchemaParse`] if the substituted text is not JSON.
    /// - [`HyperSchemaError::Io`] for other read failures.
    pub fn load(&self, base_url: Option<&str>, name: &str) -> Result<Arc<Value>, HyperSchemaError> {
        if !is_valid_name(name) {
            return Err(HyperSchemaError::SchemaNotFound(name.to_string()));
        }

        let base_url = self.resolve_base_url(base_url).to_string();
        let key = (base_url, name.to_string());

        if let Some(schema) = self.schemas.get(&key) {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
            metrics::counter!("hyperschema_schema_cache_hits_total").increment(1);
            tracing::debug!(schema = name, base_url = %key.0, "schema cache hit");
            return Ok(schema);
        }

        self.stats.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("hyperschema_schema_cache_misses_total").increment(1);

        let path = self.schema_file(name);
        let text = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => HyperSchemaError::SchemaNotFound(name.to_string()),
            _ => HyperSchemaError::Io {
                path: path.display().to_string(),
                source: e,
            },
        })?;

        let schema: Value = serde_json::from_str(&text.replace(BASE_URL_PLACEHOLDER, &key.0))
            .map_err(|e| HyperSchemaError::SchemaParse {
                name: name.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(schema = name, path = %path.display(), "loaded schema from disk");

        let schema = Arc::new(schema);
        if let Some(((evicted_base, evicted_name), _)) =
            self.schemas.insert(key, Arc::clone(&schema))
        {
            tracing::debug!(
                schema = %evicted_name,
                base_url = %evicted_base,
                "evicted schema from cache"
            );
        }
        Ok(schema)
    }

    /// Names of all schemas in the backing directory, sorted.
    ///
    /// Computed once and cached; a missing directory yields an empty catalog.
    pub fn list_all(&self) -> Result<Arc<Vec<String>>, HyperSchemaError> {
        if let Some(names) = self.catalog.get(&()) {
            return Ok(names);
        }

        self.stats.catalog_scans.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("hyperschema_catalog_scans_total").increment(1);

        let names = Arc::new(self.scan_catalog()?);
        tracing::debug!(count = names.len(), dir = %self.schema_path.display(), "scanned schema catalog");
        self.catalog.insert((), Arc::clone(&names));
        Ok(names)
    }

    /// Forget the cached catalog so the next [`list_all`](Self::list_all) rescans.
    pub fn reset_catalog(&self) {
        self.catalog.clear();
    }

    /// Drop every cached document and the catalog.
    pub fn clear(&self) {
        self.schemas.clear();
        self.catalog.clear();
    }

    /// Base URL `load` substitutes for `base_url`: the argument if non-empty,
    /// else the configured default, else the empty string.
    pub fn resolve_base_url<'a>(&'a self, base_url: Option<&'a str>) -> &'a str {
        base_url
            .filter(|u| !u.is_empty())
            .or(self.default_base_url.as_deref())
            .unwrap_or_default()
    }

    fn schema_file(&self, name: &str) -> PathBuf {
        self.schema_path.join(format!("{name}.{SCHEMA_EXTENSION}"))
    }

    fn scan_catalog(&self) -> Result<Vec<String>, HyperSchemaError> {
        let entries = match std::fs::read_dir(&self.schema_path) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(HyperSchemaError::Io {
                    path: self.schema_path.display().to_string(),
                    source: e,
                })
            }
        };

        let mut names: Vec<String> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some(SCHEMA_EXTENSION))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Schema names are plain file stems; anything that could leave the
/// schema directory is rejected.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains(['/', '\\']) && !name.contains("..")
}
