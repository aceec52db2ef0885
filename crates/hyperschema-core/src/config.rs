//! # Store Configuration
//!
//! Where schemas live, how many parsed documents to keep, and the base URL
//! substituted into `${base_url}` when a caller supplies none.

use std::path::PathBuf;

/// Default directory holding `<name>.json` schema files.
pub const DEFAULT_SCHEMA_PATH: &str = "./schemas";

/// Default number of parsed schemas kept in the LRU cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 50;

/// Configuration for a [`SchemaStore`](crate::store::SchemaStore).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory scanned for schema files.
    pub schema_path: PathBuf,
    /// Maximum number of cached `(base_url, name)` entries.
    pub cache_capacity: usize,
    /// Fallback base URL when a load is given none.
    pub base_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            base_url: None,
        }
    }
}

impl StoreConfig {
    /// Build configuration from the environment.
    ///
    /// - `SCHEMA_PATH`: schema directory (default `./schemas`)
    /// - `SCHEMA_CACHE_MAX_SIZE`: cache capacity (default 50)
    /// - `SCHEMA_BASE_URL`: base URL override (default none)
    ///
    /// An unparsable capacity falls back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let schema_path = lookup("SCHEMA_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.schema_path);

        let cache_capacity = match lookup("SCHEMA_CACHE_MAX_SIZE") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "invalid SCHEMA_CACHE_MAX_SIZE, using default");
                defaults.cache_capacity
            }),
            None => defaults.cache_capacity,
        };

        let base_url = lookup("SCHEMA_BASE_URL")
            .map(|u| u.trim().trim_end_matches('/').to_string())
            .filter(|u| !u.is_empty());

        Self {
            schema_path,
            cache_capacity,
            base_url,
        }
    }

    /// Builder: set the schema directory.
    pub fn with_schema_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.schema_path = path.into();
        self
    }

    /// Builder: set the cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builder: set the base URL override.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }
}
