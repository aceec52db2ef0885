//! # HyperMedia State
//!
//! [`HyperMedia`] is the composition object an application builds once at
//! startup. It owns the schema store (and therefore both caches) and hands
//! out the per-endpoint middleware configurations and the schema router.
//! Clones share the same store.

use std::sync::Arc;

use axum::Router;
use hyperschema_core::{BodyValidator, MediaTypeMap, SchemaStore, StoreConfig};

pub use hyperschema_core::DEFAULT_SCHEMA_URI;

use crate::middleware::consumes::Consumes;
use crate::middleware::produces::Produces;

/// Default limit on request bodies read by the consumes middleware (2 MiB).
pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Configuration for [`HyperMedia`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HyperMediaConfig {
    /// Schema store settings.
    pub store: StoreConfig,
    /// Mount point of the schema resource; also used to build `Link` headers.
    pub schema_uri: String,
    /// Maximum request body size accepted by the consumes middleware.
    pub max_body_bytes: usize,
}

impl Default for HyperMediaConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            schema_uri: DEFAULT_SCHEMA_URI.to_string(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl HyperMediaConfig {
    /// Build configuration from environment variables.
    ///
    /// Reads the store variables (see [`StoreConfig::from_env`]) and
    /// `SCHEMA_URI`.
    pub fn from_env() -> Self {
        let mut config = Self {
            store: StoreConfig::from_env(),
            ..Self::default()
        };
        if let Ok(uri) = std::env::var("SCHEMA_URI") {
            config = config.with_schema_uri(uri);
        }
        config
    }

    /// Builder: set the schema resource mount point.
    ///
    /// Normalised to a leading `/` and no trailing `/`; an empty value keeps
    /// the default.
    pub fn with_schema_uri(mut self, uri: impl AsRef<str>) -> Self {
        let trimmed = uri.as_ref().trim().trim_matches('/');
        if !trimmed.is_empty() {
            self.schema_uri = format!("/{trimmed}");
        }
        self
    }

    /// Builder: set the store configuration.
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Builder: set the request body limit.
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }
}

/// Shared hypermedia state: schema store plus configuration.
#[derive(Debug, Clone)]
pub struct HyperMedia {
    validator: BodyValidator,
    config: Arc<HyperMediaConfig>,
}

impl HyperMedia {
    /// Create the state from configuration. No I/O happens until first use.
    pub fn new(config: HyperMediaConfig) -> Self {
        let store = SchemaStore::new(config.store.clone());
        Self {
            validator: BodyValidator::new(store).with_schema_uri(&config.schema_uri),
            config: Arc::new(config),
        }
    }

    /// Create the state from environment variables.
    pub fn from_env() -> Self {
        Self::new(HyperMediaConfig::from_env())
    }

    /// The schema store.
    pub fn store(&self) -> &SchemaStore {
        self.validator.store()
    }

    /// The body validator.
    pub fn validator(&self) -> &BodyValidator {
        &self.validator
    }

    /// The configuration.
    pub fn config(&self) -> &HyperMediaConfig {
        &self.config
    }

    /// Configured base URL override, used when validating request bodies.
    pub fn base_url(&self) -> Option<&str> {
        self.config.store.base_url.as_deref()
    }

    /// Consumes configuration for an endpoint accepting `offered` media types.
    ///
    /// Install with
    /// `axum::middleware::from_fn_with_state(hm.consumes(map), consumes_middleware)`.
    pub fn consumes(&self, offered: MediaTypeMap) -> Consumes {
        Consumes::new(self.clone(), offered)
    }

    /// Produces configuration for an endpoint offering `offered` media types.
    ///
    /// `Link` headers point at this instance's schema resource on the
    /// request origin.
    pub fn produces(&self, offered: MediaTypeMap) -> Produces {
        Produces::new(offered).schema_uri(&self.config.schema_uri)
    }

    /// Router serving the schema resource at the configured URI.
    pub fn schema_router(&self) -> Router {
        crate::routes::schemas::router(&self.config.schema_uri).with_state(self.clone())
    }
}
