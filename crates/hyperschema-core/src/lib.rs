//! # hyperschema-core: Schema Store, Negotiation & Validation
//!
//! Framework-independent core of hyperschema. Everything here is synchronous
//! and free of HTTP types; the Axum integration lives in `hyperschema-api`.
//!
//! ## Components
//!
//! - [`store::SchemaStore`]: loads `<schema_path>/<name>.json`, substitutes
//!   `${base_url}`, parses, and caches per `(base_url, name)` with LRU
//!   eviction. Also lists the catalog of schema names, cached as one entry.
//! - [`negotiate::negotiate`]: selects a response media type from the
//!   client's Accept list and the endpoint's offered [`MediaTypeMap`].
//! - [`validate::BodyValidator`]: decodes a request payload by media type
//!   and validates it against the mapped schema.
//! - [`error::HyperSchemaError`]: the full failure taxonomy.
//!
//! ## Concurrency
//!
//! Stores are cheap to clone and safe to share across threads. Both caches
//! sit behind `parking_lot` mutexes that are never held across I/O.

pub mod cache;
pub mod config;
pub mod error;
pub mod media_type;
pub mod negotiate;
pub mod store;
pub mod validate;

// Re-export primary types.
pub use config::StoreConfig;
pub use error::{HyperSchemaError, SchemaFailure, ValidationFailure};
pub use media_type::{MediaTypeMap, MEDIA_TYPE_WILDCARD, MIME_FORM_URLENCODED, MIME_JSON};
pub use negotiate::{negotiate, negotiate_accept, Negotiated};
pub use store::{SchemaStore, StoreStats};
pub use validate::{BodyValidator, ValidatedBody, DEFAULT_SCHEMA_URI};
