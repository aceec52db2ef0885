//! # hyperschema-api: Axum Integration
//!
//! Hypermedia middleware, extractors, error translation and the schema
//! resource for Axum applications, built on `hyperschema-core`.
//!
//! ## Wiring an Endpoint
//!
//! ```ignore
//! let hm = HyperMedia::from_env();
//! let things = Router::new()
//!     .route("/things", post(create_thing))
//!     .route_layer(from_fn_with_state(
//!         hm.consumes(MediaTypeMap::from([("application/vnd.thing+json", "thing")])),
//!         consumes_middleware,
//!     ))
//!     .route_layer(from_fn_with_state(
//!         hm.produces(MediaTypeMap::from([("application/vnd.thing+json", "thing")])),
//!         produces_middleware,
//!     ));
//! let app = Router::new()
//!     .merge(things)
//!     .merge(hm.schema_router())
//!     .layer(from_fn(error_context_middleware));
//! ```
//!
//! ## Routes Served by [`app`]
//!
//! - `{schema_uri}` and `{schema_uri}/{schema_id}`: the schema resource
//! - `/openapi.json`: generated OpenAPI document
//! - `/health/*`: liveness and readiness checks
//!
//! ## Middleware Stack (Tower)
//!
//! TraceLayer → error context → (per route) produces → consumes

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::get;
use axum::Router;

pub use error::{error_context_middleware, AppError, ErrorBody};
pub use extractors::{AcceptedMediaType, RequestOrigin, RequestPayload};
pub use middleware::consumes::{consumes_middleware, Consumes};
pub use middleware::produces::{produces_middleware, Produces};
pub use state::{HyperMedia, HyperMediaConfig};

/// Assemble the schema service: schema resource, OpenAPI document and
/// health checks, wrapped in error translation and request tracing.
pub fn app(hypermedia: HyperMedia) -> Router {
    let health = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .with_state(hypermedia.clone());

    Router::new()
        .merge(health)
        .merge(hypermedia.schema_router())
        .merge(openapi::router())
        .layer(from_fn(error_context_middleware))
        .layer(middleware::trace::layer())
}

// -- Health Checks ------------------------------------------------------------

/// Liveness check: always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness check: 200 once the schema directory can be listed.
async fn readiness(State(hm): State<HyperMedia>) -> (StatusCode, &'static str) {
    match hm.store().list_all() {
        Ok(_) => (StatusCode::OK, "ready"),
        Err(e) => {
            tracing::warn!(error = %e, "schema directory is not readable");
            (StatusCode::SERVICE_UNAVAILABLE, "schema directory unavailable")
        }
    }
}
