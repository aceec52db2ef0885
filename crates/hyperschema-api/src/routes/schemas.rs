//! # Schema Resource
//!
//! Serves the schemas known to the store so that `Link: rel="describedBy"`
//! targets resolve.
//!
//! Routes (relative to the configured schema URI, `/schemas` by default):
//! - GET {uri}: sorted list of schema names
//! - GET {uri}/: same as above
//! - GET {uri}/{schema_id}: the schema document, `${base_url}` set to the
//!   request origin

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::Value;

use crate::error::AppError;
use crate::extractors::RequestOrigin;
use crate::state::HyperMedia;

/// Build the schema router mounted at `schema_uri`.
pub fn router(schema_uri: &str) -> Router<HyperMedia> {
    Router::new()
        .route(schema_uri, get(list_schemas))
        .route(&format!("{schema_uri}/"), get(list_schemas))
        .route(&format!("{schema_uri}/{{schema_id}}"), get(get_schema))
}

/// GET /schemas: List every schema name.
#[utoipa::path(
    get,
    path = "/schemas",
    responses(
        (status = 200, description = "Sorted schema names", body = Vec<String>),
        (status = 500, description = "Schema directory unreadable", body = crate::error::ErrorBody),
    ),
    tag = "schemas"
)]
pub async fn list_schemas(State(hm): State<HyperMedia>) -> Result<Json<Vec<String>>, AppError> {
    let names = hm.store().list_all()?;
    Ok(Json(names.as_ref().clone()))
}

/// GET /schemas/{schema_id}: Return one schema document.
#[utoipa::path(
    get,
    path = "/schemas/{schema_id}",
    params(
        ("schema_id" = String, Path, description = "Schema name without the .json extension")
    ),
    responses(
        (status = 200, description = "Schema document"),
        (status = 404, description = "Unknown schema", body = crate::error::ErrorBody),
        (status = 500, description = "Schema file is not valid JSON", body = crate::error::ErrorBody),
    ),
    tag = "schemas"
)]
pub async fn get_schema(
    State(hm): State<HyperMedia>,
    RequestOrigin(origin): RequestOrigin,
    Path(schema_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let schema = hm.store().load(Some(&origin), &schema_id)?;
    Ok(Json(schema.as_ref().clone()))
}
