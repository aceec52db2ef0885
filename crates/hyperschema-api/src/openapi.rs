//! # OpenAPI Specification Assembly
//!
//! Collects the utoipa-documented schema resource into an OpenAPI 3.1
//! document served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

/// Assembled OpenAPI spec for the schema resource.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "hyperschema",
        description = "JSON hyper-schema service: schema catalog, schema documents and the uniform error body."
    ),
    paths(
        crate::routes::schemas::list_schemas,
        crate::routes::schemas::get_schema,
    ),
    components(schemas(crate::error::ErrorBody)),
    tags(
        (name = "schemas", description = "Schema catalog and documents referenced by rel=\"describedBy\" links"),
    )
)]
pub struct ApiDoc;

/// Build the OpenAPI router.
pub fn router() -> Router {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json: Return the generated OpenAPI specification.
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
