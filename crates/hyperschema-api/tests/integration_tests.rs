//! # Integration Tests for hyperschema-api
//!
//! Drives a router wired the way applications wire it: per-route consumes
//! and produces middleware, the schema resource, and error-context
//! translation. Covers negotiation, body validation, the schema resource,
//! handler-raised errors and the health checks.

use axum::body::{Body, Bytes};
use axum::http::{header, Request, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use axum::{Json, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use hyperschema_api::{
    consumes_middleware, error_context_middleware, produces_middleware, AcceptedMediaType,
    AppError, ErrorBody, HyperMedia, HyperMediaConfig, RequestPayload,
};
use hyperschema_core::validate::validate_instance;
use hyperschema_core::{MediaTypeMap, StoreConfig, MIME_FORM_URLENCODED};

const MIME_TEST: &str = "application/vnd.test+json";

const SCHEMA_TEST: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": "${base_url}/schemas/schema-test#",
    "type": "object",
    "required": ["name"],
    "properties": {
        "name": {"type": "string"}
    }
}"#;

/// Helper: temp schema directory holding `schema-test` and `other`.
fn schema_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("schema-test.json"), SCHEMA_TEST).unwrap();
    std::fs::write(dir.path().join("other.json"), r#"{"type": "string"}"#).unwrap();
    dir
}

fn hypermedia(dir: &TempDir) -> HyperMedia {
    HyperMedia::new(
        HyperMediaConfig::default()
            .with_store(StoreConfig::default().with_schema_path(dir.path())),
    )
}

fn offered() -> MediaTypeMap {
    MediaTypeMap::from([(MIME_TEST, "schema-test")])
}

async fn negotiated(AcceptedMediaType(media_type): AcceptedMediaType) -> String {
    media_type
}

async fn echo(_payload: RequestPayload, body: Bytes) -> Bytes {
    body
}

async fn decoded(payload: RequestPayload) -> Json<Value> {
    Json(payload.data)
}

async fn raise_validation() -> Result<Json<Value>, AppError> {
    validate_instance(&json!({"type": "string"}), &json!(42))?;
    Ok(Json(json!("unreachable")))
}

async fn raise_schema_error() -> Result<Json<Value>, AppError> {
    validate_instance(&json!({"type": 12}), &json!(42))?;
    Ok(Json(json!("unreachable")))
}

/// Helper: build the test app over `hm`.
fn test_app_with(hm: HyperMedia) -> Router {
    let produces = Router::new()
        .route("/produces", get(negotiated))
        .route_layer(from_fn_with_state(hm.produces(offered()), produces_middleware));

    let strict = Router::new()
        .route("/produces/strict", get(negotiated))
        .route_layer(from_fn_with_state(
            hm.produces(offered()).strict(true),
            produces_middleware,
        ));

    let consumes = Router::new()
        .route("/consumes", post(echo))
        .route_layer(from_fn_with_state(hm.consumes(offered()), consumes_middleware));

    let form = Router::new()
        .route("/consumes/form", post(decoded))
        .route_layer(from_fn_with_state(
            hm.consumes(MediaTypeMap::from([(MIME_FORM_URLENCODED, "schema-test")])),
            consumes_middleware,
        ));

    let raising = Router::new()
        .route("/raise/validation", get(raise_validation))
        .route("/raise/schema", get(raise_schema_error));

    Router::new()
        .merge(produces)
        .merge(strict)
        .merge(consumes)
        .merge(form)
        .merge(raising)
        .layer(from_fn(error_context_middleware))
        .merge(hyperschema_api::app(hm))
}

fn test_app(dir: &TempDir) -> Router {
    test_app_with(hypermedia(dir))
}

/// Helper: read response body as string.
async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::http::Response<Body>) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get_with_accept(uri: &str, accept: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(accept) = accept {
        builder = builder.header(header::ACCEPT, accept);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_with_type(uri: &str, content_type: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type)
        .body(body.into())
        .unwrap()
}

// -- Health Checks ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_check() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/health/liveness", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_check() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/health/readiness", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Response Negotiation -----------------------------------------------------

#[tokio::test]
async fn test_no_accept_header_selects_default() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/produces", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().get(header::LINK).is_none());
    assert_eq!(body_string(response).await, "application/json");
}

#[tokio::test]
async fn test_wildcard_accept_selects_default() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/produces", Some("*/*")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "application/json");
}

#[tokio::test]
async fn test_offered_type_is_selected_with_describedby_link() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept(
            "/produces",
            Some("application/unsupported+json, application/vnd.test+json"),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], MIME_TEST);
    assert_eq!(
        response.headers()[header::LINK],
        "<http://localhost/schemas/schema-test#>; rel=\"describedBy\""
    );
    assert_eq!(body_string(response).await, MIME_TEST);
}

#[tokio::test]
async fn test_link_uses_request_host() {
    let dir = schema_dir();
    let request = Request::builder()
        .uri("/produces")
        .header(header::ACCEPT, MIME_TEST)
        .header(header::HOST, "api.example.com")
        .header("x-forwarded-proto", "https")
        .body(Body::empty())
        .unwrap();
    let response = test_app(&dir).oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::LINK],
        "<https://api.example.com/schemas/schema-test#>; rel=\"describedBy\""
    );
}

fn hypermedia_with_base_url(dir: &TempDir) -> HyperMedia {
    HyperMedia::new(
        HyperMediaConfig::default().with_store(
            StoreConfig::default()
                .with_schema_path(dir.path())
                .with_base_url("https://configured.example"),
        ),
    )
}

#[tokio::test]
async fn test_link_uses_origin_even_with_configured_base_url() {
    let dir = schema_dir();
    let request = Request::builder()
        .uri("/produces")
        .header(header::ACCEPT, MIME_TEST)
        .header(header::HOST, "origin.test")
        .body(Body::empty())
        .unwrap();
    let response = test_app_with(hypermedia_with_base_url(&dir))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::LINK],
        "<http://origin.test/schemas/schema-test#>; rel=\"describedBy\""
    );
}

#[tokio::test]
async fn test_explicit_produces_base_url_overrides_origin() {
    let dir = schema_dir();
    let hm = hypermedia(&dir);
    let app = Router::new()
        .route("/pinned", get(negotiated))
        .route_layer(from_fn_with_state(
            hm.produces(offered()).base_url("https://cdn.example"),
            produces_middleware,
        ));
    let response = app
        .oneshot(get_with_accept("/pinned", Some(MIME_TEST)))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::LINK],
        "<https://cdn.example/schemas/schema-test#>; rel=\"describedBy\""
    );
}

#[tokio::test]
async fn test_strict_negotiation_without_overlap_is_406() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/produces/strict", Some("application/unsupported+json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    assert!(response.headers().get(header::LINK).is_none());
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "NOT_ACCEPTABLE");
    assert_eq!(body.status, 406);
    assert_eq!(body.path, "/produces/strict");
    assert_eq!(body.method, "GET");
}

#[tokio::test]
async fn test_strict_accept_of_only_refusals_is_406() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/produces/strict", Some("application/json;q=0")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_ACCEPTABLE);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "NOT_ACCEPTABLE");
}

#[tokio::test]
async fn test_lenient_negotiation_without_overlap_selects_default() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/produces", Some("application/unsupported+json")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    assert!(response.headers().get(header::LINK).is_none());
}

// -- Request Validation -------------------------------------------------------

#[tokio::test]
async fn test_unsupported_content_type_is_415() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(post_with_type(
            "/consumes",
            "application/unsupported+json",
            r#"{"name": "x"}"#,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "UNSUPPORTED_MEDIA_TYPE");
    assert_eq!(body.path, "/consumes");
    assert_eq!(body.method, "POST");
}

#[tokio::test]
async fn test_missing_content_type_is_415() {
    let dir = schema_dir();
    let request = Request::builder()
        .method("POST")
        .uri("/consumes")
        .body(Body::from(r#"{"name": "x"}"#))
        .unwrap();
    let response = test_app(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn test_valid_body_is_echoed_unchanged() {
    let dir = schema_dir();
    let raw = r#"{"name":  "Ada",   "extra": [1, 2]}"#;
    let response = test_app(&dir)
        .oneshot(post_with_type("/consumes", "application/vnd.test+json; charset=utf-8", raw))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, raw);
}

#[tokio::test]
async fn test_invalid_body_is_400_with_schema_details() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(post_with_type("/consumes", MIME_TEST, r#"{"age": 3}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "VALIDATION");
    assert_eq!(body.status, 400);
    assert_eq!(body.url, "http://localhost/consumes");
    let details = body.details.unwrap();
    assert_eq!(details["schema-path"], json!("/required"));
    assert_eq!(
        details["schema"]["$id"],
        json!("http://localhost/schemas/schema-test#")
    );
}

#[tokio::test]
async fn test_malformed_json_is_400_bad_request() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(post_with_type("/consumes", MIME_TEST, "{\"name\":"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "BAD_REQUEST");
}

#[tokio::test]
async fn test_form_payload_field_is_decoded() {
    let dir = schema_dir();
    // payload={"name":"Grace"}
    let form = "payload=%7B%22name%22%3A%22Grace%22%7D";
    let response = test_app(&dir)
        .oneshot(post_with_type("/consumes/form", "application/x-www-form-urlencoded; charset=utf-8", form))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, json!({"name": "Grace"}));
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let dir = schema_dir();
    let hm = HyperMedia::new(
        HyperMediaConfig::default()
            .with_store(StoreConfig::default().with_schema_path(dir.path()))
            .with_max_body_bytes(8),
    );
    let response = test_app_with(hm)
        .oneshot(post_with_type("/consumes", MIME_TEST, r#"{"name": "too long"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

const PARENT: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": "${base_url}/schemas/parent#",
    "type": "object",
    "properties": {
        "child": {"$ref": "${base_url}/schemas/child#"}
    }
}"#;

const CHILD: &str = r#"{
    "$schema": "http://json-schema.org/draft-07/schema#",
    "$id": "${base_url}/schemas/child#",
    "type": "object",
    "required": ["name"]
}"#;

fn referencing_app(dir: &TempDir) -> Router {
    std::fs::write(dir.path().join("parent.json"), PARENT).unwrap();
    std::fs::write(dir.path().join("child.json"), CHILD).unwrap();
    let hm = hypermedia(dir);
    Router::new()
        .route("/parents", post(decoded))
        .route_layer(from_fn_with_state(
            hm.consumes(MediaTypeMap::from([("application/json", "parent")])),
            consumes_middleware,
        ))
        .layer(from_fn(error_context_middleware))
}

fn post_parent(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/parents")
        .header(header::HOST, "127.0.0.1:9")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_sibling_schema_reference_is_served_from_store() {
    let dir = schema_dir();
    let response = referencing_app(&dir)
        .oneshot(post_parent(r#"{"child": {"name": "x"}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = body_json(response).await;
    assert_eq!(body, json!({"child": {"name": "x"}}));
}

#[tokio::test]
async fn test_sibling_schema_reference_violation_is_400() {
    let dir = schema_dir();
    let response = referencing_app(&dir)
        .oneshot(post_parent(r#"{"child": {}}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "VALIDATION");
}

// -- Schema Resource ----------------------------------------------------------

#[tokio::test]
async fn test_list_schemas_returns_sorted_catalog() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/schemas", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<String> = body_json(response).await;
    assert_eq!(names, vec!["other", "schema-test"]);
}

#[tokio::test]
async fn test_list_schemas_trailing_slash() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/schemas/", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let names: Vec<String> = body_json(response).await;
    assert_eq!(names.len(), 2);
}

#[tokio::test]
async fn test_get_schema_substitutes_request_origin() {
    let dir = schema_dir();
    let request = Request::builder()
        .uri("/schemas/schema-test")
        .header(header::HOST, "api.test")
        .body(Body::empty())
        .unwrap();
    let response = test_app(&dir).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schema: Value = body_json(response).await;
    assert_eq!(schema["$id"], json!("http://api.test/schemas/schema-test#"));
    assert_eq!(schema["required"], json!(["name"]));
}

#[tokio::test]
async fn test_get_schema_prefers_origin_over_configured_base_url() {
    let dir = schema_dir();
    let request = Request::builder()
        .uri("/schemas/schema-test")
        .header(header::HOST, "origin.test")
        .body(Body::empty())
        .unwrap();
    let response = test_app_with(hypermedia_with_base_url(&dir))
        .oneshot(request)
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schema: Value = body_json(response).await;
    assert_eq!(schema["$id"], json!("http://origin.test/schemas/schema-test#"));
}

#[tokio::test]
async fn test_get_unknown_schema_is_404() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/schemas/unknown-id", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "NOT_FOUND");
    assert_eq!(body.path, "/schemas/unknown-id");
}

#[tokio::test]
async fn test_schema_resource_honours_custom_uri() {
    let dir = schema_dir();
    let hm = HyperMedia::new(
        HyperMediaConfig::default()
            .with_store(StoreConfig::default().with_schema_path(dir.path()))
            .with_schema_uri("/api/v1/schemas"),
    );
    let response = test_app_with(hm)
        .oneshot(get_with_accept("/api/v1/schemas/other", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let schema: Value = body_json(response).await;
    assert_eq!(schema, json!({"type": "string"}));
}

// -- Handler-Raised Errors ----------------------------------------------------

#[tokio::test]
async fn test_handler_validation_failure_is_400() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/raise/validation", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "VALIDATION");
    assert_eq!(body.status, 400);
    assert_eq!(body.path, "/raise/validation");
    assert_eq!(body.url, "http://localhost/raise/validation");
    assert_eq!(body.method, "GET");
    assert!(body.traceback.is_none());
}

#[tokio::test]
async fn test_handler_schema_failure_is_500_with_traceback() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/raise/schema", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = body_json(response).await;
    assert_eq!(body.code, "SCHEMA_ERROR");
    assert_eq!(body.status, 500);
    assert!(body.traceback.is_some());
    assert_eq!(body.details.unwrap()["schema"], json!({"type": 12}));
}

// -- OpenAPI ------------------------------------------------------------------

#[tokio::test]
async fn test_openapi_json_is_served() {
    let dir = schema_dir();
    let response = test_app(&dir)
        .oneshot(get_with_accept("/openapi.json", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let spec: Value = body_json(response).await;
    assert!(spec["paths"]["/schemas/{schema_id}"].is_object());
}
