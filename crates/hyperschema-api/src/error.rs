//! # Error Translation
//!
//! Every failure leaves the API as one JSON shape:
//!
//! ```json
//! {"path": "/things", "url": "http://host/things", "method": "POST",
//!  "message": "...", "details": {"schema": {...}, "schema-path": "/required"},
//!  "traceback": null, "status": 400, "code": "VALIDATION"}
//! ```
//!
//! [`AppError`] renders this body directly when it knows the request
//! ([`AppError::into_response_for`]). Handlers that just return
//! `Err(AppError)` produce a body without request fields;
//! [`error_context_middleware`] fills them in on the way out.

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hyperschema_core::HyperSchemaError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use utoipa::ToSchema;

use crate::extractors::RequestContext;

/// Uniform JSON error response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// Request path.
    pub path: String,
    /// Full request URL.
    pub url: String,
    /// Request method.
    pub method: String,
    /// Human-readable message.
    pub message: String,
    /// `{"schema": ..., "schema-path": ...}` for schema-related failures.
    #[schema(value_type = Option<Object>)]
    pub details: Option<Value>,
    /// Diagnostic trace, present only for schema authoring errors.
    pub traceback: Option<String>,
    /// HTTP status code, repeated in the body.
    pub status: u16,
    /// Machine-readable error code (e.g. "VALIDATION", "SCHEMA_ERROR").
    pub code: String,
}

impl ErrorBody {
    /// Fill the request fields.
    pub fn with_context(mut self, ctx: &RequestContext) -> Self {
        self.path = ctx.path.clone();
        self.url = ctx.url.clone();
        self.method = ctx.method.clone();
        self
    }
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// A core failure: media type, negotiation, schema or validation.
    #[error(transparent)]
    HyperSchema(#[from] HyperSchemaError),

    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request could not be processed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::HyperSchema(err) => match err {
                HyperSchemaError::UnsupportedMediaType(_) => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
                }
                HyperSchemaError::NotAcceptable(_) => {
                    (StatusCode::NOT_ACCEPTABLE, "NOT_ACCEPTABLE")
                }
                HyperSchemaError::SchemaNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                HyperSchemaError::PayloadParse(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                HyperSchemaError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION"),
                HyperSchemaError::Schema(_) | HyperSchemaError::SchemaParse { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "SCHEMA_ERROR")
                }
                HyperSchemaError::Io { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
            },
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
        }
    }

    /// Build the error body without request fields.
    pub fn to_body(&self) -> ErrorBody {
        let (status, code) = self.status_and_code();

        let (message, details, traceback) = match self {
            Self::HyperSchema(HyperSchemaError::Validation(failure)) => (
                failure.message.clone(),
                Some(json!({
                    "schema": failure.schema,
                    "schema-path": failure.schema_path,
                })),
                None,
            ),
            Self::HyperSchema(HyperSchemaError::Schema(failure)) => (
                failure.message.clone(),
                Some(json!({
                    "schema": failure.schema,
                    "schema-path": failure.schema_path,
                })),
                Some(failure.trace.clone()),
            ),
            Self::HyperSchema(err @ HyperSchemaError::SchemaParse { .. }) => {
                (err.to_string(), None, Some(format!("{err:?}")))
            }
            // Never expose internal error messages to clients.
            Self::HyperSchema(HyperSchemaError::Io { .. }) | Self::Internal(_) => {
                ("An internal error occurred".to_string(), None, None)
            }
            other => (other.to_string(), None, None),
        };

        ErrorBody {
            path: String::new(),
            url: String::new(),
            method: String::new(),
            message,
            details,
            traceback,
            status: status.as_u16(),
            code: code.to_string(),
        }
    }

    /// Render the full error response for a known request.
    pub fn into_response_for(self, ctx: &RequestContext) -> Response {
        self.log();
        let (status, _) = self.status_and_code();
        translated_response(status, self.to_body().with_context(ctx))
    }

    fn log(&self) {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(error = %self, code, "request failed with server error");
        } else {
            tracing::warn!(error = %self, code, "request rejected");
        }
    }
}

/// Marker placed in response extensions so the error-context middleware can
/// rewrite the body with request fields.
#[derive(Debug, Clone)]
struct Translated(ErrorBody);

fn translated_response(status: StatusCode, body: ErrorBody) -> Response {
    let mut response = (status, Json(body.clone())).into_response();
    response.extensions_mut().insert(Translated(body));
    response
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        let (status, _) = self.status_and_code();
        translated_response(status, self.to_body())
    }
}

/// Middleware that completes `path`, `url` and `method` in error bodies.
///
/// Install it around any router whose handlers or middleware return
/// [`AppError`]. Non-error responses pass through untouched.
pub async fn error_context_middleware(request: Request, next: Next) -> Response {
    let ctx = RequestContext::from_request(&request);
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<Translated>() {
        Some(Translated(body)) if body.path.is_empty() => {
            let status = response.status();
            let mut rewritten = translated_response(status, body.with_context(&ctx));
            for (name, value) in response.headers() {
                if name != header::CONTENT_LENGTH && name != header::CONTENT_TYPE {
                    rewritten.headers_mut().append(name.clone(), value.clone());
                }
            }
            rewritten
        }
        Some(marker) => {
            response.extensions_mut().insert(marker);
            response
        }
        None => response,
    }
}
