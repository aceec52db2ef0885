//! # Produces Middleware
//!
//! Negotiates the response media type from the request's `Accept` header
//! and annotates successful responses:
//!
//! - `Content-Type: <negotiated type>` (when `set_media_type` is on)
//! - `Link: <{base}{schema_uri}/{schema}#>; rel="describedBy"` when the
//!   negotiated type maps to a schema
//!
//! Error responses are never annotated; the handler's status and body pass
//! through unchanged.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use hyperschema_core::{negotiate_accept, MediaTypeMap, MIME_JSON};

use crate::error::AppError;
use crate::extractors::{request_origin, AcceptedMediaType, RequestContext};
use crate::state::DEFAULT_SCHEMA_URI;

/// Per-endpoint produces configuration.
///
/// Built with [`HyperMedia::produces`](crate::HyperMedia::produces) or
/// directly, then installed with
/// `axum::middleware::from_fn_with_state(produces, produces_middleware)`.
#[derive(Debug, Clone)]
pub struct Produces {
    offered: Arc<MediaTypeMap>,
    default_media_type: String,
    set_media_type: bool,
    strict: bool,
    schema_uri: String,
    base_url: Option<String>,
}

impl Produces {
    /// Lenient negotiation over `offered`, defaulting to `application/json`.
    pub fn new(offered: MediaTypeMap) -> Self {
        Self {
            offered: Arc::new(offered),
            default_media_type: MIME_JSON.to_string(),
            set_media_type: true,
            strict: false,
            schema_uri: DEFAULT_SCHEMA_URI.to_string(),
            base_url: None,
        }
    }

    /// Media type used when the client accepts anything or nothing matches.
    pub fn default_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.default_media_type = media_type.into();
        self
    }

    /// Reject requests with no acceptable offered type (406).
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Whether to overwrite the response `Content-Type`.
    pub fn set_media_type(mut self, set: bool) -> Self {
        self.set_media_type = set;
        self
    }

    /// Mount point of the schema resource used in `Link` headers.
    pub fn schema_uri(mut self, uri: impl Into<String>) -> Self {
        self.schema_uri = uri.into();
        self
    }

    /// Fixed base URL for `Link` headers instead of the request origin.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Media types this endpoint offers.
    pub fn offered(&self) -> &MediaTypeMap {
        &self.offered
    }

    /// `Link` header value for `schema`, relative to `origin` unless a base
    /// URL is configured.
    pub fn link_for(&self, origin: &str, schema: &str) -> String {
        let base = self.base_url.as_deref().unwrap_or(origin);
        format!("<{base}{}/{schema}#>; rel=\"describedBy\"", self.schema_uri)
    }
}

/// Negotiate before the handler runs and annotate its response.
pub async fn produces_middleware(
    State(produces): State<Produces>,
    mut request: Request,
    next: Next,
) -> Response {
    // Multiple Accept headers are equivalent to one comma-joined value.
    let accept = {
        let values: Vec<&str> = request
            .headers()
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        (!values.is_empty()).then(|| values.join(","))
    };

    let negotiated = match negotiate_accept(
        accept.as_deref(),
        &produces.offered,
        &produces.default_media_type,
        produces.strict,
    ) {
        Ok(negotiated) => negotiated,
        Err(err) => {
            return AppError::from(err).into_response_for(&RequestContext::from_request(&request))
        }
    };

    let origin = request_origin(request.headers(), request.uri());
    request
        .extensions_mut()
        .insert(AcceptedMediaType(negotiated.media_type.clone()));

    let mut response = next.run(request).await;
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        return response;
    }

    if produces.set_media_type {
        match HeaderValue::from_str(&negotiated.media_type) {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_TYPE, value);
            }
            Err(e) => tracing::warn!(
                media_type = %negotiated.media_type,
                error = %e,
                "negotiated media type is not a valid header value"
            ),
        }
    }

    if let Some(schema) = negotiated.schema.as_deref() {
        match HeaderValue::from_str(&produces.link_for(&origin, schema)) {
            Ok(value) => {
                response.headers_mut().insert(header::LINK, value);
            }
            Err(e) => tracing::warn!(schema, error = %e, "schema link is not a valid header value"),
        }
    }

    response
}
