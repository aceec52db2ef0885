//! # Consumes Middleware
//!
//! Enforces the request media types an endpoint accepts and validates the
//! body against the schema mapped to the declared type.
//!
//! On success the decoded document is placed in request extensions as
//! [`RequestPayload`] and the raw body is handed on unchanged, so handlers
//! can use either the extractor or their usual body extractors.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use hyperschema_core::media_type::essence;
use hyperschema_core::MediaTypeMap;

use crate::error::AppError;
use crate::extractors::{request_origin, RequestContext, RequestPayload};
use crate::state::HyperMedia;

/// Per-endpoint consumes configuration.
///
/// Built with [`HyperMedia::consumes`] and installed with
/// `axum::middleware::from_fn_with_state(consumes, consumes_middleware)`.
#[derive(Debug, Clone)]
pub struct Consumes {
    hypermedia: HyperMedia,
    offered: Arc<MediaTypeMap>,
}

impl Consumes {
    pub fn new(hypermedia: HyperMedia, offered: MediaTypeMap) -> Self {
        Self {
            hypermedia,
            offered: Arc::new(offered),
        }
    }

    /// Media types this endpoint accepts.
    pub fn offered(&self) -> &MediaTypeMap {
        &self.offered
    }
}

/// Validate the request body before the handler runs.
///
/// A request without a `Content-Type` header declares the empty media type
/// and is therefore rejected with 415 unless an endpoint explicitly offers it.
pub async fn consumes_middleware(
    State(consumes): State<Consumes>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);
    let declared = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| essence(v).to_string())
        .unwrap_or_default();
    let base_url = match consumes.hypermedia.base_url() {
        Some(configured) => configured.to_string(),
        None => request_origin(request.headers(), request.uri()),
    };

    let (mut parts, body) = request.into_parts();
    let limit = consumes.hypermedia.config().max_body_bytes;
    let bytes = match axum::body::to_bytes(body, limit).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::BadRequest(format!("failed to read request body: {e}"))
                .into_response_for(&ctx)
        }
    };

    let validated = match consumes.hypermedia.validator().validate(
        &declared,
        &bytes,
        &consumes.offered,
        Some(&base_url),
    ) {
        Ok(validated) => validated,
        Err(err) => return AppError::from(err).into_response_for(&ctx),
    };

    parts.extensions.insert(RequestPayload {
        media_type: validated.media_type,
        data: validated.data,
    });
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}
