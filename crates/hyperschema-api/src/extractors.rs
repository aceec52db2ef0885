//! # Custom Extractors
//!
//! Values the hypermedia middleware hands to handlers, plus request-origin
//! helpers shared by the middleware and the schema resource.
//!
//! - [`RequestPayload`]: decoded, validated body and its declared media type
//!   (inserted by the consumes middleware).
//! - [`AcceptedMediaType`]: negotiated response media type (inserted by the
//!   produces middleware).
//! - [`RequestOrigin`]: `scheme://host` of the current request.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Uri};
use serde_json::Value;

use crate::error::AppError;

/// Host assumed when a request carries no `Host` header.
const DEFAULT_HOST: &str = "localhost";

/// Decoded request body, available to handlers behind the consumes middleware.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload {
    /// The request's declared media type (parameters stripped).
    pub media_type: String,
    /// The decoded JSON document.
    pub data: Value,
}

impl<S: Send + Sync> FromRequestParts<S> for RequestPayload {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestPayload>()
            .cloned()
            .ok_or_else(|| AppError::Internal("consumes middleware is not installed".into()))
    }
}

/// Negotiated response media type, available to handlers behind the
/// produces middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedMediaType(pub String);

impl<S: Send + Sync> FromRequestParts<S> for AcceptedMediaType {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AcceptedMediaType>()
            .cloned()
            .ok_or_else(|| AppError::Internal("produces middleware is not installed".into()))
    }
}

/// `scheme://host` of the current request, without a trailing slash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl<S: Send + Sync> FromRequestParts<S> for RequestOrigin {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(request_origin(&parts.headers, &parts.uri)))
    }
}

/// Compute the origin a client used to reach us.
///
/// Scheme: `X-Forwarded-Proto`, else the URI scheme, else `http`.
/// Host: `Host` header, else the URI authority, else `localhost`.
pub fn request_origin(headers: &HeaderMap, uri: &Uri) -> String {
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(',').next().unwrap_or_default().trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| uri.scheme_str().map(str::to_string))
        .unwrap_or_else(|| "http".to_string());

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.to_string()))
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    format!("{scheme}://{host}")
}

/// Request fields echoed in error bodies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequestContext {
    /// Request path.
    pub path: String,
    /// Absolute request URL including the query string.
    pub url: String,
    /// Request method.
    pub method: String,
}

impl RequestContext {
    /// Capture the context of `request`.
    pub fn from_request(request: &Request) -> Self {
        Self::from_parts(request.method().as_str(), request.headers(), request.uri())
    }

    fn from_parts(method: &str, headers: &HeaderMap, uri: &Uri) -> Self {
        let path_and_query = uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or_else(|| uri.path());
        Self {
            path: uri.path().to_string(),
            url: format!("{}{}", request_origin(headers, uri), path_and_query),
            method: method.to_string(),
        }
    }
}
