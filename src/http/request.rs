//! Request identification.
//!
//! Every request gets an `x-request-id` (kept when the caller supplies one)
//! before tracing starts, so the span and every log line inside it carry it.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, Request};
use tracing::Span;

pub const X_REQUEST_ID: &str = "x-request-id";

pub fn request_id_header() -> HeaderName {
    HeaderName::from_static(X_REQUEST_ID)
}

/// The request id, or `unknown` if the id layer did not run.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for `TraceLayer`, tagged with the request id.
pub fn make_span(request: &Request<Body>) -> Span {
    tracing::info_span!(
        "request",
        request_id = %request_id(request.headers()),
        method = %request.method(),
        uri = %request.uri(),
    )
}
