//! Mapping proxy replies onto HTTP responses.
//!
//! - rewritten frame → 200, origin content type or HTML
//! - pass-through    → origin status, content type, and body
//! - redirect        → 302 with `Location`

use axum::http::header::{CONTENT_TYPE, LOCATION};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::proxy::ProxyReply;

const HTML: &str = "text/html; charset=utf-8";

impl IntoResponse for ProxyReply {
    fn into_response(self) -> Response {
        match self {
            ProxyReply::Frame { html, content_type } => {
                (StatusCode::OK, [(CONTENT_TYPE, header_or_html(content_type))], html).into_response()
            }
            ProxyReply::PassThrough(raw) => {
                let status = StatusCode::from_u16(raw.status).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, [(CONTENT_TYPE, header_or_html(raw.content_type))], raw.body).into_response()
            }
            ProxyReply::Redirect(location) => match HeaderValue::from_str(&location) {
                Ok(value) => (StatusCode::FOUND, [(LOCATION, value)], "Redirected").into_response(),
                Err(_) => {
                    tracing::error!(location = %location, "Redirect target is not a valid header value");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
                }
            },
        }
    }
}

fn header_or_html(content_type: Option<String>) -> HeaderValue {
    content_type
        .and_then(|ct| HeaderValue::from_str(&ct).ok())
        .unwrap_or_else(|| HeaderValue::from_static(HTML))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proxy::OriginResponse;
    use bytes::Bytes;

    #[test]
    fn test_frame_defaults_to_html() {
        let response = ProxyReply::Frame {
            html: "<html></html>".into(),
            content_type: None,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML);
    }

    #[test]
    fn test_pass_through_keeps_status_and_type() {
        let response = ProxyReply::PassThrough(OriginResponse {
            status: 404,
            content_type: Some("application/json".into()),
            location: None,
            body: Bytes::from_static(b"{}"),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_redirect() {
        let response = ProxyReply::Redirect("https://example.com/landing".into()).into_response();
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[LOCATION], "https://example.com/landing");
    }
}
