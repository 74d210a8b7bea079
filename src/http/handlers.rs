//! Request handlers for the proxy, wrap and health routes.

use axum::{
    body::Bytes,
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::time::Instant;

use crate::analytics::Region;
use crate::http::request::request_id;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::proxy::{ActionRequest, ProxyError};

/// Body of `POST /api/frames`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrapRequest {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub region: Option<String>,
}

/// `/a`: GET serves an entry frame, POST forwards an action.
pub async fn proxy_handler(
    State(state): State<AppState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let inner = state.inner.load_full();
    let query = uri.query();

    let (flow, result) = match method {
        Method::GET | Method::HEAD => ("entry", inner.proxy.serve_entry(query).await),
        Method::POST => {
            let request = ActionRequest {
                query,
                content_type: headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()),
                body: &body,
            };
            ("action", inner.proxy.handle_action(request).await)
        }
        _ => return StatusCode::METHOD_NOT_ALLOWED.into_response(),
    };

    let response = match result {
        Ok(reply) => reply.into_response(),
        Err(e) => {
            tracing::debug!(request_id = %request_id(&headers), flow, "Proxy flow failed");
            e.into_response()
        }
    };
    metrics::record_request(flow, response.status().as_u16(), start);
    response
}

/// `POST /api/frames`: register an origin frame, answer with its entry URL.
pub async fn wrap_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let start = Instant::now();
    let response = match serde_json::from_slice::<WrapRequest>(&body) {
        Ok(request) => wrap(&state, request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed wrap request");
            (StatusCode::BAD_REQUEST, "Invalid request body").into_response()
        }
    };
    metrics::record_request("wrap", response.status().as_u16(), start);
    response
}

async fn wrap(state: &AppState, request: WrapRequest) -> Response {
    let Some(url) = request.url.filter(|u| !u.trim().is_empty()) else {
        return ProxyError::MissingParameter("url").into_response();
    };
    let region = request
        .region
        .as_deref()
        .map(Region::from_stored)
        .unwrap_or_default();

    let inner = state.inner.load_full();
    match inner.proxy.register(url.trim(), request.api_key.as_deref(), region).await {
        Ok(entry_url) => (
            StatusCode::OK,
            [(CONTENT_TYPE, "text/plain; charset=utf-8")],
            entry_url,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn health_handler() -> &'static str {
    "ok"
}
