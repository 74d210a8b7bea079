//! Caller-visible failures of the proxy pipeline.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::rewrite::RouteError;
use crate::store::StoreError;

/// Terminal errors of the entry and action flows.
///
/// Parse failures and non-success upstream statuses are not errors: those
/// responses are passed through untouched.
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("missing routing parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("unsupported addressing scheme version '{0}'")]
    UnsupportedScheme(String),

    #[error("not an absolute http(s) URL: '{0}'")]
    InvalidTarget(String),

    #[error("no mapping for id '{0}'")]
    UnresolvedMapping(String),

    #[error("malformed action payload: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("upstream did not answer within {0} seconds")]
    UpstreamTimeout(u64),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MissingParameter(_)
            | ProxyError::UnsupportedScheme(_)
            | ProxyError::InvalidTarget(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classify a reqwest failure against `timeout_secs`.
    pub fn upstream(err: reqwest::Error, timeout_secs: u64) -> Self {
        if err.is_timeout() {
            ProxyError::UpstreamTimeout(timeout_secs)
        } else {
            ProxyError::Upstream(err.to_string())
        }
    }
}

impl From<RouteError> for ProxyError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::MissingParameter(name) => ProxyError::MissingParameter(name),
            RouteError::UnsupportedVersion(v) => ProxyError::UnsupportedScheme(v),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::warn!(error = %self, "Rejected request");
        }
        let body = if status == StatusCode::BAD_REQUEST {
            "Invalid URL"
        } else {
            "Internal Server Error"
        };
        (status, body).into_response()
    }
}
