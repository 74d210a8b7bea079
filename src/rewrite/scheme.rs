//! Proxy URL addressing, version 1.
//!
//! ```text
//! entry: {public_url}/a?v=1&r={context_id}
//! hop:   {public_url}/a?v=1&r={context_id}&n={target_id}
//! ```
//!
//! `r` names the context (origin frame and its attributes), `n` names the
//! mapping holding the true destination. A missing `v` reads as version 1;
//! any other version is rejected so in-flight URLs are never misread.

use thiserror::Error;
use url::form_urlencoded;
use url::Url;

/// The only addressing version this proxy emits or accepts.
pub const SCHEME_VERSION: &str = "1";

/// Path every proxy URL is served under.
pub const PROXY_PATH: &str = "/a";

/// Why a request's routing parameters are unusable.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("missing query parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("unsupported addressing version '{0}'")]
    UnsupportedVersion(String),
}

/// Routing parameters carried by a proxy URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    pub context_id: String,
    pub target_id: Option<String>,
}

impl ProxyRoute {
    /// Route to a context's entry document.
    pub fn entry(context_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            target_id: None,
        }
    }

    /// Route to a destination within a context.
    pub fn hop(context_id: impl Into<String>, target_id: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            target_id: Some(target_id.into()),
        }
    }

    /// Read routing parameters from a raw query string.
    pub fn from_query(query: Option<&str>) -> Result<Self, RouteError> {
        let mut version = None;
        let mut context_id = None;
        let mut target_id = None;

        for (key, value) in form_urlencoded::parse(query.unwrap_or("").as_bytes()) {
            let slot = match key.as_ref() {
                "v" => &mut version,
                "r" => &mut context_id,
                "n" => &mut target_id,
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }

        if let Some(v) = version {
            if v != SCHEME_VERSION {
                return Err(RouteError::UnsupportedVersion(v));
            }
        }

        Ok(Self {
            context_id: context_id.ok_or(RouteError::MissingParameter("r"))?,
            target_id,
        })
    }

    /// The destination id, required on action requests.
    pub fn require_target(&self) -> Result<&str, RouteError> {
        self.target_id.as_deref().ok_or(RouteError::MissingParameter("n"))
    }

    /// Absolute proxy URL under `public_url`.
    pub fn to_url(&self, public_url: &Url) -> Url {
        let mut url = public_url.clone();
        let path = format!("{}{}", public_url.path().trim_end_matches('/'), PROXY_PATH);
        url.set_path(&path);
        url.set_fragment(None);
        {
            let mut pairs = url.query_pairs_mut();
            pairs.clear();
            pairs.append_pair("v", SCHEME_VERSION);
            pairs.append_pair("r", &self.context_id);
            if let Some(target) = &self.target_id {
                pairs.append_pair("n", target);
            }
        }
        url
    }
}
