//! Outbound calls to origin frame servers.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_TYPE, LOCATION};
use reqwest::redirect::Policy;
use std::time::Duration;
use url::Url;

use crate::proxy::error::ProxyError;

/// A fully buffered origin response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginResponse {
    pub status: u16,
    pub content_type: Option<String>,
    /// `Location` resolved against the request URL, for 3xx answers.
    pub location: Option<String>,
    /// Body exactly as the origin sent it.
    pub body: Bytes,
}

impl OriginResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The body as text, or `None` when it is not UTF-8.
    pub fn text(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Target of an external redirect, if the origin answered with one.
    pub fn redirect_target(&self) -> Option<&str> {
        if (300..400).contains(&self.status) {
            self.location.as_deref()
        } else {
            None
        }
    }
}

/// HTTP client for origin frames. Entry fetches follow redirects; action
/// forwards do not, so a redirect answer can be handed back to the caller.
#[derive(Clone)]
pub struct OriginClient {
    fetch: reqwest::Client,
    forward: reqwest::Client,
    timeout_secs: u64,
}

impl OriginClient {
    pub fn new(timeout_secs: u64) -> Result<Self, ProxyError> {
        let timeout = Duration::from_secs(timeout_secs);
        let build = |policy: Policy| {
            reqwest::Client::builder()
                .timeout(timeout)
                .redirect(policy)
                .build()
                .map_err(|e| ProxyError::Upstream(format!("failed to build origin client: {}", e)))
        };
        Ok(Self {
            fetch: build(Policy::limited(10))?,
            forward: build(Policy::none())?,
            timeout_secs,
        })
    }

    /// GET the origin document at `url`.
    pub async fn fetch(&self, url: &str) -> Result<OriginResponse, ProxyError> {
        let request = self.fetch.get(url);
        self.send(url, request).await
    }

    /// POST an action body to `url`, keeping the caller's content type.
    pub async fn forward(
        &self,
        url: &str,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<OriginResponse, ProxyError> {
        let request = self
            .forward
            .post(url)
            .header(CONTENT_TYPE, content_type.unwrap_or("application/json"))
            .body(body);
        self.send(url, request).await
    }

    async fn send(&self, url: &str, request: reqwest::RequestBuilder) -> Result<OriginResponse, ProxyError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProxyError::upstream(e, self.timeout_secs))?;

        let status = response.status().as_u16();
        let content_type = header_value(response.headers(), CONTENT_TYPE);
        let location =
            header_value(response.headers(), LOCATION).and_then(|raw| resolve_location(url, &raw));

        let body = response
            .bytes()
            .await
            .map_err(|e| ProxyError::upstream(e, self.timeout_secs))?;

        tracing::debug!(target_url = %url, status, "Origin responded");
        Ok(OriginResponse {
            status,
            content_type,
            location,
            body,
        })
    }
}

fn header_value(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}

fn resolve_location(request_url: &str, location: &str) -> Option<String> {
    let base = Url::parse(request_url).ok()?;
    base.join(location).ok().map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_forward_keeps_redirects_visible() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/post"))
            .and(header("content-type", "application/json"))
            .and(body_string("{\"a\":1}"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", "/landing"))
            .mount(&server)
            .await;

        let client = OriginClient::new(5).unwrap();
        let url = format!("{}/api/post", server.uri());
        let response = client
            .forward(&url, Some("application/json"), b"{\"a\":1}".to_vec())
            .await
            .unwrap();
        assert_eq!(response.status, 302);
        assert_eq!(
            response.redirect_target(),
            Some(format!("{}/landing", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn test_fetch_follows_redirects() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let client = OriginClient::new(5).unwrap();
        let response = client.fetch(&format!("{}/old", server.uri())).await.unwrap();
        assert!(response.is_success());
        assert_eq!(response.text(), Some("<html></html>"));
        assert_eq!(response.content_type.as_deref(), Some("text/html"));
        assert!(response.redirect_target().is_none());
    }

    #[tokio::test]
    async fn test_binary_body_is_kept_verbatim() {
        let server = MockServer::start().await;
        let png = vec![0x89, b'P', b'N', b'G', 0xff, 0xd8, 0x00, 0xfe];
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(png.clone(), "image/png"))
            .mount(&server)
            .await;

        let client = OriginClient::new(5).unwrap();
        let response = client.forward(&server.uri(), None, Vec::new()).await.unwrap();
        assert_eq!(&response.body[..], &png[..]);
        assert_eq!(response.text(), None);
        assert_eq!(response.content_type.as_deref(), Some("image/png"));
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let client = OriginClient::new(1).unwrap();
        let err = client.forward(&server.uri(), None, Vec::new()).await.unwrap_err();
        assert!(matches!(err, ProxyError::UpstreamTimeout(1)));
    }
}
