//! Event delivery to the analytics ingestion endpoint.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::analytics::events::{Event, Region};
use crate::config::AnalyticsConfig;
use crate::observability::metrics;
use crate::store::ids::ContextAttributes;

/// Event emission failure. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("analytics request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("analytics endpoint returned {0}")]
    Status(u16),
}

/// Where and as whom an event is captured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsRoute {
    pub api_key: String,
    pub region: Region,
}

/// Destination for analytics events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn capture(&self, route: &AnalyticsRoute, event: &Event) -> Result<(), AnalyticsError>;
}

#[derive(Serialize)]
struct CaptureBody<'a> {
    api_key: &'a str,
    event: &'a str,
    distinct_id: &'a str,
    properties: &'a Map<String, Value>,
    uuid: Uuid,
}

/// Sends events to a PostHog-compatible `/capture/` endpoint.
pub struct CaptureClient {
    client: reqwest::Client,
    us_endpoint: String,
    eu_endpoint: String,
}

impl CaptureClient {
    pub fn new(config: &AnalyticsConfig, timeout: Duration) -> Result<Self, AnalyticsError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            us_endpoint: config.us_endpoint.trim_end_matches('/').to_string(),
            eu_endpoint: config.eu_endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, region: Region) -> &str {
        match region {
            Region::Us => &self.us_endpoint,
            Region::Eu => &self.eu_endpoint,
        }
    }
}

#[async_trait]
impl EventSink for CaptureClient {
    async fn capture(&self, route: &AnalyticsRoute, event: &Event) -> Result<(), AnalyticsError> {
        let body = CaptureBody {
            api_key: &route.api_key,
            event: &event.event,
            distinct_id: &event.distinct_id,
            properties: &event.properties,
            uuid: Uuid::new_v4(),
        };
        let res = self
            .client
            .post(format!("{}/capture/", self.endpoint(route.region)))
            .json(&body)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(AnalyticsError::Status(res.status().as_u16()));
        }
        Ok(())
    }
}

/// Best-effort emission with key resolution.
#[derive(Clone)]
pub struct Analytics {
    sink: Arc<dyn EventSink>,
    enabled: bool,
    default_api_key: Option<String>,
}

impl Analytics {
    pub fn new(sink: Arc<dyn EventSink>, config: &AnalyticsConfig) -> Self {
        Self {
            sink,
            enabled: config.enabled,
            default_api_key: config.default_api_key.clone(),
        }
    }

    /// Route for a context, or `None` when no API key is available.
    pub fn route_for(&self, attributes: &ContextAttributes) -> Option<AnalyticsRoute> {
        if !self.enabled {
            return None;
        }
        let api_key = attributes.api_key.clone().or_else(|| self.default_api_key.clone())?;
        Some(AnalyticsRoute {
            api_key,
            region: attributes.region,
        })
    }

    /// Capture `event`; failures are logged and swallowed.
    pub async fn emit(&self, route: Option<&AnalyticsRoute>, event: Event) {
        let Some(route) = route else {
            tracing::debug!(event = %event.event, "No analytics key for context, event skipped");
            metrics::record_event(&event.event, "skipped");
            return;
        };
        match self.sink.capture(route, &event).await {
            Ok(()) => {
                tracing::debug!(event = %event.event, distinct_id = %event.distinct_id, "Event captured");
                metrics::record_event(&event.event, "sent");
            }
            Err(e) => {
                tracing::warn!(event = %event.event, error = %e, "Event emission failed");
                metrics::record_event(&event.event, "failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::testing::RecordingSink;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(endpoint: &str) -> AnalyticsConfig {
        AnalyticsConfig {
            enabled: true,
            us_endpoint: endpoint.to_string(),
            eu_endpoint: "http://127.0.0.1:9".to_string(),
            default_api_key: None,
        }
    }

    #[tokio::test]
    async fn test_capture_posts_to_region_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/capture/"))
            .and(body_partial_json(serde_json::json!({
                "api_key": "phc_key",
                "event": "$identify",
                "distinct_id": "42",
                "properties": { "$set": { "username": "alice" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": 1})))
            .expect(1)
            .mount(&server)
            .await;

        let client = CaptureClient::new(&config(&server.uri()), Duration::from_secs(2)).unwrap();
        let mut traits = Map::new();
        traits.insert("username".into(), Value::from("alice"));
        let route = AnalyticsRoute { api_key: "phc_key".into(), region: Region::Us };

        client.capture(&route, &Event::identify(42, traits)).await.unwrap();
    }

    #[tokio::test]
    async fn test_capture_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = CaptureClient::new(&config(&server.uri()), Duration::from_secs(2)).unwrap();
        let route = AnalyticsRoute { api_key: "bad".into(), region: Region::Us };
        let err = client.capture(&route, &Event::identify(1, Map::new())).await.unwrap_err();
        assert!(matches!(err, AnalyticsError::Status(401)));
    }

    #[test]
    fn test_route_prefers_context_key() {
        let mut cfg = config("http://localhost");
        cfg.default_api_key = Some("fallback".into());
        let analytics = Analytics::new(Arc::new(RecordingSink::default()), &cfg);

        let with_key = ContextAttributes { api_key: Some("own".into()), region: Region::Us };
        assert_eq!(analytics.route_for(&with_key).unwrap().api_key, "own");

        let without = ContextAttributes { api_key: None, region: Region::Eu };
        let route = analytics.route_for(&without).unwrap();
        assert_eq!(route.api_key, "fallback");
        assert_eq!(route.region, Region::Eu);

        cfg.default_api_key = None;
        let analytics = Analytics::new(Arc::new(RecordingSink::default()), &cfg);
        assert!(analytics.route_for(&without).is_none());

        cfg.enabled = false;
        let analytics = Analytics::new(Arc::new(RecordingSink::default()), &cfg);
        assert!(analytics.route_for(&with_key).is_none());
    }

    #[tokio::test]
    async fn test_emit_swallows_failures() {
        let sink = Arc::new(RecordingSink::failing());
        let analytics = Analytics::new(sink.clone(), &config("http://localhost"));
        let route = AnalyticsRoute { api_key: "k".into(), region: Region::Eu };

        analytics.emit(Some(&route), Event::identify(1, Map::new())).await;
        analytics.emit(None, Event::identify(2, Map::new())).await;
        assert_eq!(sink.events().len(), 1);
    }
}
