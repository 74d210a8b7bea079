//! Top-level frame proxy: entry fetches, actions, and context registration.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::analytics::{Analytics, AnalyticsError, CaptureClient, Region};
use crate::config::ProxyConfig;
use crate::frame;
use crate::identity::{ChainError, CustodyRegistry, HubClient, HubError, HubValidator, IdentityResolver};
use crate::proxy::error::ProxyError;
use crate::proxy::forwarder::{ActionForwarder, ActionRequest};
use crate::proxy::origin::OriginClient;
use crate::proxy::ProxyReply;
use crate::rewrite::{LinkRewriter, ProxyRoute};
use crate::session::ButtonTracker;
use crate::store::{IdentifierStore, KvStore};

/// Failure to assemble the pipeline from configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid public_url '{0}'")]
    PublicUrl(String),

    #[error("hub client: {0}")]
    Hub(#[from] HubError),

    #[error("analytics client: {0}")]
    Analytics(#[from] AnalyticsError),

    #[error("custody registry: {0}")]
    Chain(#[from] ChainError),

    #[error("origin client: {0}")]
    Origin(#[from] ProxyError),
}

/// Wires identifier store, rewriter, tracker, identity, and forwarder together.
pub struct FrameProxy {
    ids: IdentifierStore,
    rewriter: LinkRewriter,
    tracker: ButtonTracker,
    origin: OriginClient,
    forwarder: ActionForwarder,
    redirect_browsers: bool,
}

impl FrameProxy {
    /// Build the pipeline over `store`. The store outlives any one pipeline.
    pub fn from_config(config: &ProxyConfig, store: Arc<dyn KvStore>) -> Result<Self, PipelineError> {
        let public_url = Url::parse(&config.proxy.public_url)
            .map_err(|_| PipelineError::PublicUrl(config.proxy.public_url.clone()))?;

        let sink = CaptureClient::new(&config.analytics, Duration::from_secs(config.timeouts.analytics_secs))?;
        let analytics = Analytics::new(Arc::new(sink), &config.analytics);

        let identity = if config.identity.enabled {
            let hub = HubClient::new(&config.hub, Duration::from_secs(config.timeouts.hub_secs))?;
            let custody = if config.chain.enabled {
                Some(CustodyRegistry::new(&config.chain)?)
            } else {
                None
            };
            Some(Arc::new(IdentityResolver::new(
                Arc::new(HubValidator::new(hub.clone())),
                hub,
                custody,
                store.clone(),
                analytics.clone(),
            )))
        } else {
            None
        };

        Ok(Self::new(
            store,
            public_url,
            identity,
            analytics,
            OriginClient::new(config.timeouts.origin_secs)?,
            config.proxy.redirect_browsers,
        ))
    }

    pub fn new(
        store: Arc<dyn KvStore>,
        public_url: Url,
        identity: Option<Arc<IdentityResolver>>,
        analytics: Analytics,
        origin: OriginClient,
        redirect_browsers: bool,
    ) -> Self {
        let ids = IdentifierStore::new(store.clone());
        let tracker = ButtonTracker::new(store);
        let rewriter = LinkRewriter::new(ids.clone(), public_url);
        let forwarder = ActionForwarder::new(
            ids.clone(),
            rewriter.clone(),
            tracker.clone(),
            identity,
            analytics,
            origin.clone(),
        );
        Self {
            ids,
            rewriter,
            tracker,
            origin,
            forwarder,
            redirect_browsers,
        }
    }

    /// Register an origin frame and return its entry proxy URL.
    pub async fn register(
        &self,
        url: &str,
        api_key: Option<&str>,
        region: Region,
    ) -> Result<String, ProxyError> {
        match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(ProxyError::InvalidTarget(url.to_string())),
        }
        let context_id = self.ids.register_context(url, api_key, region).await?;
        tracing::info!(context_id = %context_id, origin = %url, "Context registered");
        Ok(self.rewriter.entry_url(&context_id))
    }

    /// GET flow: fetch the origin frame, rewrite it, and seed the session.
    pub async fn serve_entry(&self, query: Option<&str>) -> Result<ProxyReply, ProxyError> {
        let route = ProxyRoute::from_query(query)?;
        let context_id = route.context_id;
        let origin_url = self
            .ids
            .resolve(&context_id)
            .await?
            .ok_or_else(|| ProxyError::UnresolvedMapping(context_id.clone()))?;

        let response = self.origin.fetch(&origin_url).await?;
        if !response.is_success() {
            return Ok(ProxyReply::PassThrough(response));
        }
        let Some(html) = response.text() else {
            tracing::debug!(context_id = %context_id, "Origin body is not UTF-8, passing through");
            return Ok(ProxyReply::PassThrough(response));
        };
        let parsed = match frame::parse(html, &origin_url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(context_id = %context_id, error = %e, "Origin is not a frame, passing through");
                return Ok(ProxyReply::PassThrough(response));
            }
        };

        let rewritten = self.rewriter.rewrite_entry(&parsed, &context_id).await?;
        self.seed_session(&context_id, &rewritten).await;

        let mut html = frame::serialize(&rewritten);
        if self.redirect_browsers {
            html = frame::with_browser_redirect(&html, &origin_url);
        }
        tracing::debug!(context_id = %context_id, buttons = rewritten.buttons.len(), "Served entry frame");
        Ok(ProxyReply::Frame {
            html,
            content_type: None,
        })
    }

    /// POST flow.
    pub async fn handle_action(&self, request: ActionRequest<'_>) -> Result<ProxyReply, ProxyError> {
        self.forwarder.handle(request).await
    }

    async fn seed_session(&self, context_id: &str, rewritten: &frame::Frame) {
        if let Err(e) = self.tracker.record_entry(context_id, &rewritten.buttons).await {
            tracing::warn!(context_id, error = %e, "Failed to record entry buttons");
        }
        let marker = Url::parse(&rewritten.post_url)
            .ok()
            .and_then(|u| u.query().map(str::to_string));
        if let Some(marker) = marker {
            if let Err(e) = self.tracker.set_first_frame_marker(context_id, &marker).await {
                tracing::warn!(context_id, error = %e, "Failed to store first frame marker");
            }
        }
    }
}
