//! Inbound action handling.
//!
//! # States
//! ```text
//! RECEIVE_INBOUND ─▶ RESOLVE_TARGET ─▶ FORWARD ─▶ CLASSIFY_RESPONSE
//!                                                    ├─▶ REWRITE_AND_RETURN
//!                                                    ├─▶ PASSTHROUGH_REDIRECT
//!                                                    └─▶ pass-through of the raw body
//! ```
//!
//! Session reset happens between RESOLVE_TARGET and FORWARD. Identity
//! resolution runs after FORWARD and never changes the outcome.

use std::sync::Arc;

use crate::analytics::{Analytics, AnalyticsRoute, Event, Interaction};
use crate::frame::{self, ActionPayload, Frame};
use crate::identity::IdentityResolver;
use crate::proxy::error::ProxyError;
use crate::proxy::origin::{OriginClient, OriginResponse};
use crate::proxy::ProxyReply;
use crate::rewrite::{LinkRewriter, ProxyRoute};
use crate::session::ButtonTracker;
use crate::store::IdentifierStore;

/// An action request as received from the caller.
#[derive(Debug, Clone, Copy)]
pub struct ActionRequest<'a> {
    /// Raw query string, without the leading `?`.
    pub query: Option<&'a str>,
    pub content_type: Option<&'a str>,
    pub body: &'a [u8],
}

/// Everything known about where an action goes.
#[derive(Debug, Clone)]
struct ResolvedTarget {
    context_id: String,
    destination: String,
    og_post_url: String,
    analytics: Option<AnalyticsRoute>,
    first_frame_marker: Option<String>,
}

enum Classified {
    ExternalRedirect(String),
    Document(Frame, OriginResponse),
    PassThrough(OriginResponse),
}

/// Drives one action through the forwarding state machine.
pub struct ActionForwarder {
    ids: IdentifierStore,
    rewriter: LinkRewriter,
    tracker: ButtonTracker,
    identity: Option<Arc<IdentityResolver>>,
    analytics: Analytics,
    origin: OriginClient,
}

impl ActionForwarder {
    pub fn new(
        ids: IdentifierStore,
        rewriter: LinkRewriter,
        tracker: ButtonTracker,
        identity: Option<Arc<IdentityResolver>>,
        analytics: Analytics,
        origin: OriginClient,
    ) -> Self {
        Self {
            ids,
            rewriter,
            tracker,
            identity,
            analytics,
            origin,
        }
    }

    pub async fn handle(&self, request: ActionRequest<'_>) -> Result<ProxyReply, ProxyError> {
        // RECEIVE_INBOUND
        let route = ProxyRoute::from_query(request.query)?;
        let target_id = route.require_target()?.to_string();
        let payload = ActionPayload::from_slice(request.body)?;
        let fid = payload.fid();

        // RESOLVE_TARGET
        let target = self.resolve_target(&route.context_id, &target_id).await?;
        tracing::debug!(
            context_id = %target.context_id,
            fid,
            target = %target.destination,
            "Forwarding action"
        );

        if target.first_frame_marker.is_some() && target.first_frame_marker.as_deref() == request.query {
            self.reset_session(&target.context_id, fid).await;
        }

        // FORWARD
        let response = self
            .origin
            .forward(&target.destination, request.content_type, request.body.to_vec())
            .await?;

        self.identify(&payload, target.analytics.as_ref()).await;

        // CLASSIFY_RESPONSE
        match classify(response, &target.destination) {
            Classified::ExternalRedirect(location) => {
                let label = self.pressed_label(&target, &payload).await;
                let interaction = interaction(&payload, &target, label.as_deref());
                self.analytics
                    .emit(target.analytics.as_ref(), Event::link_click(&interaction, &location))
                    .await;
                tracing::info!(context_id = %target.context_id, fid, location = %location, "External redirect");
                Ok(ProxyReply::Redirect(location))
            }
            Classified::PassThrough(response) => {
                tracing::debug!(
                    context_id = %target.context_id,
                    status = response.status,
                    "Origin answer is not a frame, passing through"
                );
                Ok(ProxyReply::PassThrough(response))
            }
            Classified::Document(parsed, response) => {
                self.rewrite_and_return(&target, &payload, parsed, response).await
            }
        }
    }

    async fn resolve_target(&self, context_id: &str, target_id: &str) -> Result<ResolvedTarget, ProxyError> {
        let destination = self
            .ids
            .resolve(target_id)
            .await?
            .ok_or_else(|| ProxyError::UnresolvedMapping(target_id.to_string()))?;
        let og_post_url = self
            .ids
            .resolve(context_id)
            .await?
            .ok_or_else(|| ProxyError::UnresolvedMapping(context_id.to_string()))?;
        let attributes = self.ids.context_attributes(context_id).await?;

        let first_frame_marker = match self.tracker.first_frame_marker(context_id).await {
            Ok(marker) => marker,
            Err(e) => {
                tracing::warn!(context_id, error = %e, "First frame marker unavailable");
                None
            }
        };

        Ok(ResolvedTarget {
            context_id: context_id.to_string(),
            destination,
            og_post_url,
            analytics: self.analytics.route_for(&attributes),
            first_frame_marker,
        })
    }

    async fn reset_session(&self, context_id: &str, fid: u64) {
        match self.tracker.reset(context_id, fid).await {
            Ok(()) => tracing::debug!(context_id, fid, "Back at the entry frame, session reset"),
            Err(e) => tracing::warn!(context_id, fid, error = %e, "Session reset failed"),
        }
    }

    async fn identify(&self, payload: &ActionPayload, route: Option<&AnalyticsRoute>) {
        let Some(identity) = &self.identity else {
            return;
        };
        if let Err(e) = identity.ensure_identified(payload, route).await {
            tracing::warn!(fid = payload.fid(), error = %e, "Identity resolution failed");
        }
    }

    async fn rewrite_and_return(
        &self,
        target: &ResolvedTarget,
        payload: &ActionPayload,
        parsed: Frame,
        response: OriginResponse,
    ) -> Result<ProxyReply, ProxyError> {
        let fid = payload.fid();
        let rewritten = self.rewriter.rewrite(&parsed, &target.context_id).await?;

        // Attribution reads the snapshot served before this answer.
        let label = self.pressed_label(target, payload).await;
        let interaction = interaction(payload, target, label.as_deref());
        self.analytics
            .emit(target.analytics.as_ref(), Event::frame_click(&interaction))
            .await;

        if let Err(e) = self.tracker.record(&target.context_id, fid, &rewritten.buttons).await {
            tracing::warn!(context_id = %target.context_id, fid, error = %e, "Failed to record buttons");
        }

        Ok(ProxyReply::Frame {
            html: frame::serialize(&rewritten),
            content_type: response.content_type,
        })
    }

    async fn pressed_label(&self, target: &ResolvedTarget, payload: &ActionPayload) -> Option<String> {
        match self
            .tracker
            .pressed_label(&target.context_id, payload.fid(), payload.button_index())
            .await
        {
            Ok(label) => label,
            Err(e) => {
                tracing::warn!(context_id = %target.context_id, error = %e, "Button snapshot unavailable");
                None
            }
        }
    }
}

fn classify(response: OriginResponse, destination: &str) -> Classified {
    if let Some(location) = response.redirect_target() {
        return Classified::ExternalRedirect(location.to_string());
    }
    if !response.is_success() {
        return Classified::PassThrough(response);
    }
    let Some(html) = response.text() else {
        tracing::debug!(target = %destination, "Origin answer is not UTF-8");
        return Classified::PassThrough(response);
    };
    match frame::parse(html, destination) {
        Ok(parsed) => Classified::Document(parsed, response),
        Err(e) => {
            tracing::debug!(target = %destination, error = %e, "Origin answer did not parse as a frame");
            Classified::PassThrough(response)
        }
    }
}

fn interaction<'a>(
    payload: &'a ActionPayload,
    target: &'a ResolvedTarget,
    label: Option<&'a str>,
) -> Interaction<'a> {
    let data = &payload.untrusted_data;
    Interaction {
        fid: data.fid,
        cast_hash: &data.cast_id.hash,
        button_index: data.button_index,
        button_label: label,
        post_url: &target.destination,
        og_post_url: &target.og_post_url,
        input_text: data.input_text.as_deref(),
    }
}
