//! One-time identity resolution per user.
//!
//! # Flow
//! ```text
//! cached hub:{fid}? ── yes ──▶ done
//!        │ no
//! validate signature ── invalid ──▶ log, done
//!        │ valid
//! fan out: follows ×2, reactions ×2, verifications, custody, profile
//!        │ (each branch degrades on its own)
//! join ──▶ store hub:{fid} ──▶ emit $identify
//! ```

use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::analytics::{Analytics, AnalyticsRoute, Event};
use crate::frame::{ActionPayload, CastId};
use crate::identity::custody::CustodyRegistry;
use crate::identity::hub::{HubClient, HubError, ReactionKind};
use crate::identity::types::{HubContext, Validation};
use crate::identity::validator::MessageValidator;
use crate::observability::metrics;
use crate::store::{KvStore, StoreError};

/// Identity resolution failure. Logged by the caller, never fatal.
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("signature validation failed: {0}")]
    Validation(#[from] HubError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What `ensure_identified` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityOutcome {
    AlreadyKnown,
    /// Signature invalid or signed by a different user.
    Rejected,
    /// Valid message without a cast reference; nothing to relate to.
    NoCast,
    Identified(HubContext),
}

/// Fetches and memoizes hub context, emitting one identify event per user.
pub struct IdentityResolver {
    validator: Arc<dyn MessageValidator>,
    hub: HubClient,
    custody: Option<CustodyRegistry>,
    store: Arc<dyn KvStore>,
    analytics: Analytics,
}

impl IdentityResolver {
    pub fn new(
        validator: Arc<dyn MessageValidator>,
        hub: HubClient,
        custody: Option<CustodyRegistry>,
        store: Arc<dyn KvStore>,
        analytics: Analytics,
    ) -> Self {
        Self {
            validator,
            hub,
            custody,
            store,
            analytics,
        }
    }

    pub async fn ensure_identified(
        &self,
        payload: &ActionPayload,
        route: Option<&AnalyticsRoute>,
    ) -> Result<IdentityOutcome, IdentityError> {
        let fid = payload.fid();
        if self.store.get(&cache_key(fid)).await?.is_some() {
            return Ok(IdentityOutcome::AlreadyKnown);
        }

        let validated = match self.validator.validate(payload).await? {
            Validation::Valid(v) if v.fid == fid => v,
            Validation::Valid(v) => {
                tracing::warn!(fid, signed_fid = v.fid, "Action payload signed by a different user");
                return Ok(IdentityOutcome::Rejected);
            }
            Validation::Invalid => {
                tracing::warn!(fid, "Invalid frame action signature");
                return Ok(IdentityOutcome::Rejected);
            }
        };

        let Some(cast) = validated.cast_id else {
            return Ok(IdentityOutcome::NoCast);
        };

        let context = self.fetch_context(fid, &cast).await;
        let json = serde_json::to_string(&context).map_err(|e| StoreError::Corrupt {
            key: cache_key(fid),
            reason: e.to_string(),
        })?;
        self.store.put(&cache_key(fid), &json).await?;

        tracing::info!(fid, "User identified");
        self.analytics
            .emit(route, Event::identify(fid, context.identify_traits()))
            .await;

        Ok(IdentityOutcome::Identified(context))
    }

    /// Cached context for `fid`, if any.
    pub async fn cached_context(&self, fid: u64) -> Result<Option<HubContext>, StoreError> {
        let Some(raw) = self.store.get(&cache_key(fid)).await? else {
            return Ok(None);
        };
        serde_json::from_str(&raw).map(Some).map_err(|e| StoreError::Corrupt {
            key: cache_key(fid),
            reason: e.to_string(),
        })
    }

    /// Query every sub-source concurrently; a failed branch only blanks its field.
    pub async fn fetch_context(&self, fid: u64, cast: &CastId) -> HubContext {
        let (follows, followed_by, liked, recasted, verified, custody, profile) = tokio::join!(
            settle("follows_caster", self.hub.follows(fid, cast.fid)),
            settle("caster_follows", self.hub.follows(cast.fid, fid)),
            settle("liked", self.hub.reacted(fid, ReactionKind::Like, cast)),
            settle("recasted", self.hub.reacted(fid, ReactionKind::Recast, cast)),
            settle("verifications", self.hub.verified_addresses(fid)),
            self.custody_address(fid),
            settle("profile", self.hub.user_data(fid)),
        );

        // A caster interacting with their own cast counts as following.
        let own_cast = fid == cast.fid;
        HubContext {
            requester_follows_caster: if own_cast { Some(true) } else { follows },
            caster_follows_requester: if own_cast { Some(true) } else { followed_by },
            liked_cast: liked,
            recasted_cast: recasted,
            requester_verified_addresses: verified.unwrap_or_default(),
            requester_custody_address: custody,
            requester_user_data: profile.unwrap_or_default(),
        }
    }

    async fn custody_address(&self, fid: u64) -> Option<alloy::primitives::Address> {
        if let Some(address) = settle("custody", self.hub.custody_address(fid)).await.flatten() {
            return Some(address);
        }
        let registry = self.custody.as_ref()?;
        match registry.custody_of(fid).await {
            Ok(address) => address,
            Err(e) => {
                tracing::warn!(fid, error = %e, "On-chain custody lookup failed");
                None
            }
        }
    }
}

async fn settle<T>(branch: &'static str, fut: impl Future<Output = Result<T, HubError>>) -> Option<T> {
    match fut.await {
        Ok(value) => {
            metrics::record_hub_fetch(branch, "ok");
            Some(value)
        }
        Err(e) => {
            tracing::warn!(branch, error = %e, "Hub lookup failed, field left empty");
            metrics::record_hub_fetch(branch, "failed");
            None
        }
    }
}

fn cache_key(fid: u64) -> String {
    format!("hub:{}", fid)
}
