//! Action payload authenticity checks.

use async_trait::async_trait;

use crate::frame::ActionPayload;
use crate::identity::hub::{HubClient, HubError};
use crate::identity::types::Validation;

/// Verifies that an action payload was signed by the user it names.
#[async_trait]
pub trait MessageValidator: Send + Sync {
    async fn validate(&self, payload: &ActionPayload) -> Result<Validation, HubError>;
}

/// Delegates validation to the hub's `validateMessage` endpoint.
pub struct HubValidator {
    hub: HubClient,
}

impl HubValidator {
    pub fn new(hub: HubClient) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl MessageValidator for HubValidator {
    async fn validate(&self, payload: &ActionPayload) -> Result<Validation, HubError> {
        self.hub
            .validate_message(&payload.trusted_data.message_bytes)
            .await
    }
}
