//! Identity context types.

use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::frame::CastId;

/// Profile fields published by a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub pfp: Option<String>,
    pub url: Option<String>,
}

/// Everything learned about a requester from the hub.
///
/// `None` flags mean the corresponding lookup failed, not that the
/// relationship is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubContext {
    pub requester_follows_caster: Option<bool>,
    pub caster_follows_requester: Option<bool>,
    pub liked_cast: Option<bool>,
    pub recasted_cast: Option<bool>,
    pub requester_verified_addresses: Vec<Address>,
    pub requester_custody_address: Option<Address>,
    pub requester_user_data: UserProfile,
}

impl HubContext {
    /// The only verified address, when there is exactly one.
    pub fn single_verified_address(&self) -> Option<Address> {
        match self.requester_verified_addresses.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    /// Traits attached to the user by the identify event.
    pub fn identify_traits(&self) -> Map<String, Value> {
        let mut traits = Map::new();
        let verified: Vec<String> = self
            .requester_verified_addresses
            .iter()
            .map(|a| a.to_string())
            .collect();
        traits.insert(
            "verifiedAddresses".into(),
            Value::from(serde_json::to_string(&verified).unwrap_or_else(|_| "[]".into())),
        );
        traits.insert(
            "custodyAddress".into(),
            Value::from(self.requester_custody_address.map(|a| a.to_string()).unwrap_or_default()),
        );
        traits.insert(
            "verifiedAddress".into(),
            Value::from(self.single_verified_address().map(|a| a.to_string()).unwrap_or_default()),
        );

        let profile = &self.requester_user_data;
        if let Some(username) = &profile.username {
            traits.insert("warpcastUrl".into(), Value::from(format!("https://warpcast.com/{}", username)));
        }
        let fields = [
            ("username", &profile.username),
            ("displayName", &profile.display_name),
            ("bio", &profile.bio),
            ("pfp", &profile.pfp),
            ("url", &profile.url),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                traits.insert(key.into(), Value::from(value.as_str()));
            }
        }
        traits
    }
}

/// Result of checking an action payload's signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Valid(ValidatedAction),
    Invalid,
}

/// Fields taken from a validated message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAction {
    pub fid: u64,
    pub cast_id: Option<CastId>,
}
