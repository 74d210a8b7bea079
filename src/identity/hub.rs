//! Hub HTTP API client.
//!
//! # Responsibilities
//! - Relationship lookups (follows, reactions)
//! - Address and profile lookups
//! - Message signature validation
//!
//! Every call is bounded by the client timeout (`timeouts.hub_secs`).

use alloy::primitives::Address;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::HubConfig;
use crate::frame::CastId;
use crate::identity::types::{UserProfile, ValidatedAction, Validation};

/// Errors from a hub request.
#[derive(Debug, Error)]
pub enum HubError {
    #[error("hub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("hub returned {0}")]
    Status(u16),

    #[error("invalid hub configuration: {0}")]
    Config(String),

    #[error("message bytes are not valid hex: {0}")]
    MessageEncoding(String),
}

/// Reaction kinds as numbered by the hub API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactionKind {
    Like = 1,
    Recast = 2,
}

#[derive(Deserialize)]
struct MessagesResponse<T> {
    #[serde(default = "Vec::new")]
    messages: Vec<Message<T>>,
}

#[derive(Deserialize)]
struct Message<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerificationData {
    #[serde(alias = "verificationAddEthAddressBody")]
    verification_add_address_body: Option<VerificationBody>,
}

#[derive(Deserialize)]
struct VerificationBody {
    address: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDataData {
    user_data_body: Option<UserDataBody>,
}

#[derive(Deserialize)]
struct UserDataBody {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdRegistryEvent {
    id_register_event_body: Option<IdRegisterBody>,
}

#[derive(Deserialize)]
struct IdRegisterBody {
    to: Option<String>,
}

#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
    message: Option<Message<ValidatedData>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidatedData {
    fid: u64,
    frame_action_body: Option<FrameActionBody>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FrameActionBody {
    cast_id: Option<CastId>,
}

/// Client for one hub.
#[derive(Clone)]
pub struct HubClient {
    client: reqwest::Client,
    base_url: String,
}

impl HubClient {
    pub fn new(config: &HubConfig, timeout: Duration) -> Result<Self, HubError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| HubError::Config("api_key is not a valid header value".into()))?;
            headers.insert("api_key", value);
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    /// Whether `fid` follows `target_fid`.
    pub async fn follows(&self, fid: u64, target_fid: u64) -> Result<bool, HubError> {
        let query = [
            ("fid", fid.to_string()),
            ("target_fid", target_fid.to_string()),
            ("link_type", "follow".to_string()),
        ];
        self.exists("/v1/linkById", &query).await
    }

    /// Whether `fid` reacted to `cast` with `kind`.
    pub async fn reacted(&self, fid: u64, kind: ReactionKind, cast: &CastId) -> Result<bool, HubError> {
        let query = [
            ("fid", fid.to_string()),
            ("reaction_type", (kind as u8).to_string()),
            ("target_fid", cast.fid.to_string()),
            ("target_hash", cast.hash.clone()),
        ];
        self.exists("/v1/reactionById", &query).await
    }

    /// Verified Ethereum addresses of `fid`. Non-Ethereum entries are skipped.
    pub async fn verified_addresses(&self, fid: u64) -> Result<Vec<Address>, HubError> {
        let res: MessagesResponse<VerificationData> =
            self.get_json("/v1/verificationsByFid", &[("fid", fid.to_string())]).await?;
        Ok(res
            .messages
            .into_iter()
            .filter_map(|m| m.data.verification_add_address_body)
            .filter_map(|body| body.address.parse::<Address>().ok())
            .collect())
    }

    /// Custody address registered for `fid`, if the hub knows it.
    pub async fn custody_address(&self, fid: u64) -> Result<Option<Address>, HubError> {
        let res: IdRegistryEvent = self
            .get_json("/v1/onChainIdRegistryEventByFid", &[("fid", fid.to_string())])
            .await?;
        Ok(res
            .id_register_event_body
            .and_then(|body| body.to)
            .and_then(|to| to.parse::<Address>().ok())
            .filter(|a| !a.is_zero()))
    }

    /// Published profile of `fid`.
    pub async fn user_data(&self, fid: u64) -> Result<UserProfile, HubError> {
        let res: MessagesResponse<UserDataData> =
            self.get_json("/v1/userDataByFid", &[("fid", fid.to_string())]).await?;
        let mut profile = UserProfile::default();
        for body in res.messages.into_iter().filter_map(|m| m.data.user_data_body) {
            let slot = match body.kind.as_str() {
                "USER_DATA_TYPE_USERNAME" => &mut profile.username,
                "USER_DATA_TYPE_DISPLAY" => &mut profile.display_name,
                "USER_DATA_TYPE_BIO" => &mut profile.bio,
                "USER_DATA_TYPE_PFP" => &mut profile.pfp,
                "USER_DATA_TYPE_URL" => &mut profile.url,
                _ => continue,
            };
            *slot = Some(body.value);
        }
        Ok(profile)
    }

    /// Submit hex-encoded message bytes for signature validation.
    pub async fn validate_message(&self, message_bytes_hex: &str) -> Result<Validation, HubError> {
        let bytes = alloy::hex::decode(message_bytes_hex)
            .map_err(|e| HubError::MessageEncoding(e.to_string()))?;
        let res = self
            .client
            .post(format!("{}/v1/validateMessage", self.base_url))
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(HubError::Status(res.status().as_u16()));
        }
        let body: ValidateResponse = res.json().await?;
        match (body.valid, body.message) {
            (true, Some(message)) => Ok(Validation::Valid(ValidatedAction {
                fid: message.data.fid,
                cast_id: message.data.frame_action_body.and_then(|b| b.cast_id),
            })),
            _ => Ok(Validation::Invalid),
        }
    }

    /// 2xx means the record exists, 404 that it does not.
    async fn exists(&self, path: &str, query: &[(&str, String)]) -> Result<bool, HubError> {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        let status = res.status();
        if status.is_success() {
            Ok(true)
        } else if status == reqwest::StatusCode::NOT_FOUND {
            Ok(false)
        } else {
            Err(HubError::Status(status.as_u16()))
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, HubError> {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .query(query)
            .send()
            .await?;
        if !res.status().is_success() {
            return Err(HubError::Status(res.status().as_u16()));
        }
        Ok(res.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> HubClient {
        let config = HubConfig {
            url: server.uri(),
            api_key: Some("hub-key".into()),
        };
        HubClient::new(&config, Duration::from_secs(2)).unwrap()
    }

    #[tokio::test]
    async fn test_follows_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/linkById"))
            .and(query_param("fid", "1"))
            .and(header("api_key", "hub-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/linkById"))
            .and(query_param("fid", "2"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/linkById"))
            .and(query_param("fid", "3"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let hub = client(&server).await;
        assert!(hub.follows(1, 9).await.unwrap());
        assert!(!hub.follows(2, 9).await.unwrap());
        assert!(matches!(hub.follows(3, 9).await, Err(HubError::Status(503))));
    }

    #[tokio::test]
    async fn test_addresses_and_profile() {
        let server = MockServer::start().await;
        let verified = format!("{}", Address::repeat_byte(0x11));
        Mock::given(path("/v1/verificationsByFid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    { "data": { "verificationAddAddressBody": { "address": verified } } },
                    { "data": { "verificationAddAddressBody": { "address": "So1anaAddre55" } } },
                    { "data": { "verificationRemoveBody": {} } }
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(path("/v1/onChainIdRegistryEventByFid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "idRegisterEventBody": { "to": format!("{}", Address::repeat_byte(0x22)) }
            })))
            .mount(&server)
            .await;
        Mock::given(path("/v1/userDataByFid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messages": [
                    { "data": { "userDataBody": { "type": "USER_DATA_TYPE_USERNAME", "value": "alice" } } },
                    { "data": { "userDataBody": { "type": "USER_DATA_TYPE_PFP", "value": "https://i.png/a" } } },
                    { "data": { "userDataBody": { "type": "USER_DATA_TYPE_LOCATION", "value": "x" } } }
                ]
            })))
            .mount(&server)
            .await;

        let hub = client(&server).await;
        assert_eq!(hub.verified_addresses(7).await.unwrap(), vec![Address::repeat_byte(0x11)]);
        assert_eq!(hub.custody_address(7).await.unwrap(), Some(Address::repeat_byte(0x22)));
        let profile = hub.user_data(7).await.unwrap();
        assert_eq!(profile.username.as_deref(), Some("alice"));
        assert_eq!(profile.pfp.as_deref(), Some("https://i.png/a"));
        assert!(profile.bio.is_none());
    }

    #[tokio::test]
    async fn test_validate_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/validateMessage"))
            .and(header("content-type", "application/octet-stream"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "valid": true,
                "message": { "data": {
                    "fid": 2,
                    "frameActionBody": { "castId": { "fid": 226, "hash": "0xa48d" } }
                } }
            })))
            .mount(&server)
            .await;

        let hub = client(&server).await;
        let validation = hub.validate_message("0a0b0c").await.unwrap();
        assert_eq!(
            validation,
            Validation::Valid(ValidatedAction {
                fid: 2,
                cast_id: Some(CastId { fid: 226, hash: "0xa48d".into() }),
            })
        );
        assert!(matches!(hub.validate_message("zz").await, Err(HubError::MessageEncoding(_))));
    }
}
