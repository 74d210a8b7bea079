//! Signed action envelope posted by frame clients.

use serde::{Deserialize, Serialize};

/// Reference to the cast a frame was embedded in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastId {
    pub fid: u64,
    pub hash: String,
}

/// Client-reported fields. Only trustworthy after signature validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UntrustedData {
    pub fid: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub message_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<u64>,
    #[serde(default)]
    pub network: Option<u32>,
    /// 1-based index of the pressed button.
    pub button_index: u32,
    #[serde(default)]
    pub input_text: Option<String>,
    pub cast_id: CastId,
    #[serde(default)]
    pub state: Option<String>,
}

/// Serialized, signed protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustedData {
    /// Hex-encoded message bytes.
    pub message_bytes: String,
}

/// The JSON body of a frame action request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    pub untrusted_data: UntrustedData,
    pub trusted_data: TrustedData,
}

impl ActionPayload {
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn fid(&self) -> u64 {
        self.untrusted_data.fid
    }

    pub fn button_index(&self) -> u32 {
        self.untrusted_data.button_index
    }
}
