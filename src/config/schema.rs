//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the frame proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Public addressing of the proxy and request limits.
    pub proxy: FrameProxySettings,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Key-value store settings.
    pub store: StoreConfig,

    /// Hub service used for signature validation and identity context.
    pub hub: HubConfig,

    /// Optional on-chain custody lookups.
    pub chain: ChainConfig,

    /// Analytics ingestion settings.
    pub analytics: AnalyticsConfig,

    /// Identity resolution settings.
    pub identity: IdentityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// How the proxy addresses itself in rewritten documents.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FrameProxySettings {
    /// Externally reachable origin of this proxy (e.g., "https://frames.example.com").
    pub public_url: String,

    /// Insert a script into entry documents that sends browsers to the origin frame.
    pub redirect_browsers: bool,

    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for FrameProxySettings {
    fn default() -> Self {
        Self {
            public_url: "http://localhost:8080".to_string(),
            redirect_browsers: true,
            max_body_bytes: 256 * 1024,
        }
    }
}

/// Timeout configuration for the inbound request and every outbound call.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total inbound request timeout in seconds.
    pub request_secs: u64,

    /// Origin fetch/forward timeout in seconds. Expiry fails the request.
    pub origin_secs: u64,

    /// Hub call timeout in seconds. Expiry degrades identity context.
    pub hub_secs: u64,

    /// Analytics call timeout in seconds. Expiry drops the event.
    pub analytics_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            origin_secs: 10,
            hub_secs: 5,
            analytics_secs: 5,
        }
    }
}

/// Key-value store configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot loaded at startup and written at shutdown.
    pub persistence_path: Option<String>,
}

/// Hub service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HubConfig {
    /// Base URL of the hub HTTP API.
    pub url: String,

    /// API key sent as the `api_key` header. Prefer `FRAME_PROXY_HUB_API_KEY`.
    pub api_key: Option<String>,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            url: "https://nemes.farcaster.xyz:2281".to_string(),
            api_key: None,
        }
    }
}

/// On-chain custody lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChainConfig {
    /// Enable the IdRegistry fallback for custody addresses.
    pub enabled: bool,

    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// IdRegistry contract address.
    pub id_registry_address: String,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rpc_url: "https://mainnet.optimism.io".to_string(),
            id_registry_address: "0x00000000fc6c5f01fc30151999387bb99a9f489b".to_string(),
            rpc_timeout_secs: 5,
        }
    }
}

/// Analytics ingestion configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Emit events at all.
    pub enabled: bool,

    /// Ingestion endpoint for contexts registered in the `us` region.
    pub us_endpoint: String,

    /// Ingestion endpoint for every other context.
    pub eu_endpoint: String,

    /// Key used when a context carries none. Prefer `FRAME_PROXY_ANALYTICS_API_KEY`.
    pub default_api_key: Option<String>,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            us_endpoint: "https://us.i.posthog.com".to_string(),
            eu_endpoint: "https://eu.i.posthog.com".to_string(),
            default_api_key: None,
        }
    }
}

/// Identity resolution configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Validate action payloads and emit identify events.
    pub enabled: bool,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format: "pretty" or "json".
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
