//! On-chain custody lookups through the IdRegistry contract.
//!
//! Used only when the hub did not report a custody address. Calls are
//! bounded by `chain.rpc_timeout_secs` and failures degrade to "unknown".

use alloy::primitives::{Address, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

use crate::config::ChainConfig;

sol! {
    #[sol(rpc)]
    interface IdRegistry {
        function custodyOf(uint256 fid) external view returns (address owner);
    }
}

/// Errors from the custody registry.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid chain configuration: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),
}

/// Reads custody addresses from the IdRegistry contract.
#[derive(Clone)]
pub struct CustodyRegistry {
    provider: DynProvider,
    registry: Address,
    timeout_secs: u64,
}

impl CustodyRegistry {
    pub fn new(config: &ChainConfig) -> Result<Self, ChainError> {
        let rpc_url: url::Url = config
            .rpc_url
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid RPC URL '{}': {}", config.rpc_url, e)))?;
        let registry: Address = config
            .id_registry_address
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid registry address: {}", e)))?;

        let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
        tracing::info!(rpc_url = %config.rpc_url, registry = %registry, "Custody registry configured");

        Ok(Self {
            provider,
            registry,
            timeout_secs: config.rpc_timeout_secs,
        })
    }

    /// Custody address of `fid`; `None` for unregistered ids.
    pub async fn custody_of(&self, fid: u64) -> Result<Option<Address>, ChainError> {
        let contract = IdRegistry::new(self.registry, self.provider.clone());
        let call = contract.custodyOf(U256::from(fid));

        match timeout(Duration::from_secs(self.timeout_secs), async move { call.call().await }).await {
            Ok(Ok(owner)) => Ok((!owner.is_zero()).then_some(owner)),
            Ok(Err(e)) => Err(ChainError::Rpc(e.to_string())),
            Err(_) => Err(ChainError::Timeout(self.timeout_secs)),
        }
    }
}

impl std::fmt::Debug for CustodyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustodyRegistry")
            .field("registry", &self.registry)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_config() {
        let mut config = ChainConfig::default();
        config.id_registry_address = "0x12".into();
        assert!(matches!(CustodyRegistry::new(&config), Err(ChainError::Config(_))));

        let mut config = ChainConfig::default();
        config.rpc_url = "not a url".into();
        assert!(matches!(CustodyRegistry::new(&config), Err(ChainError::Config(_))));
    }

    #[tokio::test]
    async fn test_unreachable_rpc_is_an_error() {
        let config = ChainConfig {
            enabled: true,
            rpc_url: "http://127.0.0.1:9".into(),
            rpc_timeout_secs: 2,
            ..ChainConfig::default()
        };
        let registry = CustodyRegistry::new(&config).unwrap();
        assert!(registry.custody_of(1).await.is_err());
    }
}
