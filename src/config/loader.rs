//! Configuration loading from disk.

use std::path::Path;
use std::fs;
use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Overrides the hub `api_key` header value.
pub const HUB_API_KEY_ENV_VAR: &str = "FRAME_PROXY_HUB_API_KEY";
/// Overrides `analytics.default_api_key`.
pub const ANALYTICS_API_KEY_ENV_VAR: &str = "FRAME_PROXY_ANALYTICS_API_KEY";
/// Overrides `proxy.public_url`.
pub const PUBLIC_URL_ENV_VAR: &str = "FRAME_PROXY_PUBLIC_URL";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load a TOML file, apply secrets from the environment, and validate.
pub fn load_config(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let mut config: ProxyConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    apply_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Defaults plus environment overrides, for running without a config file.
pub fn load_default() -> Result<ProxyConfig, ConfigError> {
    let mut config = ProxyConfig::default();
    apply_overrides(&mut config, |name| std::env::var(name).ok());
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Secrets never need to live in the config file.
pub fn apply_overrides(config: &mut ProxyConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(HUB_API_KEY_ENV_VAR).filter(|v| !v.is_empty()) {
        config.hub.api_key = Some(key);
    }
    if let Some(key) = lookup(ANALYTICS_API_KEY_ENV_VAR).filter(|v| !v.is_empty()) {
        config.analytics.default_api_key = Some(key);
    }
    if let Some(url) = lookup(PUBLIC_URL_ENV_VAR).filter(|v| !v.is_empty()) {
        config.proxy.public_url = url;
    }
}
