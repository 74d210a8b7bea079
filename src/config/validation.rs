//! Configuration validation.
//!
//! Serde handles syntax; this module checks values that must make sense
//! together before a config is accepted (URLs parse, timeouts are non-zero,
//! addresses are well formed). Every problem is reported, not just the first.

use std::net::SocketAddr;

use alloy::primitives::Address;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    check_http_url(&mut errors, "proxy.public_url", &config.proxy.public_url);
    check_http_url(&mut errors, "hub.url", &config.hub.url);

    if config.analytics.enabled {
        check_http_url(&mut errors, "analytics.us_endpoint", &config.analytics.us_endpoint);
        check_http_url(&mut errors, "analytics.eu_endpoint", &config.analytics.eu_endpoint);
    }

    if config.chain.enabled {
        check_http_url(&mut errors, "chain.rpc_url", &config.chain.rpc_url);
        if config.chain.id_registry_address.parse::<Address>().is_err() {
            errors.push(ValidationError::new(
                "chain.id_registry_address",
                "not a valid address",
            ));
        }
        if config.chain.rpc_timeout_secs == 0 {
            errors.push(ValidationError::new("chain.rpc_timeout_secs", "must be > 0"));
        }
    }

    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.origin_secs", config.timeouts.origin_secs),
        ("timeouts.hub_secs", config.timeouts.hub_secs),
        ("timeouts.analytics_secs", config.timeouts.analytics_secs),
    ];
    for (field, secs) in timeouts {
        if secs == 0 {
            errors.push(ValidationError::new(field, "must be > 0"));
        }
    }

    if config.proxy.max_body_bytes == 0 {
        errors.push(ValidationError::new("proxy.max_body_bytes", "must be > 0"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "not a socket address",
        ));
    }

    if !matches!(config.observability.log_format.as_str(), "pretty" | "json") {
        errors.push(ValidationError::new(
            "observability.log_format",
            "expected \"pretty\" or \"json\"",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::new(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => errors.push(ValidationError::new(field, format!("invalid URL: {}", e))),
    }
}
