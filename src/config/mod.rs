//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, apply env secrets)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → pipeline built from it, shared via ArcSwap
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → server rebuilds the pipeline and swaps it in
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Secrets (hub and analytics keys) come from the environment

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use schema::{
    AnalyticsConfig, ChainConfig, FrameProxySettings, HubConfig, IdentityConfig, ListenerConfig,
    ObservabilityConfig, ProxyConfig, StoreConfig, TimeoutConfig,
};
