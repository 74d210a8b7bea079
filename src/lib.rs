//! Frame proxy library.
//!
//! Proxies interactive frame documents: origin URLs are wrapped into proxy
//! URLs, actions are forwarded to the origin, and every interaction is
//! attributed to a button and reported to analytics.

// Core subsystems
pub mod config;
pub mod http;
pub mod proxy;
pub mod store;

// Domain components
pub mod frame;
pub mod identity;
pub mod rewrite;
pub mod session;

// Cross-cutting concerns
pub mod analytics;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::FrameProxy;
