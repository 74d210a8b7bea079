//! Link rewriting.
//!
//! # Data Flow
//! ```text
//! parsed Frame + context id
//!     → wrapper.rs (mint/reuse target ids, build proxy URLs)
//!     → scheme.rs (versioned query layout)
//!     → rewritten copy of the Frame
//!
//! inbound proxy URL
//!     → scheme.rs (ProxyRoute::from_query)
//!     → context id + target id
//! ```

pub mod scheme;
pub mod wrapper;

pub use scheme::{ProxyRoute, RouteError, PROXY_PATH, SCHEME_VERSION};
pub use wrapper::LinkRewriter;
