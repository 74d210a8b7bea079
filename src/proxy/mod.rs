//! Frame proxy pipeline.
//!
//! # Data Flow
//! ```text
//! GET  /a?v=1&r={ctx}
//!     → orchestrator.rs (resolve ctx → fetch origin → rewrite → seed session)
//!
//! POST /a?v=1&r={ctx}&n={target}
//!     → forwarder.rs (resolve → reset? → forward → identify → classify)
//!         ├─ frame     → rewrite, frame_click, record snapshot
//!         ├─ redirect  → frame_click_link, 302
//!         └─ otherwise → raw body
//! ```
//!
//! # Design Decisions
//! - Origin calls are never retried; actions may not be idempotent
//! - Analytics and identity failures never change the reply

pub mod error;
pub mod forwarder;
pub mod orchestrator;
pub mod origin;

pub use error::ProxyError;
pub use forwarder::{ActionForwarder, ActionRequest};
pub use orchestrator::{FrameProxy, PipelineError};
pub use origin::{OriginClient, OriginResponse};

/// What the proxy answers a caller with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyReply {
    /// A rewritten frame document. `content_type` defaults to HTML.
    Frame {
        html: String,
        content_type: Option<String>,
    },
    /// The origin's answer, untouched.
    PassThrough(OriginResponse),
    /// External redirect to the given absolute URL.
    Redirect(String),
}
