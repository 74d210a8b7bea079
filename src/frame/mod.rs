//! Frame documents: model, HTML parsing, and serialization.
//!
//! # Data Flow
//! ```text
//! origin HTML ──parser.rs──▶ Frame ──(rewrite/)──▶ Frame ──html.rs──▶ HTML to caller
//! ```
//!
//! A document that fails to parse is never an error for the caller; the
//! proxy returns it untouched.

pub mod html;
pub mod parser;
pub mod payload;
pub mod types;

pub use html::{serialize, with_browser_redirect};
pub use parser::{parse, FrameParseError};
pub use payload::{ActionPayload, CastId, TrustedData, UntrustedData};
pub use types::{button_for_index, ActionKind, AspectRatio, Button, Frame};
