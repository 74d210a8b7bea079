//! Analytics subsystem.
//!
//! # Data Flow
//! ```text
//! forwarder / identity resolver
//!     → events.rs (frame_click, frame_click_link, $identify)
//!     → client.rs Analytics::emit (key + region from the context)
//!     → EventSink (CaptureClient → {endpoint}/capture/)
//! ```
//!
//! # Design Decisions
//! - Emission never changes what the caller receives; failures are logged
//! - Every outbound call is bounded by `timeouts.analytics_secs`

pub mod client;
pub mod events;

pub use client::{Analytics, AnalyticsError, AnalyticsRoute, CaptureClient, EventSink};
pub use events::{Event, Interaction, Region};
