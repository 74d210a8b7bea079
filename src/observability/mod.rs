//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with request_id / context_id / fid fields
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → logging.rs subscriber (stdout, pretty or JSON)
//!     → Prometheus scrape of the exporter listener
//! ```
//!
//! # Design Decisions
//! - Request ID is set by the HTTP layer and flows through every log line
//! - Metrics are cheap (atomic increments) and silent until installed

pub mod logging;
pub mod metrics;
