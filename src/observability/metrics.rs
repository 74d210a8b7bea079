//! Metrics collection and exposition.
//!
//! # Metrics
//! - `frame_proxy_requests_total` (counter): requests by flow, status
//! - `frame_proxy_request_duration_seconds` (histogram): latency by flow
//! - `frame_proxy_events_total` (counter): analytics events by name, outcome
//! - `frame_proxy_hub_fetches_total` (counter): hub lookups by branch, outcome
//! - `frame_proxy_mappings_created_total` (counter): minted mapping ids
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter with its own HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished request of `flow` (`entry`, `action`, `wrap`).
pub fn record_request(flow: &'static str, status: u16, start: Instant) {
    counter!(
        "frame_proxy_requests_total",
        "flow" => flow,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("frame_proxy_request_duration_seconds", "flow" => flow)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_event(event: &str, outcome: &'static str) {
    counter!(
        "frame_proxy_events_total",
        "event" => event.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_hub_fetch(branch: &'static str, outcome: &'static str) {
    counter!(
        "frame_proxy_hub_fetches_total",
        "branch" => branch,
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_mapping_created() {
    counter!("frame_proxy_mappings_created_total").increment(1);
}
