//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_requests_total` (counter): proxied requests by outcome
//! - `relay_rejected_total` (counter): origin gate rejections by reason
//! - `relay_fetch_duration_seconds` (histogram): upstream fetch latency by outcome
//! - `relay_upstream_bytes_total` (counter): image bytes relayed
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exporter only runs when enabled in config

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::error::{ForbiddenReason, RelayResult};
use crate::upstream::FetchedImage;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install Prometheus exporter"),
    }
}

/// Record the final outcome of a proxied request.
pub fn record_request(outcome: &'static str) {
    counter!("relay_requests_total", "outcome" => outcome).increment(1);
}

/// Record an origin gate rejection.
pub fn record_rejected(reason: ForbiddenReason) {
    counter!("relay_rejected_total", "reason" => reason.as_str()).increment(1);
}

/// Record an upstream fetch and its duration.
pub fn record_fetch(outcome: &RelayResult<FetchedImage>, start: Instant) {
    let label = match outcome {
        Ok(image) => {
            counter!("relay_upstream_bytes_total").increment(image.bytes.len() as u64);
            "success"
        }
        Err(e) => e.kind(),
    };
    histogram!("relay_fetch_duration_seconds", "outcome" => label)
        .record(start.elapsed().as_secs_f64());
}
