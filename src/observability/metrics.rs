//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bookings_requests_total` (counter): lookups by response status
//! - `bookings_request_duration_seconds` (histogram): lookup latency
//! - `bookings_rate_limited_total` (counter): rejected by the rate limiter
//! - `bookings_upstream_calls_total` (counter): upstream calls by endpoint, outcome
//! - `bookings_upstream_duration_seconds` (histogram): upstream latency by endpoint
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a finished lookup request.
pub fn record_request(status: u16, start: Instant) {
    counter!("bookings_requests_total", "status" => status.to_string()).increment(1);
    histogram!("bookings_request_duration_seconds").record(start.elapsed().as_secs_f64());
}

/// Record a rate-limit rejection.
pub fn record_rate_limited() {
    counter!("bookings_rate_limited_total").increment(1);
}

/// Record one call to the booking platform.
pub fn record_upstream_call(endpoint: &'static str, success: bool, start: Instant) {
    let outcome = if success { "success" } else { "failure" };
    counter!("bookings_upstream_calls_total", "endpoint" => endpoint, "outcome" => outcome)
        .increment(1);
    histogram!("bookings_upstream_duration_seconds", "endpoint" => endpoint)
        .record(start.elapsed().as_secs_f64());
}
