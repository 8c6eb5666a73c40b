//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define proxy metrics (requests, latency, loopbacks, tee duplicates)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `proxy_requests_total` (counter): total requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_loopbacks_total` (counter): loopback passes by route
//! - `proxy_tee_requests_total` (counter): tee duplicates by tag and outcome
//! - `proxy_routes_rejected_total` (counter): routes dropped at compile time
//!
//! # Design Decisions
//! - Recording without an installed recorder is a no-op, so unit tests
//!   never need to set one up

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, address = %addr, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let route = route.to_string();
    ::metrics::counter!(
        "proxy_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string(),
        "route" => route.clone()
    )
    .increment(1);
    ::metrics::histogram!(
        "proxy_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_loopback(route: &str) {
    ::metrics::counter!("proxy_loopbacks_total", "route" => route.to_string()).increment(1);
}

/// Outcome is one of `delivered`, `failed`, `timeout` or `unrouted`.
pub fn record_tee(tag: &str, outcome: &'static str) {
    ::metrics::counter!(
        "proxy_tee_requests_total",
        "tag" => tag.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_route_rejected() {
    ::metrics::counter!("proxy_routes_rejected_total").increment(1);
}
