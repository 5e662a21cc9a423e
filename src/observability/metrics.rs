//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_http_requests_total` (counter): requests by method, status
//! - `router_http_request_duration_seconds` (histogram): API latency
//! - `router_route_attempts_total` (counter): routing calls by outcome
//! - `router_route_duration_seconds` (histogram): time inside the engine
//! - `router_route_distance_meters` (histogram): distance of assignments
//! - `router_registered_responders` / `router_verified_responders` (gauges)
//! - `router_authority_transfers_total`, `router_routing_resets_total` (counters)
//!
//! Recording is a no-op until a recorder is installed, so the core can be
//! used without the exporter.

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder with an HTTP scrape listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    ::metrics::counter!(
        "router_http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!("router_http_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_route_attempt(outcome: &'static str, start: Instant) {
    ::metrics::counter!("router_route_attempts_total", "outcome" => outcome).increment(1);
    ::metrics::histogram!("router_route_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_route_distance(meters: u64) {
    ::metrics::histogram!("router_route_distance_meters").record(meters as f64);
}

pub fn record_registered_responders(count: usize) {
    ::metrics::gauge!("router_registered_responders").set(count as f64);
}

pub fn record_verified_responders(count: usize) {
    ::metrics::gauge!("router_verified_responders").set(count as f64);
}

pub fn record_authority_transfer() {
    ::metrics::counter!("router_authority_transfers_total").increment(1);
}

pub fn record_routing_reset() {
    ::metrics::counter!("router_routing_resets_total").increment(1);
}
