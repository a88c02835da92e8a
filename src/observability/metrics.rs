//! Metrics collection and exposition.
//!
//! # Metrics
//! - `router_decisions_total` (counter): decisions by destination, verdict
//! - `router_upstream_responses_total` (counter): upstream responses by destination, status
//! - `router_upstream_failures_total` (counter): unreachable upstreams by destination
//! - `router_geo_lookup_failures_total` (counter): failed lookups by provider
//! - `router_dns_lookup_failures_total` (counter): failed reverse lookups
//! - `router_request_duration_seconds` (histogram): end-to-end latency by destination
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_decision(destination: &'static str, verdict: &'static str) {
    counter!("router_decisions_total", "destination" => destination, "verdict" => verdict)
        .increment(1);
}

pub fn record_upstream(destination: &'static str, status: u16) {
    counter!(
        "router_upstream_responses_total",
        "destination" => destination,
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn record_upstream_failure(destination: &'static str) {
    counter!("router_upstream_failures_total", "destination" => destination).increment(1);
}

pub fn record_geo_failure(provider: &str) {
    counter!("router_geo_lookup_failures_total", "provider" => provider.to_string()).increment(1);
}

pub fn record_dns_failure() {
    counter!("router_dns_lookup_failures_total").increment(1);
}

/// Time from request arrival until the response head is ready.
pub fn record_duration(destination: &'static str, started: Instant) {
    histogram!("router_request_duration_seconds", "destination" => destination)
        .record(started.elapsed().as_secs_f64());
}
