//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): settled calls by method, outcome
//! - `gateway_request_duration_seconds` (histogram): call latency including suspension
//! - `gateway_stale_retries_total` (counter): silent stale-connection retries
//! - `gateway_outages_total` (counter): outage episodes entered
//! - `gateway_suspended_calls` (gauge): calls parked on the outage gate
//! - `gateway_health_probe` (gauge): 1=healthy, 0=unhealthy

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with an HTTP scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &'static str, outcome: &'static str, started: Instant) {
    counter!("gateway_requests_total", "method" => method, "outcome" => outcome).increment(1);
    histogram!("gateway_request_duration_seconds", "method" => method)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_stale_retry() {
    counter!("gateway_stale_retries_total").increment(1);
}

pub fn record_outage() {
    counter!("gateway_outages_total").increment(1);
}

pub fn record_suspended_calls(count: usize) {
    gauge!("gateway_suspended_calls").set(count as f64);
}

pub fn record_health(healthy: bool) {
    gauge!("gateway_health_probe").set(if healthy { 1.0 } else { 0.0 });
}
