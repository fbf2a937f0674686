//! Metrics collection and exposition.
//!
//! # Metrics
//! - `registry_http_requests_total` (counter): API requests by method, route, status
//! - `registry_http_request_duration_seconds` (histogram): API latency
//! - `registry_registrations_total` (counter): register calls by outcome
//! - `registry_deregistrations_total` (counter): removals by reason
//! - `registry_instances` (gauge): registered instance count
//! - `registry_health_probes_total` (counter): probes by service and result
//! - `registry_health_probe_duration_seconds` (histogram): probe latency
//! - `registry_status_transitions_total` (counter): status changes
//! - `registry_queries_total` (counter): discovery queries by result
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests can call these freely.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

use crate::registry::HealthStatus;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    counter!(
        "registry_http_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("registry_http_request_duration_seconds", "route" => route.to_string())
        .record(start.elapsed().as_secs_f64());
}

pub fn record_registration(outcome: &'static str) {
    counter!("registry_registrations_total", "outcome" => outcome).increment(1);
}

pub fn record_deregistration(reason: &'static str) {
    counter!("registry_deregistrations_total", "reason" => reason).increment(1);
}

pub fn record_instance_count(count: usize) {
    gauge!("registry_instances").set(count as f64);
}

pub fn record_probe(service: &str, passing: bool, start: Instant) {
    let result = if passing { "passing" } else { "critical" };
    counter!(
        "registry_health_probes_total",
        "service" => service.to_string(),
        "result" => result
    )
    .increment(1);
    histogram!("registry_health_probe_duration_seconds").record(start.elapsed().as_secs_f64());
}

pub fn record_status_transition(from: HealthStatus, to: HealthStatus) {
    counter!(
        "registry_status_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

pub fn record_query(found: bool) {
    let result = if found { "found" } else { "not_found" };
    counter!("registry_queries_total", "result" => result).increment(1);
}
