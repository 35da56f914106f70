//! Metrics collection and exposition.
//!
//! # Metrics
//! - `pxe_admission_total` (counter): admission decisions by outcome
//! - `pxe_rate_limiter_tracked_clients` (gauge): live per-IP buckets
//! - `pxe_audit_append_failures_total` (counter): audit lines lost
//! - `pxe_boot_configs_total` (counter): generations by family, result
//! - `pxe_reports_total` (counter): self-reports by outcome
//! - `pxe_http_requests_total` (counter): requests by method, status
//! - `pxe_http_request_duration_seconds` (histogram): latency distribution
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder every call is a no-op, which keeps tests exporter-free
//! - Labels are static strings except the HTTP method and status

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus recorder and its scrape listener.
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    ::metrics::describe_counter!("pxe_admission_total", "Admission decisions by outcome");
    ::metrics::describe_gauge!("pxe_rate_limiter_tracked_clients", "Client addresses with a live token bucket");
    ::metrics::describe_counter!("pxe_audit_append_failures_total", "Audit events that could not be written");
    ::metrics::describe_counter!("pxe_boot_configs_total", "Boot config generations by family and result");
    ::metrics::describe_counter!("pxe_reports_total", "Server self-reports by outcome");
    ::metrics::describe_counter!("pxe_http_requests_total", "HTTP requests by method and status");
    ::metrics::describe_histogram!("pxe_http_request_duration_seconds", "HTTP request latency");

    tracing::info!(address = %addr, "Prometheus metrics endpoint listening");
    Ok(())
}

/// `outcome` is one of bypassed, admitted, unauthorized, rate_limited.
pub fn record_admission(outcome: &'static str) {
    ::metrics::counter!("pxe_admission_total", "outcome" => outcome).increment(1);
}

pub fn record_tracked_clients(count: usize) {
    ::metrics::gauge!("pxe_rate_limiter_tracked_clients").set(count as f64);
}

pub fn record_audit_failure() {
    ::metrics::counter!("pxe_audit_append_failures_total").increment(1);
}

pub fn record_boot_config(family: &'static str, result: &'static str) {
    ::metrics::counter!("pxe_boot_configs_total", "family" => family, "result" => result).increment(1);
}

pub fn record_report(outcome: &'static str) {
    ::metrics::counter!("pxe_reports_total", "outcome" => outcome).increment(1);
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    let status = status.to_string();
    ::metrics::counter!("pxe_http_requests_total", "method" => method.to_string(), "status" => status.clone())
        .increment(1);
    ::metrics::histogram!("pxe_http_request_duration_seconds", "method" => method.to_string(), "status" => status)
        .record(start.elapsed().as_secs_f64());
}
