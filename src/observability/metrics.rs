//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): inbound requests by method, status
//! - `gateway_request_duration_seconds` (histogram): inbound latency
//! - `gateway_upstream_requests_total` (counter): upstream calls by upstream, method, status
//! - `gateway_upstream_request_duration_seconds` (histogram): upstream latency
//! - `gateway_upstream_retries_total` (counter): retry attempts by upstream
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half_open
//! - `gateway_circuit_breaker_rejections_total` (counter): calls refused by a breaker
//!
//! Recording goes through the `metrics` facade and is a no-op until
//! [`init_metrics`] installs the Prometheus recorder.

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_inbound_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("gateway_request_duration_seconds", "method" => method.to_string())
        .record(start.elapsed().as_secs_f64());
}

/// `status` is `"error"` when no response arrived.
pub fn record_upstream_call(upstream: &str, method: &str, status: &str, start: Instant) {
    metrics::counter!(
        "gateway_upstream_requests_total",
        "upstream" => upstream.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_upstream_request_duration_seconds",
        "upstream" => upstream.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_retry(upstream: &str) {
    metrics::counter!("gateway_upstream_retries_total", "upstream" => upstream.to_string()).increment(1);
}

pub fn record_breaker_state(upstream: &str, state: CircuitState) {
    metrics::gauge!("gateway_circuit_breaker_state", "upstream" => upstream.to_string()).set(state.as_gauge());
}

pub fn record_breaker_rejection(upstream: &str) {
    metrics::counter!("gateway_circuit_breaker_rejections_total", "upstream" => upstream.to_string())
        .increment(1);
}
