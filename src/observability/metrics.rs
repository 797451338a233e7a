//! Metrics collection and exposition.
//!
//! # Metrics
//! - `worker_iterations_total` (counter): loop iterations by worker, outcome
//! - `worker_items_processed_total` (counter): items reported by the unit of work
//! - `circuit_breaker_state` (gauge): 0=closed, 1=open, 2=half-open
//! - `circuit_breaker_rejections_total` (counter): calls refused by an open breaker
//!
//! Recording is a no-op until `init_metrics` installs the Prometheus recorder.

use std::net::SocketAddr;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::resilience::circuit_breaker::CircuitState;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_iteration(worker: &str, outcome: &'static str) {
    metrics::counter!(
        "worker_iterations_total",
        "worker" => worker.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_items_processed(worker: &str, items: usize) {
    metrics::counter!("worker_items_processed_total", "worker" => worker.to_string())
        .increment(items as u64);
}

pub fn record_breaker_state(breaker: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open => 1.0,
        CircuitState::HalfOpen => 2.0,
    };
    metrics::gauge!("circuit_breaker_state", "breaker" => breaker.to_string()).set(value);
}

pub fn record_breaker_rejection(breaker: &str) {
    metrics::counter!("circuit_breaker_rejections_total", "breaker" => breaker.to_string())
        .increment(1);
}
