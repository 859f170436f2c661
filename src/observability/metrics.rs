//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_startup_steps_total` (counter): startup steps by step, outcome
//! - `bridge_submissions_total` (counter): transaction submissions by outcome
//! - `bridge_received_payments_total` (counter): processed payments by status
//! - `bridge_callbacks_total` (counter): receive callbacks by status class
//!
//! Without an installed recorder every `record_*` call is a no-op.

use std::net::SocketAddr;

use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_startup_step(step: &'static str, outcome: &'static str) {
    counter!("bridge_startup_steps_total", "step" => step, "outcome" => outcome).increment(1);
}

pub fn record_submission(outcome: &'static str) {
    counter!("bridge_submissions_total", "outcome" => outcome).increment(1);
}

pub fn record_received_payment(status: &'static str) {
    counter!("bridge_received_payments_total", "status" => status).increment(1);
}

/// `status` is the HTTP status code, or `error` when no response arrived.
pub fn record_callback(status: String) {
    counter!("bridge_callbacks_total", "status" => status).increment(1);
}
