//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (connections, requests, latency, accept errors)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `covid_connections_total` (counter): accepted connections
//! - `covid_active_connections` (gauge): currently open sessions
//! - `covid_requests_total` (counter): requests by outcome
//!   (`records`, `nothing_found`, `invalid`)
//! - `covid_request_duration_seconds` (histogram): time to answer a request
//! - `covid_accept_errors_total` (counter): failed `accept` calls
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   exporter every call is a no-op
//! - The exporter is opt-in through configuration

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_connection_opened() {
    counter!("covid_connections_total").increment(1);
    gauge!("covid_active_connections").increment(1.0);
}

pub fn record_connection_closed() {
    gauge!("covid_active_connections").decrement(1.0);
}

/// Record one answered request.
pub fn record_request(outcome: &'static str, started: Instant) {
    counter!("covid_requests_total", "outcome" => outcome).increment(1);
    histogram!("covid_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

pub fn record_accept_error() {
    counter!("covid_accept_errors_total").increment(1);
}
