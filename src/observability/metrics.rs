//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by operation, outcome, status
//! - `gateway_request_duration_seconds` (histogram): end-to-end latency per operation
//!
//! Recording is a no-op until a recorder is installed by [`init_metrics`].

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::gateway::Outcome;

/// Install the Prometheus recorder and its scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished gateway request.
pub fn record_request(operation: &'static str, outcome: Outcome, status: u16, start: Instant) {
    ::metrics::counter!(
        "gateway_requests_total",
        "operation" => operation,
        "outcome" => outcome.as_str(),
        "status" => status.to_string()
    )
    .increment(1);

    ::metrics::histogram!(
        "gateway_request_duration_seconds",
        "operation" => operation
    )
    .record(start.elapsed().as_secs_f64());
}
