//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define orchestrator metrics (lifecycle transitions, broadcasts, clients)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `orchestrator_service_transitions_total` (counter): by service, transition, outcome
//! - `orchestrator_lifecycle_duration_seconds` (histogram): StartAll / StopAll duration
//! - `orchestrator_broadcast_events_total` (counter): by event type
//! - `orchestrator_broadcast_deliveries_total` (counter): successful client sends
//! - `orchestrator_broadcast_failures_total` (counter): failed client sends
//! - `orchestrator_connected_clients` (gauge): current client count
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels for service, transition, outcome and event type

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus exporter listening on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record one service lifecycle transition attempt.
pub fn record_transition(service: &str, transition: &'static str, outcome: &'static str) {
    counter!(
        "orchestrator_service_transitions_total",
        "service" => service.to_string(),
        "transition" => transition,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record how long a StartAll / StopAll phase took.
pub fn record_phase_duration(phase: &'static str, started: Instant) {
    histogram!("orchestrator_lifecycle_duration_seconds", "phase" => phase)
        .record(started.elapsed().as_secs_f64());
}

/// Record the outcome of one broadcast.
pub fn record_broadcast(event_type: &'static str, delivered: usize, failed: usize) {
    counter!("orchestrator_broadcast_events_total", "event_type" => event_type).increment(1);
    counter!("orchestrator_broadcast_deliveries_total").increment(delivered as u64);
    if failed > 0 {
        counter!("orchestrator_broadcast_failures_total").increment(failed as u64);
    }
}

/// Update the connected-client gauge.
pub fn set_connected_clients(count: usize) {
    gauge!("orchestrator_connected_clients").set(count as f64);
}
