//! Status snapshot types and the status aggregator.
//!
//! # Responsibilities
//! - Shape of the per-service status map and the aggregate snapshot
//! - Compose orchestrator status into the health and root responses
//!
//! # Design Decisions
//! - Pure read path: no state of its own
//! - A failing service yields an inline error entry, never a failed response

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::lifecycle::Orchestrator;

/// Status reported by one service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ServiceStatus {
    /// Whatever the service returned.
    Reported(Value),
    /// The status query failed; rendered as `{"status": "error", "error": "..."}`.
    Error { status: &'static str, error: String },
}

impl ServiceStatus {
    pub fn error(message: impl Into<String>) -> Self {
        ServiceStatus::Error {
            status: "error",
            error: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ServiceStatus::Error { .. })
    }
}

/// Point-in-time view of the whole process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    /// Seconds since the orchestrator was constructed.
    pub uptime: f64,
    /// When the orchestrator was constructed (canonical RFC 3339).
    pub started_at: String,
    /// Number of connected real-time clients.
    pub websocket_clients: usize,
    /// Per-service status keyed by service name.
    pub services: BTreeMap<String, ServiceStatus>,
}

/// Body of the root liveness endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct RootStatus {
    pub status: &'static str,
    pub version: &'static str,
}

/// Body of the detailed health endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub version: &'static str,
    pub services: StatusSnapshot,
}

/// Composes orchestrator and client registry state into health responses.
#[derive(Clone)]
pub struct StatusAggregator {
    orchestrator: Arc<Orchestrator>,
}

impl StatusAggregator {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn root(&self) -> RootStatus {
        RootStatus {
            status: "online",
            version: env!("CARGO_PKG_VERSION"),
        }
    }

    pub async fn snapshot(&self) -> StatusSnapshot {
        self.orchestrator.get_status().await
    }

    pub async fn health(&self) -> HealthReport {
        let services = self.snapshot().await;
        let failing = services.services.values().filter(|s| s.is_error()).count();
        if failing > 0 {
            tracing::warn!(failing, "Health report contains failing services");
        }

        HealthReport {
            service: "ok",
            version: env!("CARGO_PKG_VERSION"),
            services,
        }
    }
}
