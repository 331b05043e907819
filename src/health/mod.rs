//! Health and status reporting subsystem.
//!
//! # Data Flow
//! ```text
//! GET /        → StatusAggregator::root()   → {"status": "online", "version"}
//! GET /health  → StatusAggregator::health()
//!                  → Orchestrator::get_status()
//!                      → status() on every registered service (deadline each)
//!                      → uptime + connected client count
//!                  → {"service": "ok", "services": snapshot}
//! ```
//!
//! # Design Decisions
//! - Health never fails outright: per-service failures become inline entries
//! - No caching: every query reflects live state

pub mod status;

pub use status::{HealthReport, RootStatus, ServiceStatus, StatusAggregator, StatusSnapshot};
