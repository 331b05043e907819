//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Static (service, dependencies) list
//!     → Orchestrator::register_shared (graph.rs grows)
//!     → Orchestrator::start_all (dependencies before dependents)
//!
//! Steady state:
//!     HTTP/WebSocket shell → Orchestrator::get_status / broadcast
//!
//! Shutdown (signals.rs → shutdown.rs → orchestrator.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger → server drains
//!     → Orchestrator::stop_all (dependents before dependencies)
//! ```
//!
//! # Design Decisions
//! - Startup is fail-fast: an unsatisfiable order or a failing start is fatal
//! - Shutdown is best effort: stop failures are logged and the sweep continues
//! - Services are awaited one at a time; ordering stays deterministic
//! - Every start/stop/status call runs under an optional deadline

pub mod error;
pub mod graph;
pub mod orchestrator;
pub mod service;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use error::{BoxError, LifecycleError, ServiceFailure};
pub use graph::DependencyGraph;
pub use orchestrator::{Orchestrator, ServiceState, ShutdownReport};
pub use service::Service;
pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{bootstrap, register_all, Registration, ServiceEntry};
