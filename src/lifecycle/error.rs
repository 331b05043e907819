//! Lifecycle error definitions.

use std::collections::BTreeSet;
use std::time::Duration;
use thiserror::Error;

/// Error type returned by service implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Why a single `start`, `stop` or `status` call on a service failed.
#[derive(Debug, Error)]
pub enum ServiceFailure {
    /// The service itself reported an error.
    #[error("{0}")]
    Failed(#[source] BoxError),

    /// The call did not complete within the configured deadline.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

impl ServiceFailure {
    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceFailure::Failed(_) => "failed",
            ServiceFailure::TimedOut(_) => "timeout",
        }
    }
}

/// Errors raised by the orchestrator to its caller.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A service with the same name is already registered.
    #[error("service '{name}' is already registered")]
    AlreadyRegistered { name: String },

    /// Startup could not make progress: a circular dependency, or a dependency
    /// that was never registered.
    #[error("unsatisfiable start order (circular or unregistered dependency); stuck: {}", join(.stuck))]
    UnsatisfiableOrder { stuck: BTreeSet<String> },

    /// A service failed to start; startup was aborted.
    #[error("service '{name}' failed to start: {source}")]
    ServiceStart {
        name: String,
        #[source]
        source: ServiceFailure,
    },
}

impl LifecycleError {
    /// Short stable label for logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            LifecycleError::AlreadyRegistered { .. } => "already_registered",
            LifecycleError::UnsatisfiableOrder { .. } => "unsatisfiable_order",
            LifecycleError::ServiceStart { .. } => "service_start",
        }
    }
}

fn join(names: &BTreeSet<String>) -> String {
    names.iter().cloned().collect::<Vec<_>>().join(", ")
}
