//! Startup orchestration.
//!
//! # Responsibilities
//! - Register the static list of (service, dependencies) pairs
//! - Start every registered service in dependency order
//!
//! # Design Decisions
//! - A duplicate entry is logged and skipped; registration continues
//! - Fail fast on everything else: other registration or startup errors are fatal
//! - The entry point refuses to serve traffic when bootstrap fails

use std::sync::Arc;

use crate::lifecycle::error::LifecycleError;
use crate::lifecycle::orchestrator::Orchestrator;
use crate::lifecycle::service::Service;

/// One entry of the registration list.
pub struct ServiceEntry {
    pub service: Arc<dyn Service>,
    pub dependencies: Vec<String>,
}

impl ServiceEntry {
    pub fn new(service: Arc<dyn Service>, dependencies: &[&str]) -> Self {
        Self {
            service,
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// Outcome of registering a static entry list.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Registration {
    pub registered: usize,
    /// Names rejected as duplicates, in list order.
    pub skipped: Vec<String>,
}

/// Register every entry. Duplicates are skipped; any other error stops the list.
pub fn register_all(
    orchestrator: &Orchestrator,
    entries: Vec<ServiceEntry>,
) -> Result<Registration, LifecycleError> {
    tracing::info!(count = entries.len(), "Starting service registration");

    let mut outcome = Registration::default();
    for entry in entries {
        let name = entry.service.name();
        tracing::debug!(service = %name, "Registering service");

        match orchestrator.register_shared(entry.service, entry.dependencies) {
            Ok(()) => outcome.registered += 1,
            Err(LifecycleError::AlreadyRegistered { name }) => {
                tracing::warn!(service = %name, "Skipping duplicate service entry");
                outcome.skipped.push(name);
            }
            Err(e) => {
                tracing::error!(service = %name, error = %e, "Failed to register service");
                return Err(e);
            }
        }
    }

    Ok(outcome)
}

/// Register `entries` and start everything. Returns the start order.
pub async fn bootstrap(
    orchestrator: &Orchestrator,
    entries: Vec<ServiceEntry>,
) -> Result<Vec<String>, LifecycleError> {
    register_all(orchestrator, entries)?;
    orchestrator.start_all().await
}
