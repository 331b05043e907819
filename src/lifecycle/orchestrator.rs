//! Service lifecycle orchestrator.
//!
//! Owns the registered services and their dependency graph, and drives each
//! service through `registered → started → stopped` exactly once.
//!
//! # Ordering
//! ```text
//! start_all: repeated sweeps over registered services (registration order);
//!            a service starts once all its dependencies are started.
//!            A sweep that starts nothing ends startup with UnsatisfiableOrder.
//! stop_all:  sweeps over started services in reverse start order;
//!            a service stops once every started dependent has stopped.
//! ```
//!
//! `service_started` / `service_stopped` events are queued to a background
//! task, so a slow client never holds up a transition.

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

use crate::broadcast::{
    canonical_timestamp, event_data, BroadcastReport, ClientRegistry, EventData, EventType,
};
use crate::config::LifecycleConfig;
use crate::health::{ServiceStatus, StatusSnapshot};
use crate::lifecycle::error::{BoxError, LifecycleError, ServiceFailure};
use crate::lifecycle::graph::DependencyGraph;
use crate::lifecycle::service::{normalize_name, Service};
use crate::observability::metrics;
use crate::resilience::{with_timeout, Bounded};

/// Lifecycle state of one registered service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    Registered,
    Started,
    Stopped,
}

/// Outcome of a shutdown sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// Services drained, in stop order (including those whose `stop` failed).
    pub stopped: Vec<String>,
    /// Services whose `stop` returned an error or timed out.
    pub failed: Vec<String>,
    /// Started services the sweep could not reach.
    pub remaining: Vec<String>,
}

struct ServiceRecord {
    name: String,
    dependencies: Vec<String>,
    instance: Arc<dyn Service>,
}

#[derive(Default)]
struct Inner {
    records: Vec<Arc<ServiceRecord>>,
    graph: DependencyGraph,
    states: HashMap<String, ServiceState>,
    start_order: Vec<String>,
}

/// Process-wide lifecycle orchestrator.
///
/// Construct once at process start and share via `Arc`.
pub struct Orchestrator {
    inner: Mutex<Inner>,
    /// Serializes start_all / stop_all against each other.
    transition: tokio::sync::Mutex<()>,
    clients: Arc<ClientRegistry>,
    /// Queue of lifecycle notifications, drained in order by a background task.
    notifier: OnceLock<mpsc::UnboundedSender<(EventType, String)>>,
    timeouts: LifecycleConfig,
    created: Instant,
    created_at: DateTime<Utc>,
}

impl Orchestrator {
    pub fn new(timeouts: LifecycleConfig, clients: Arc<ClientRegistry>) -> Self {
        tracing::info!(
            start_timeout = ?timeouts.start_timeout(),
            stop_timeout = ?timeouts.stop_timeout(),
            "Orchestrator initialized"
        );

        Self {
            inner: Mutex::new(Inner::default()),
            transition: tokio::sync::Mutex::new(()),
            clients,
            notifier: OnceLock::new(),
            timeouts,
            created: Instant::now(),
            created_at: Utc::now(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a lifecycle event for clients without waiting on delivery.
    fn notify(&self, event_type: EventType, service: &str) {
        let tx = self
            .notifier
            .get_or_init(|| spawn_notifier(Arc::clone(&self.clients)));
        if tx.send((event_type, service.to_string())).is_err() {
            tracing::debug!(service, "Lifecycle notifier is gone; event dropped");
        }
    }

    /// Register an owned service with the names of the services it depends on.
    pub fn register_service<S>(&self, service: S, dependencies: &[&str]) -> Result<(), LifecycleError>
    where
        S: Service + 'static,
    {
        let dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self.register_shared(Arc::new(service), dependencies)
    }

    /// Register a shared service instance.
    ///
    /// Dependencies need not be registered yet. A duplicate name is rejected
    /// and leaves the existing registration untouched.
    pub fn register_shared(
        &self,
        service: Arc<dyn Service>,
        dependencies: Vec<String>,
    ) -> Result<(), LifecycleError> {
        let name = normalize_name(&service.name());
        let dependencies: Vec<String> = dependencies.iter().map(|d| normalize_name(d)).collect();

        let mut inner = self.lock();
        if !inner.graph.insert(&name, &dependencies) {
            tracing::warn!(service = %name, "Service already registered");
            return Err(LifecycleError::AlreadyRegistered { name });
        }

        let missing = inner.graph.missing_dependencies(&name);
        if !missing.is_empty() {
            tracing::warn!(service = %name, missing = ?missing, "Service has unmet dependencies");
        }

        let declared = inner.graph.dependencies(&name).to_vec();
        inner.records.push(Arc::new(ServiceRecord {
            name: name.clone(),
            dependencies: declared,
            instance: service,
        }));
        inner.states.insert(name.clone(), ServiceState::Registered);

        tracing::info!(service = %name, dependencies = ?dependencies, "Service registered");
        Ok(())
    }

    /// Look up a registered service (case-insensitive).
    pub fn get_service(&self, name: &str) -> Option<Arc<dyn Service>> {
        let name = normalize_name(name);
        self.lock()
            .records
            .iter()
            .find(|r| r.name == name)
            .map(|r| Arc::clone(&r.instance))
    }

    /// Declared dependencies of a registered service.
    pub fn dependencies_of(&self, name: &str) -> Option<Vec<String>> {
        let name = normalize_name(name);
        self.lock()
            .records
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.dependencies.clone())
    }

    pub fn state_of(&self, name: &str) -> Option<ServiceState> {
        self.lock().states.get(&normalize_name(name)).copied()
    }

    /// Registered names in registration order.
    pub fn registered_names(&self) -> Vec<String> {
        self.lock().graph.nodes().to_vec()
    }

    /// Names in the order they were started.
    pub fn start_order(&self) -> Vec<String> {
        self.lock().start_order.clone()
    }

    pub fn uptime(&self) -> Duration {
        self.created.elapsed()
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn clients(&self) -> &Arc<ClientRegistry> {
        &self.clients
    }

    /// Broadcast an event to every connected client.
    pub async fn broadcast(&self, event_type: EventType, data: &EventData) -> BroadcastReport {
        self.clients.broadcast(event_type, data).await
    }

    /// Start every registered, not-yet-started service in dependency order.
    ///
    /// Returns the names started by this call, in start order. The first
    /// failing service aborts the whole call; services started before it stay
    /// started.
    pub async fn start_all(&self) -> Result<Vec<String>, LifecycleError> {
        let _transition = self.transition.lock().await;
        let phase_started = Instant::now();
        let mut started = Vec::new();

        loop {
            let (pending, graph, mut satisfied) = {
                let inner = self.lock();
                let pending: Vec<Arc<ServiceRecord>> = inner
                    .records
                    .iter()
                    .filter(|r| inner.states.get(&r.name) == Some(&ServiceState::Registered))
                    .cloned()
                    .collect();
                let satisfied: HashSet<String> = inner
                    .states
                    .iter()
                    .filter(|(_, state)| **state == ServiceState::Started)
                    .map(|(name, _)| name.clone())
                    .collect();
                (pending, inner.graph.clone(), satisfied)
            };

            if pending.is_empty() {
                break;
            }

            let mut progressed = false;
            for record in &pending {
                if !graph.is_satisfied(&record.name, &satisfied) {
                    continue;
                }

                tracing::info!(service = %record.name, "Starting service");
                let outcome = run_bounded(self.timeouts.start_timeout(), record.instance.start()).await;

                if let Err(failure) = outcome {
                    tracing::error!(service = %record.name, error = %failure, "Failed to start service");
                    metrics::record_transition(&record.name, "start", failure.as_label());
                    metrics::record_phase_duration("start_all", phase_started);
                    return Err(LifecycleError::ServiceStart {
                        name: record.name.clone(),
                        source: failure,
                    });
                }

                {
                    let mut inner = self.lock();
                    inner.states.insert(record.name.clone(), ServiceState::Started);
                    inner.start_order.push(record.name.clone());
                }
                metrics::record_transition(&record.name, "start", "ok");
                satisfied.insert(record.name.clone());
                started.push(record.name.clone());
                progressed = true;

                self.notify(EventType::ServiceStarted, &record.name);
            }

            if !progressed {
                let stuck: BTreeSet<String> = pending.iter().map(|r| r.name.clone()).collect();
                tracing::error!(
                    stuck = ?stuck,
                    unregistered = ?graph.unresolved(),
                    "Circular or unsatisfiable dependency detected"
                );
                metrics::record_phase_duration("start_all", phase_started);
                return Err(LifecycleError::UnsatisfiableOrder { stuck });
            }
        }

        metrics::record_phase_duration("start_all", phase_started);
        tracing::info!(started = started.len(), "All services started");
        Ok(started)
    }

    /// Stop every started service, dependents before their dependencies.
    ///
    /// Never fails: individual stop failures are logged and the service is
    /// treated as drained so its dependencies can still stop.
    pub async fn stop_all(&self) -> ShutdownReport {
        let _transition = self.transition.lock().await;
        let phase_started = Instant::now();

        let (mut pending, dependents) = {
            let inner = self.lock();
            let by_name: HashMap<&str, &Arc<ServiceRecord>> =
                inner.records.iter().map(|r| (r.name.as_str(), r)).collect();
            let pending: Vec<Arc<ServiceRecord>> = inner
                .start_order
                .iter()
                .rev()
                .filter(|name| inner.states.get(*name) == Some(&ServiceState::Started))
                .filter_map(|name| by_name.get(name.as_str()).map(|r| Arc::clone(r)))
                .collect();
            (pending, inner.graph.dependents())
        };

        let mut report = ShutdownReport::default();

        while !pending.is_empty() {
            let mut progressed = false;
            let mut blocked = Vec::new();

            for record in pending {
                let waiting_on_dependent = dependents
                    .get(&record.name)
                    .map(|deps| deps.iter().any(|d| self.state_of(d) == Some(ServiceState::Started)))
                    .unwrap_or(false);
                if waiting_on_dependent {
                    blocked.push(record);
                    continue;
                }

                tracing::info!(service = %record.name, "Stopping service");
                match run_bounded(self.timeouts.stop_timeout(), record.instance.stop()).await {
                    Ok(()) => metrics::record_transition(&record.name, "stop", "ok"),
                    Err(failure) => {
                        tracing::error!(service = %record.name, error = %failure, "Error stopping service");
                        metrics::record_transition(&record.name, "stop", failure.as_label());
                        report.failed.push(record.name.clone());
                    }
                }

                self.lock()
                    .states
                    .insert(record.name.clone(), ServiceState::Stopped);
                report.stopped.push(record.name.clone());
                progressed = true;

                self.notify(EventType::ServiceStopped, &record.name);
            }

            pending = blocked;
            if !progressed {
                report.remaining = pending.iter().map(|r| r.name.clone()).collect();
                tracing::error!(remaining = ?report.remaining, "Could not gracefully stop services");
                break;
            }
        }

        metrics::record_phase_duration("stop_all", phase_started);
        tracing::info!(
            stopped = report.stopped.len(),
            failed = report.failed.len(),
            "All services stopped"
        );
        report
    }

    /// Status of every registered service plus uptime and client count.
    ///
    /// A failing service is reported inline and never fails the whole call.
    pub async fn get_status(&self) -> StatusSnapshot {
        let records = self.lock().records.clone();
        let limit = self.timeouts.status_timeout();

        let queries = records.iter().map(|record| async move {
            let status = match run_bounded(limit, record.instance.status()).await {
                Ok(value) => ServiceStatus::Reported(value),
                Err(failure) => {
                    tracing::error!(service = %record.name, error = %failure, "Error getting status for service");
                    ServiceStatus::error(failure.to_string())
                }
            };
            (record.name.clone(), status)
        });
        let services: BTreeMap<String, ServiceStatus> = join_all(queries).await.into_iter().collect();

        StatusSnapshot {
            uptime: self.uptime().as_secs_f64(),
            started_at: canonical_timestamp(&self.started_at()),
            websocket_clients: self.clients.count(),
            services,
        }
    }
}

fn spawn_notifier(clients: Arc<ClientRegistry>) -> mpsc::UnboundedSender<(EventType, String)> {
    let (tx, mut rx) = mpsc::unbounded_channel::<(EventType, String)>();
    tokio::spawn(async move {
        while let Some((event_type, service)) = rx.recv().await {
            clients
                .broadcast(event_type, &event_data([("service", service.as_str())]))
                .await;
        }
    });
    tx
}

async fn run_bounded<T, F>(limit: Option<Duration>, fut: F) -> Result<T, ServiceFailure>
where
    F: Future<Output = Result<T, BoxError>>,
{
    match with_timeout(limit, fut).await {
        Bounded::Completed(Ok(value)) => Ok(value),
        Bounded::Completed(Err(e)) => Err(ServiceFailure::Failed(e)),
        Bounded::Expired(limit) => Err(ServiceFailure::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct Named(&'static str);

    #[async_trait]
    impl Service for Named {
        fn name(&self) -> String {
            self.0.to_string()
        }

        async fn start(&self) -> Result<(), BoxError> {
            Ok(())
        }

        async fn stop(&self) -> Result<(), BoxError> {
            Ok(())
        }

        async fn status(&self) -> Result<Value, BoxError> {
            Ok(json!({ "status": "online", "name": self.0 }))
        }
    }

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(LifecycleConfig::unbounded(), Arc::new(ClientRegistry::default()))
    }

    #[test]
    fn test_registration_normalizes_names() {
        let orch = orchestrator();
        orch.register_service(Named("Api"), &["DB"]).unwrap();

        assert_eq!(orch.registered_names(), vec!["api"]);
        assert_eq!(orch.dependencies_of("API"), Some(vec!["db".to_string()]));
        assert_eq!(orch.state_of("api"), Some(ServiceState::Registered));
        assert!(orch.get_service("aPi").is_some());
        assert!(orch.get_service("db").is_none());
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let orch = orchestrator();
        orch.register_service(Named("db"), &[]).unwrap();
        let err = orch.register_service(Named("DB"), &["cache"]).unwrap_err();

        assert!(matches!(err, LifecycleError::AlreadyRegistered { ref name } if name == "db"));
        assert_eq!(orch.registered_names(), vec!["db"]);
        assert_eq!(orch.dependencies_of("db"), Some(vec![]));
    }

    #[tokio::test]
    async fn test_self_dependency_is_unsatisfiable() {
        let orch = orchestrator();
        orch.register_service(Named("loop"), &["loop"]).unwrap();

        let err = orch.start_all().await.unwrap_err();
        match err {
            LifecycleError::UnsatisfiableOrder { stuck } => {
                assert_eq!(stuck.into_iter().collect::<Vec<_>>(), vec!["loop"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_second_start_all_is_noop() {
        let orch = orchestrator();
        orch.register_service(Named("db"), &[]).unwrap();

        assert_eq!(orch.start_all().await.unwrap(), vec!["db"]);
        assert!(orch.start_all().await.unwrap().is_empty());
        assert_eq!(orch.start_order(), vec!["db"]);
    }

    #[tokio::test]
    async fn test_stop_all_skips_services_never_started() {
        let orch = orchestrator();
        orch.register_service(Named("db"), &[]).unwrap();
        orch.register_service(Named("api"), &["ghost"]).unwrap();

        assert!(orch.start_all().await.is_err());
        let report = orch.stop_all().await;

        assert_eq!(report.stopped, vec!["db"]);
        assert_eq!(orch.state_of("api"), Some(ServiceState::Registered));
        assert_eq!(orch.state_of("db"), Some(ServiceState::Stopped));
    }
}
