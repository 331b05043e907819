//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

use service_orchestrator::broadcast::{ClientRegistry, ClientSink, DeliveryError};
use service_orchestrator::config::LifecycleConfig;
use service_orchestrator::lifecycle::{BoxError, Orchestrator, Service};

/// Ordered record of lifecycle calls shared by every fake service in a test.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    /// Service names for one kind of call ("start" or "stop"), in call order.
    pub fn names(&self, call: &str) -> Vec<String> {
        let prefix = format!("{call}:");
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }
}

/// Configurable fake service.
pub struct FakeService {
    name: String,
    log: CallLog,
    fail_start: bool,
    fail_stop: bool,
    fail_status: bool,
    start_delay: Option<Duration>,
}

impl FakeService {
    pub fn new(name: &str, log: &CallLog) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            fail_start: false,
            fail_stop: false,
            fail_status: false,
            start_delay: None,
        }
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn failing_status(mut self) -> Self {
        self.fail_status = true;
        self
    }

    pub fn slow_start(mut self, delay: Duration) -> Self {
        self.start_delay = Some(delay);
        self
    }
}

#[async_trait]
impl Service for FakeService {
    fn name(&self) -> String {
        self.name.clone()
    }

    async fn start(&self) -> Result<(), BoxError> {
        self.log.push(format!("start:{}", self.name));
        if let Some(delay) = self.start_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_start {
            return Err(format!("{} refused to start", self.name).into());
        }
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.log.push(format!("stop:{}", self.name));
        if self.fail_stop {
            return Err(format!("{} refused to stop", self.name).into());
        }
        Ok(())
    }

    async fn status(&self) -> Result<Value, BoxError> {
        if self.fail_status {
            return Err("status unavailable".into());
        }
        Ok(json!({ "status": "online" }))
    }
}

pub fn orchestrator() -> Orchestrator {
    Orchestrator::new(LifecycleConfig::unbounded(), Arc::new(ClientRegistry::default()))
}

pub fn orchestrator_with(timeouts: LifecycleConfig, clients: Arc<ClientRegistry>) -> Orchestrator {
    Orchestrator::new(timeouts, clients)
}

/// A client whose transport always fails.
pub struct BrokenClient;

#[async_trait]
impl ClientSink for BrokenClient {
    async fn send_text(&self, _text: String) -> Result<(), DeliveryError> {
        Err(DeliveryError::Failed("connection reset".into()))
    }
}

/// A client whose send never completes.
pub struct StalledClient;

#[async_trait]
impl ClientSink for StalledClient {
    async fn send_text(&self, _text: String) -> Result<(), DeliveryError> {
        std::future::pending::<()>().await;
        Ok(())
    }
}

/// A healthy client that takes `delay` to accept each payload.
pub struct SlowClient {
    pub delay: Duration,
    pub received: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ClientSink for SlowClient {
    async fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        tokio::time::sleep(self.delay).await;
        self.received.lock().unwrap().push(text);
        Ok(())
    }
}

/// A healthy client backed by a channel.
pub fn channel_client(registry: &ClientRegistry) -> (service_orchestrator::broadcast::ClientId, mpsc::Receiver<String>) {
    let (tx, rx) = mpsc::channel(16);
    let id = registry.add_client(Arc::new(tx));
    (id, rx)
}
