//! Periodic heartbeat broadcast to connected clients.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;

use crate::broadcast::{event_data, ClientRegistry, EventType, EventValue};
use crate::lifecycle::{BoxError, Service, Shutdown, ShutdownSignal};

struct Worker {
    shutdown: Shutdown,
    handle: JoinHandle<()>,
}

/// Broadcasts a `heartbeat` event every `interval`.
pub struct HeartbeatService {
    clients: Arc<ClientRegistry>,
    interval: Option<Duration>,
    beats: Arc<AtomicU64>,
    worker: Mutex<Option<Worker>>,
}

impl HeartbeatService {
    /// `None` keeps the service registered but idle.
    pub fn new(clients: Arc<ClientRegistry>, interval: Option<Duration>) -> Self {
        Self {
            clients,
            interval,
            beats: Arc::new(AtomicU64::new(0)),
            worker: Mutex::new(None),
        }
    }

    pub fn beats(&self) -> u64 {
        self.beats.load(Ordering::Relaxed)
    }

    async fn run(
        clients: Arc<ClientRegistry>,
        beats: Arc<AtomicU64>,
        period: Duration,
        mut shutdown: ShutdownSignal,
    ) {
        let mut ticker = time::interval(period);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let beat = beats.fetch_add(1, Ordering::Relaxed) + 1;
                    let now = Utc::now();
                    let data = event_data([
                        ("beat", EventValue::from(beat)),
                        ("sent_at", EventValue::from(now)),
                        ("clients", EventValue::from(event_data([
                            ("count", EventValue::from(clients.count())),
                            ("checked_at", EventValue::from(now)),
                        ]))),
                    ]);
                    clients.broadcast(EventType::Heartbeat, &data).await;
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Heartbeat loop received shutdown signal");
                    break;
                }
            }
        }
    }
}

#[async_trait]
impl Service for HeartbeatService {
    async fn start(&self) -> Result<(), BoxError> {
        let Some(period) = self.interval else {
            tracing::info!("Heartbeat disabled");
            return Ok(());
        };

        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            return Err("heartbeat already running".into());
        }

        let shutdown = Shutdown::new();
        let handle = tokio::spawn(Self::run(
            Arc::clone(&self.clients),
            Arc::clone(&self.beats),
            period,
            shutdown.subscribe(),
        ));
        *worker = Some(Worker { shutdown, handle });

        tracing::info!(interval = ?period, "Heartbeat started");
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        let Some(worker) = self.worker.lock().await.take() else {
            return Ok(());
        };

        worker.shutdown.trigger();
        worker.handle.await?;
        tracing::info!(beats = self.beats(), "Heartbeat stopped");
        Ok(())
    }

    async fn status(&self) -> Result<Value, BoxError> {
        let running = self.worker.lock().await.is_some();
        Ok(json!({
            "status": if running { "online" } else { "offline" },
            "beats": self.beats(),
            "interval_secs": self.interval.map(|d| d.as_secs_f64()),
        }))
    }
}
