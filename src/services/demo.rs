//! Demo service behind the authenticated API.
//!
//! Echoes the submitted value and announces it to every connected client as
//! a `new_event`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::broadcast::{canonical_timestamp, event_data, ClientRegistry, EventType, EventValue};
use crate::lifecycle::{BoxError, Service};

/// Body of `POST {api_prefix}/demo/demo`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DemoRequest {
    pub demo: String,
}

/// Reply to a demo request.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DemoResponse {
    pub demo: String,
    /// Clients that received the resulting `new_event`.
    pub delivered: usize,
}

pub struct DemoService {
    clients: Arc<ClientRegistry>,
    online: AtomicBool,
    requests: AtomicU64,
    last_request: Mutex<Option<DateTime<Utc>>>,
}

impl DemoService {
    pub fn new(clients: Arc<ClientRegistry>) -> Self {
        Self {
            clients,
            online: AtomicBool::new(false),
            requests: AtomicU64::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }

    pub async fn handle(&self, request: DemoRequest) -> Result<DemoResponse, BoxError> {
        if !self.online.load(Ordering::Acquire) {
            return Err("demo service is not running".into());
        }

        let received_at = Utc::now();
        let count = self.requests.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_request.lock().unwrap_or_else(PoisonError::into_inner) = Some(received_at);

        tracing::debug!(request = count, "Demo request received");

        let data = event_data([
            ("source", EventValue::from("demo")),
            ("demo", EventValue::from(request.demo.as_str())),
            ("request", EventValue::from(count)),
            ("received_at", EventValue::from(received_at)),
        ]);
        let report = self.clients.broadcast(EventType::NewEvent, &data).await;

        Ok(DemoResponse {
            demo: request.demo,
            delivered: report.delivered,
        })
    }
}

#[async_trait]
impl Service for DemoService {
    async fn start(&self) -> Result<(), BoxError> {
        self.online.store(true, Ordering::Release);
        Ok(())
    }

    async fn stop(&self) -> Result<(), BoxError> {
        self.online.store(false, Ordering::Release);
        Ok(())
    }

    async fn status(&self) -> Result<Value, BoxError> {
        let last = *self.last_request.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(json!({
            "status": if self.online.load(Ordering::Acquire) { "online" } else { "offline" },
            "requests": self.requests(),
            "last_request": last.as_ref().map(canonical_timestamp),
        }))
    }
}
