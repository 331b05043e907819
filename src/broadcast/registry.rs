//! Registry of connected real-time clients with fan-out broadcast.

use dashmap::DashMap;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;

use crate::broadcast::client::{ClientId, ClientSink, DeliveryError};
use crate::broadcast::event::{Event, EventData, EventType};
use crate::config::BroadcastConfig;
use crate::observability::metrics;
use crate::resilience::{with_timeout, Bounded};

/// Result of one broadcast call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that received the event.
    pub delivered: usize,
    /// Clients whose delivery failed; they are no longer registered.
    pub pruned: Vec<ClientId>,
}

/// The set of currently-connected clients.
///
/// Membership changes go through the concurrent map; a broadcast sends to a
/// snapshot of the members and prunes the failed ones only after every send
/// has finished.
pub struct ClientRegistry {
    clients: DashMap<ClientId, Arc<dyn ClientSink>>,
    send_timeout: Option<Duration>,
}

impl ClientRegistry {
    pub fn new(send_timeout: Option<Duration>) -> Self {
        Self {
            clients: DashMap::new(),
            send_timeout,
        }
    }

    pub fn from_config(config: &BroadcastConfig) -> Self {
        Self::new(config.send_timeout())
    }

    /// Register a client whose transport handshake has completed.
    pub fn add_client(&self, sink: Arc<dyn ClientSink>) -> ClientId {
        let id = ClientId::new();
        self.clients.insert(id, sink);

        let total = self.clients.len();
        metrics::set_connected_clients(total);
        tracing::info!(client_id = %id, clients = total, "Client connected");
        id
    }

    /// Discard a client. Unknown ids are ignored.
    pub fn remove_client(&self, id: &ClientId) -> bool {
        let removed = self.clients.remove(id).is_some();
        let remaining = self.clients.len();
        metrics::set_connected_clients(remaining);

        if removed {
            tracing::info!(client_id = %id, clients = remaining, "Client disconnected");
        } else {
            tracing::debug!(client_id = %id, "Client already removed");
        }
        removed
    }

    /// Number of connected clients.
    pub fn count(&self) -> usize {
        self.clients.len()
    }

    pub fn contains(&self, id: &ClientId) -> bool {
        self.clients.contains_key(id)
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(|entry| *entry.key()).collect()
    }

    /// Deliver an event to every connected client.
    ///
    /// Failures are logged and the failing clients pruned; nothing is
    /// reported back as an error.
    pub async fn broadcast(&self, event_type: EventType, data: &EventData) -> BroadcastReport {
        if self.clients.is_empty() {
            return BroadcastReport::default();
        }

        let event = Event::new(event_type, data);
        let payload = match event.to_json() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(event_type = %event_type, error = %e, "Failed to serialize event");
                return BroadcastReport::default();
            }
        };

        let targets: Vec<(ClientId, Arc<dyn ClientSink>)> = self
            .clients
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let sends = targets.into_iter().map(|(id, sink)| {
            let payload = payload.clone();
            async move { (id, self.deliver(sink.as_ref(), payload).await) }
        });
        let results = join_all(sends).await;

        let mut report = BroadcastReport::default();
        for (id, result) in results {
            match result {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    tracing::error!(client_id = %id, error = %e, "Failed to send to client");
                    report.pruned.push(id);
                }
            }
        }

        for id in &report.pruned {
            self.clients.remove(id);
        }

        metrics::record_broadcast(event_type.as_str(), report.delivered, report.pruned.len());
        if !report.pruned.is_empty() {
            let remaining = self.clients.len();
            metrics::set_connected_clients(remaining);
            tracing::info!(
                pruned = report.pruned.len(),
                clients = remaining,
                "Pruned dead clients"
            );
        }

        report
    }

    async fn deliver(&self, sink: &dyn ClientSink, payload: String) -> Result<(), DeliveryError> {
        match with_timeout(self.send_timeout, sink.send_text(payload)).await {
            Bounded::Completed(result) => result,
            Bounded::Expired(limit) => Err(DeliveryError::TimedOut(limit)),
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new(None)
    }
}
