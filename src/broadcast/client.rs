//! Connected client handles.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Unique client identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ClientId(pub Uuid);

impl ClientId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ClientId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client_{}", self.0)
    }
}

/// Failure to deliver a payload to one client.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The client's connection is gone.
    #[error("client connection closed")]
    Closed,

    /// The send did not complete within the configured deadline.
    #[error("send timed out after {0:?}")]
    TimedOut(Duration),

    /// Any other transport failure.
    #[error("send failed: {0}")]
    Failed(String),
}

/// An opaque handle able to receive a text payload.
#[async_trait]
pub trait ClientSink: Send + Sync {
    async fn send_text(&self, text: String) -> Result<(), DeliveryError>;
}

/// A WebSocket connection is represented by the sending half of its outbound
/// queue; the connection's writer task owns the receiver and drops it when the
/// socket fails, which turns every later send into `Closed`.
#[async_trait]
impl ClientSink for mpsc::Sender<String> {
    async fn send_text(&self, text: String) -> Result<(), DeliveryError> {
        self.send(text).await.map_err(|_| DeliveryError::Closed)
    }
}
