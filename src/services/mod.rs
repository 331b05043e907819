//! Built-in services managed by the orchestrator.
//!
//! ```text
//! heartbeatservice  (no dependencies)
//! demoservice       → heartbeatservice
//! ```

pub mod demo;
pub mod heartbeat;

pub use demo::{DemoRequest, DemoResponse, DemoService};
pub use heartbeat::HeartbeatService;

use std::sync::Arc;

use crate::broadcast::ClientRegistry;
use crate::config::BroadcastConfig;
use crate::lifecycle::ServiceEntry;

/// Handles to the built-in services the HTTP shell talks to directly.
pub struct BuiltinServices {
    pub heartbeat: Arc<HeartbeatService>,
    pub demo: Arc<DemoService>,
}

impl BuiltinServices {
    pub fn new(clients: &Arc<ClientRegistry>, config: &BroadcastConfig) -> Self {
        Self {
            heartbeat: Arc::new(HeartbeatService::new(
                Arc::clone(clients),
                config.heartbeat_interval(),
            )),
            demo: Arc::new(DemoService::new(Arc::clone(clients))),
        }
    }

    /// Registration list in dependency-declaration form.
    pub fn entries(&self) -> Vec<ServiceEntry> {
        vec![
            ServiceEntry::new(self.demo.clone(), &["heartbeatservice"]),
            ServiceEntry::new(self.heartbeat.clone(), &[]),
        ]
    }
}
