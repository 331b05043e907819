//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the orchestrator.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the orchestrator process.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// HTTP/WebSocket server settings.
    pub server: ServerConfig,

    /// Bearer token authentication for the API routes.
    pub auth: AuthConfig,

    /// Per-service lifecycle timeouts.
    pub lifecycle: LifecycleConfig,

    /// Client broadcast settings.
    pub broadcast: BroadcastConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:6502").
    pub bind_address: String,

    /// Prefix under which the authenticated API is mounted.
    pub api_prefix: String,

    /// Request timeout for plain HTTP routes in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:6502".to_string(),
            api_prefix: "/api/v1".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// API authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Bearer token expected on API requests.
    pub api_token: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            // WARNING: This is a placeholder! Override via ORCHESTRATOR_API_TOKEN.
            api_token: "your-secure-token".to_string(),
        }
    }
}

/// Lifecycle timeouts. A value of zero disables the timeout.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Maximum time a single `start` may take, in seconds.
    pub start_timeout_secs: u64,

    /// Maximum time a single `stop` may take, in seconds.
    pub stop_timeout_secs: u64,

    /// Maximum time a single `status` query may take, in seconds.
    pub status_timeout_secs: u64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            start_timeout_secs: 30,
            stop_timeout_secs: 30,
            status_timeout_secs: 5,
        }
    }
}

impl LifecycleConfig {
    pub fn start_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.start_timeout_secs)
    }

    pub fn stop_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.stop_timeout_secs)
    }

    pub fn status_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.status_timeout_secs)
    }

    /// Configuration with every timeout disabled.
    pub fn unbounded() -> Self {
        Self {
            start_timeout_secs: 0,
            stop_timeout_secs: 0,
            status_timeout_secs: 0,
        }
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

/// Client broadcast configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BroadcastConfig {
    /// Maximum time a single client send may take, in milliseconds (0 = unbounded).
    pub send_timeout_ms: u64,

    /// Outbound queue size per WebSocket client.
    pub client_queue_size: usize,

    /// Interval of the heartbeat service in seconds (0 disables it).
    pub heartbeat_interval_secs: u64,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            send_timeout_ms: 1000,
            client_queue_size: 64,
            heartbeat_interval_secs: 30,
        }
    }
}

impl BroadcastConfig {
    pub fn send_timeout(&self) -> Option<Duration> {
        (self.send_timeout_ms > 0).then(|| Duration::from_millis(self.send_timeout_ms))
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        non_zero_secs(self.heartbeat_interval_secs)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
