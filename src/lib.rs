//! Service lifecycle orchestrator with real-time client broadcast.

pub mod broadcast;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod services;

pub use broadcast::{ClientRegistry, EventType};
pub use config::OrchestratorConfig;
pub use http::HttpServer;
pub use lifecycle::{LifecycleError, Orchestrator, Service, Shutdown};
