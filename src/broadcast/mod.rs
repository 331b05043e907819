//! Client broadcast subsystem.
//!
//! # Data Flow
//! ```text
//! Transport shell:
//!     WebSocket handshake complete → registry.add_client(sink)
//!     Disconnect (cleanup path)    → registry.remove_client(id)
//!
//! Any service:
//!     registry.broadcast(event_type, data)
//!     → event.rs (normalize timestamps, stamp event, serialize once)
//!     → snapshot of connected clients
//!     → send to each client concurrently (per-send deadline)
//!     → prune the clients that failed
//! ```
//!
//! # Design Decisions
//! - Fire-and-forget: delivery failures never reach the producer
//! - Two-phase sweep: failures are collected first and pruned afterwards,
//!   so one failing client never affects delivery to the others
//! - Empty registry short-circuits before any serialization

pub mod client;
pub mod event;
pub mod registry;

pub use client::{ClientId, ClientSink, DeliveryError};
pub use event::{canonical_timestamp, event_data, Event, EventData, EventType, EventValue};
pub use registry::{BroadcastReport, ClientRegistry};
