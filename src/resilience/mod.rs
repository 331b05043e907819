//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator (start / stop / status)     Broadcast registry (client send)
//!     → timeouts.rs (optional deadline)        → timeouts.rs (optional deadline)
//!     → Completed(result) | Expired(limit)     → Completed(result) | Expired(limit)
//! ```
//!
//! # Design Decisions
//! - A single start attempt per service: no retries or backoff at this layer
//! - Expiry is reported as that call's failure and handled by the caller's policy

pub mod timeouts;

pub use timeouts::{with_timeout, Bounded};
