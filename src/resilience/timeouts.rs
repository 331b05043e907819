//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap service lifecycle calls and client sends with an optional deadline
//! - Cancel operations cleanly on timeout
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - `None` means no deadline: the call is awaited as-is
//! - Timeout errors are distinct from other errors

use std::future::Future;
use std::time::Duration;

/// Outcome of a bounded call.
#[derive(Debug)]
pub enum Bounded<T, E> {
    /// The call finished (successfully or not) before the deadline.
    Completed(Result<T, E>),
    /// The deadline expired first; the call was dropped.
    Expired(Duration),
}

/// Await `fut`, giving up after `limit` if one is set.
pub async fn with_timeout<T, E, F>(limit: Option<Duration>, fut: F) -> Bounded<T, E>
where
    F: Future<Output = Result<T, E>>,
{
    match limit {
        Some(limit) => match tokio::time::timeout(limit, fut).await {
            Ok(result) => Bounded::Completed(result),
            Err(_) => Bounded::Expired(limit),
        },
        None => Bounded::Completed(fut.await),
    }
}
