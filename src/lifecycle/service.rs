//! The service contract driven by the orchestrator.

use async_trait::async_trait;
use serde_json::Value;

use crate::lifecycle::error::BoxError;

/// A named unit of long-running behavior.
///
/// Services know nothing about each other; ordering between them is expressed
/// only through the dependency names given at registration.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use serde_json::{json, Value};
/// use service_orchestrator::lifecycle::{BoxError, Service};
///
/// struct CacheWarmer;
///
/// #[async_trait]
/// impl Service for CacheWarmer {
///     async fn start(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
///
///     async fn stop(&self) -> Result<(), BoxError> {
///         Ok(())
///     }
///
///     async fn status(&self) -> Result<Value, BoxError> {
///         Ok(json!({ "status": "online" }))
///     }
/// }
///
/// assert_eq!(CacheWarmer.name(), "cachewarmer");
/// ```
#[async_trait]
pub trait Service: Send + Sync {
    /// Unique service name. Defaults to the implementing type's name, lowercased.
    fn name(&self) -> String {
        type_name_of::<Self>()
    }

    /// Initialize and start the service.
    async fn start(&self) -> Result<(), BoxError>;

    /// Clean up and stop the service.
    async fn stop(&self) -> Result<(), BoxError>;

    /// Report service status. Must not fail for normal operational states.
    async fn status(&self) -> Result<Value, BoxError>;
}

/// Lowercased, path-free, generic-free name of `T`.
pub fn type_name_of<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base).to_lowercase()
}

/// Case-normalize a service or dependency name.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
