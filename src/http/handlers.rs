//! Request handlers.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::health::{HealthReport, RootStatus};
use crate::http::server::AppState;
use crate::services::{DemoRequest, DemoResponse};

/// Liveness: `{"status": "online", "version": ...}`.
pub async fn root(State(state): State<AppState>) -> Json<RootStatus> {
    Json(state.aggregator.root())
}

/// Detailed health including every service's status.
pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.aggregator.health().await)
}

pub async fn demo(
    State(state): State<AppState>,
    Json(request): Json<DemoRequest>,
) -> Result<Json<DemoResponse>, (StatusCode, Json<Value>)> {
    state.demo.handle(request).await.map(Json).map_err(|e| {
        tracing::warn!(error = %e, "Demo request failed");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": e.to_string() })),
        )
    })
}
