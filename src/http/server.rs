//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, CORS, request timeout, bearer auth)
//! - Serve on a listener until the shutdown signal fires

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::OrchestratorConfig;
use crate::health::StatusAggregator;
use crate::http::{auth, handlers, websocket};
use crate::lifecycle::{Orchestrator, ShutdownSignal};
use crate::services::DemoService;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub aggregator: StatusAggregator,
    pub demo: Arc<DemoService>,
    pub api_token: Arc<str>,
    pub client_queue_size: usize,
}

impl AppState {
    pub fn new(
        config: &OrchestratorConfig,
        orchestrator: Arc<Orchestrator>,
        demo: Arc<DemoService>,
    ) -> Self {
        Self {
            aggregator: StatusAggregator::new(Arc::clone(&orchestrator)),
            orchestrator,
            demo,
            api_token: Arc::from(config.auth.api_token.as_str()),
            client_queue_size: config.broadcast.client_queue_size,
        }
    }
}

/// HTTP and WebSocket front end of the orchestrator.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &OrchestratorConfig, state: AppState) -> Self {
        Self {
            router: build_router(config, state),
        }
    }

    /// Run the server until `shutdown` fires, then drain open requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &OrchestratorConfig, state: AppState) -> Router {
    let api = Router::new()
        .route("/demo/demo", post(handlers::demo))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health).post(handlers::health))
        .route("/ws", get(websocket::ws_handler))
        .nest(&config.server.api_prefix, api)
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
