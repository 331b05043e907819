//! Service orchestrator.
//!
//! # Architecture Overview
//!
//! ```text
//!                  ┌──────────────────────────────────────────────────────┐
//!                  │                  SERVICE ORCHESTRATOR                 │
//!                  │                                                       │
//!   HTTP client    │  ┌─────────┐   ┌──────────────┐   ┌────────────────┐ │
//!   ───────────────┼─▶│  http   │──▶│   health     │──▶│  orchestrator  │ │
//!                  │  │ server  │   │  aggregator  │   │ (lifecycle)    │ │
//!                  │  └────┬────┘   └──────────────┘   └───────┬────────┘ │
//!                  │       │                                    │          │
//!   WebSocket      │  ┌────▼────┐   ┌──────────────┐   ┌───────▼────────┐ │
//!   ◀──────────────┼──│   ws    │◀──│  broadcast   │◀──│   services     │ │
//!                  │  │ writer  │   │  registry    │   │ heartbeat/demo │ │
//!                  │  └─────────┘   └──────────────┘   └────────────────┘ │
//!                  └──────────────────────────────────────────────────────┘
//! ```
//!
//! Startup order: config → logging → metrics → services (dependency order)
//! → listener. A registration or startup failure exits non-zero before the
//! listener is bound. SIGINT/SIGTERM drains the server, then stops services
//! in reverse start order.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use service_orchestrator::broadcast::ClientRegistry;
use service_orchestrator::config::load_or_default;
use service_orchestrator::http::{AppState, HttpServer};
use service_orchestrator::lifecycle::{bootstrap, signals, Orchestrator, Shutdown};
use service_orchestrator::observability::{logging, metrics};
use service_orchestrator::services::BuiltinServices;

#[derive(Parser)]
#[command(name = "service-orchestrator", version, about = "Service lifecycle orchestrator")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "orchestrator.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_default(&args.config)?;

    logging::init_logging(&config.observability)?;
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-orchestrator starting");
    tracing::info!(
        config = %args.config.display(),
        bind_address = %config.server.bind_address,
        api_prefix = %config.server.api_prefix,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let clients = Arc::new(ClientRegistry::from_config(&config.broadcast));
    let orchestrator = Arc::new(Orchestrator::new(
        config.lifecycle.clone(),
        Arc::clone(&clients),
    ));

    let services = BuiltinServices::new(&clients, &config.broadcast);
    match bootstrap(&orchestrator, services.entries()).await {
        Ok(order) => tracing::info!(order = ?order, "All services started"),
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    }

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal_task = signals::spawn_signal_listener(shutdown.clone());

    let state = AppState::new(&config, Arc::clone(&orchestrator), Arc::clone(&services.demo));
    let served = HttpServer::new(&config, state)
        .run(listener, shutdown.subscribe())
        .await;
    signal_task.abort();
    tracing::info!(signalled = shutdown.is_triggered(), "Server loop exited");

    let report = orchestrator.stop_all().await;
    tracing::info!(
        stopped = report.stopped.len(),
        failed = report.failed.len(),
        remaining = report.remaining.len(),
        "Shutdown complete"
    );

    served?;
    Ok(())
}
