//! queue-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use queue_gateway::api;
use queue_gateway::app_state::AppState;
use queue_gateway::config::{QueueConfig, StoreBackend};
use queue_gateway::hub::Hub;
use queue_gateway::persistence::{MemoryStore, PostgresStore, Store};
use queue_gateway::ws::HeartbeatConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = QueueConfig::from_env()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        addr = %config.listen_addr,
        backend = ?config.store_backend,
        "starting queue-gateway"
    );

    // Build persistence layer
    let store = match config.store_backend {
        StoreBackend::Postgres => {
            let store = PostgresStore::connect(&config)
                .await
                .context("database unavailable")?;
            if config.database_run_migrations {
                store.migrate().await.context("migrations failed")?;
            }
            Store::Postgres(store)
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; tickets are lost on restart");
            Store::Memory(MemoryStore::new())
        }
    };

    // Build application state
    let hub = Hub::spawn(config.hub_subscriber_buffer);
    let app_state = AppState::new(store, hub, HeartbeatConfig::from_config(&config));

    // Build router
    let app = api::build_app(app_state, config.request_timeout());

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
