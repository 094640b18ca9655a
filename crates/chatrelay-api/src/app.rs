//! Application builder: wires stores, state, and the router, then serves.

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use chatrelay_cache::PresenceManager;
use chatrelay_core::config::AppConfig;
use chatrelay_core::error::AppError;
use chatrelay_database::Stores;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state)
}

/// Runs the ChatRelay server until Ctrl+C or SIGTERM.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting ChatRelay server...");

    // ── Step 1: Stores ───────────────────────────────────────────
    let stores = Stores::from_config(&config.database).await?;

    info!(
        "Initializing presence (provider: {})...",
        config.presence.provider
    );
    let presence = Arc::new(PresenceManager::new(&config.presence).await?);

    // ── Step 2: State and engine ─────────────────────────────────
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::new(
        config,
        Arc::clone(&stores.messages),
        Arc::clone(&stores.users),
        presence,
    );
    let engine = state.engine.clone();

    // ── Step 3: Serve ────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("ChatRelay server listening on {}", addr);

    let result = axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")));

    // ── Step 4: Teardown ─────────────────────────────────────────
    engine.shutdown().await;
    if let Some(pool) = &stores.pool {
        pool.close().await;
    }
    info!("ChatRelay server stopped");

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
