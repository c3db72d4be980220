// src/server/initialization.rs

//! Handles server initialization: shared state setup and binding the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

/// Initializes all server components before starting the main loop.
///
/// Binding is attempted exactly once. Failure is returned to the caller, which
/// ends the process before any request is served.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);
    let (drain_tx, _) = broadcast::channel(1);

    let server_state = ServerState::initialize(config);
    info!("Server state initialized.");

    let (host, port) = (server_state.config.host.clone(), server_state.config.port);
    info!("Server starting on port {}...", port);
    let listener = match TcpListener::bind((host.as_str(), port)).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to start server: {}", e);
            return Err(e).with_context(|| format!("Failed to bind {host}:{port}"));
        }
    };
    info!("Inflight server listening on {}", listener.local_addr()?);

    Ok(ServerContext {
        state: server_state,
        listener,
        shutdown_tx,
        drain_tx,
        background_tasks: JoinSet::new(),
    })
}

/// Logs key configuration parameters at startup.
fn log_startup_info(config: &Config) {
    info!(
        "Memory statistics will be sampled every {:?}.",
        config.memory_sample_interval()
    );
    warn!(
        "No connection limit is enforced: every accepted connection gets its own task."
    );
}
