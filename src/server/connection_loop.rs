// src/server/connection_loop.rs

//! Contains the main server loop for accepting connections and draining them
//! on shutdown.

use super::context::ServerContext;
use crate::connection::{ConnectionGuard, RequestHandler};
use crate::core::{InflightError, metrics};
use anyhow::{Result, anyhow};
use std::future::Future;
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long background tasks get to stop after the drain completed.
const BACKGROUND_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolves on the first SIGINT or SIGTERM.
pub fn os_shutdown_signal() -> Result<impl Future<Output = ()>> {
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow!("Failed to register SIGINT handler: {}", e))?;
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow!("Failed to register SIGTERM handler: {}", e))?;

    Ok(async move {
        tokio::select! {
            _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
            _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),
        }
    })
}

/// The main server loop. Accepts connections until `shutdown` resolves or a
/// background task fails, then waits for every in-flight request to finish.
///
/// Returns an error when the loop was ended by a failed background task.
pub async fn run<F>(ctx: ServerContext, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let ServerContext {
        state,
        listener,
        shutdown_tx,
        drain_tx,
        mut background_tasks,
    } = ctx;
    let mut client_tasks = JoinSet::new();
    let mut fatal: Option<anyhow::Error> = None;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                break;
            }

            Some(res) = background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => {
                        error!("CRITICAL: Background task failed: {}. Shutting down.", e);
                        fatal = Some(e);
                        break;
                    }
                    Err(e) => {
                        error!("CRITICAL: Background task panicked: {e:?}. Shutting down.");
                        fatal = Some(anyhow!("background task panicked: {e}"));
                        break;
                    }
                }
            },

            res = listener.accept() => {
                match res {
                    Ok((socket, addr)) => {
                        debug!("Accepted new connection from: {}", addr);
                        state.totals.record_accepted();
                        metrics::CONNECTIONS_ACCEPTED_TOTAL.inc();

                        // Register before spawning.
                        let guard = ConnectionGuard::new(state.tracker.register(), addr);
                        let drain_rx = drain_tx.subscribe();
                        let state_clone = state.clone();
                        client_tasks.spawn(async move {
                            let _guard = guard;
                            let handler = RequestHandler::new(socket, addr, state_clone, drain_rx);
                            match handler.run().await {
                                Ok(_) => {}
                                Err(
                                    e @ (InflightError::ShutdownBeforeRequest
                                    | InflightError::ConnectionClosed),
                                ) => debug!("Connection from {} ended without a request: {}", addr, e),
                                Err(e) => warn!("Request from {} failed: {}", addr, e),
                            }
                        });
                    }
                    Err(e) => error!("Failed to accept connection: {}", e),
                }
            },

            Some(res) = client_tasks.join_next() => {
                if let Err(e) = res
                    && e.is_panic()
                {
                    error!("A request handler panicked: {e:?}");
                }
            },
        }
    }

    drop(listener);
    if drain_tx.send(()).is_err() {
        debug!("No connection was waiting for a request head.");
    }
    info!(
        "Stopped accepting connections. Waiting for {} in-flight request(s) to finish...",
        state.tracker.pending()
    );
    state.tracker.wait_idle().await;
    while let Some(res) = client_tasks.join_next().await {
        if let Err(e) = res
            && e.is_panic()
        {
            error!("A request handler panicked: {e:?}");
        }
    }
    info!("All connections have been handled.");

    if shutdown_tx.send(()).is_err() {
        debug!("No background task was listening for the shutdown signal.");
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(BACKGROUND_SHUTDOWN_TIMEOUT, async {
        while background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    }
    info!("Server shutdown complete. {}.", state.totals.snapshot());

    match fatal {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
