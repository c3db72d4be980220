// src/server/mod.rs

use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::Result;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

mod connection_loop;
mod context;
mod initialization;
mod metrics_server;
mod spawner;

pub use metrics_server::router as metrics_router;

/// A bound server that has not started accepting yet.
pub struct Server {
    ctx: context::ServerContext,
}

impl Server {
    /// Initializes state and binds the listener. Fails if the port cannot be bound.
    pub async fn bind(config: Config) -> Result<Self> {
        let ctx = initialization::setup(config).await?;
        Ok(Self { ctx })
    }

    /// The address the listener is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.ctx.listener.local_addr()?)
    }

    /// The state shared with every request handler.
    pub fn state(&self) -> Arc<ServerState> {
        self.ctx.state.clone()
    }

    /// Adds a task supervised like the built-in background tasks.
    ///
    /// If it fails or panics, the server stops accepting, drains in-flight
    /// requests and `serve_until` returns an error. It must exit on its own
    /// once serving has ended, or it is abandoned after the shutdown deadline.
    pub fn spawn_background<T>(&mut self, task: T)
    where
        T: Future<Output = Result<()>> + Send + 'static,
    {
        self.ctx.background_tasks.spawn(task);
    }

    /// Spawns the background tasks and serves until `shutdown` resolves,
    /// then drains in-flight requests.
    pub async fn serve_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        spawner::spawn_all(&mut self.ctx).await?;
        connection_loop::run(self.ctx, shutdown).await
    }
}

/// The main server startup function: binds, then serves until SIGINT or SIGTERM.
pub async fn run(config: Config) -> Result<()> {
    let server = Server::bind(config).await?;
    let shutdown = connection_loop::os_shutdown_signal()?;
    server.serve_until(shutdown).await
}
