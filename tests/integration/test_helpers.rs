// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use inflight::config::Config;
use inflight::core::state::ServerState;
use inflight::server::Server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub const GET_ROOT: &str = "GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";

/// Sets up minimal tracing for tests (ignores the error if already initialized).
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// A loopback configuration on an ephemeral port with the given delay range.
pub fn test_config(min_delay_ms: u64, max_delay_ms: u64) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        min_delay_ms,
        max_delay_ms,
        memory_sample_interval_secs: 1,
        ..Config::default()
    }
}

/// Shared state for driving handlers directly, without a listener.
pub fn test_state(min_delay_ms: u64, max_delay_ms: u64) -> Arc<ServerState> {
    init_tracing();
    ServerState::initialize(test_config(min_delay_ms, max_delay_ms))
}

pub fn test_addr() -> SocketAddr {
    "127.0.0.1:40000".parse().unwrap()
}

/// A drain channel for handlers driven directly. Keep the sender alive for
/// as long as the handler should keep waiting for its request.
pub fn drain_channel() -> broadcast::Sender<()> {
    broadcast::channel(1).0
}

/// A server running on a background task, stoppable through a oneshot.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl TestServer {
    pub async fn start(config: Config) -> Self {
        Self::start_with(config, |_| {}).await
    }

    /// Like `start`, but lets the caller adjust the bound server before it serves.
    pub async fn start_with<F>(config: Config, prepare: F) -> Self
    where
        F: FnOnce(&mut Server),
    {
        init_tracing();
        let mut server = Server::bind(config).await.expect("Failed to bind test server");
        prepare(&mut server);
        let addr = server.local_addr().expect("Listener has no local address");
        let state = server.state();

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_until(async move {
            let _ = shutdown_rx.await;
        }));

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Asks the server to stop accepting and drain.
    pub fn trigger_shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the server to stop on its own, without triggering shutdown.
    pub async fn wait(self) -> anyhow::Result<()> {
        let TestServer {
            shutdown_tx, handle, ..
        } = self;
        let result = handle.await.expect("Server task panicked");
        drop(shutdown_tx);
        result
    }

    /// Triggers shutdown and waits for the drain to complete.
    pub async fn shutdown(mut self) -> anyhow::Result<()> {
        self.trigger_shutdown();
        self.handle.await.expect("Server task panicked")
    }
}

/// Sends a raw request and reads until the server closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &str) -> std::io::Result<String> {
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(request.as_bytes()).await?;
    let mut response = String::new();
    stream.read_to_string(&mut response).await?;
    Ok(response)
}

/// Sends `GET /` and returns the full response text.
pub async fn get_root(addr: SocketAddr) -> std::io::Result<String> {
    send_raw(addr, GET_ROOT).await
}

/// Extracts `<N>` from a response whose body is `Active connections: <N>\n`.
pub fn parse_active_connections(response: &str) -> Option<i64> {
    let (_, body) = response.split_once("\r\n\r\n")?;
    body.strip_prefix("Active connections: ")?
        .strip_suffix('\n')?
        .parse()
        .ok()
}

/// Polls `condition` every few milliseconds until it holds or `timeout` passes.
pub async fn wait_until<F>(mut condition: F, timeout: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
