// tests/integration/shutdown_test.rs

//! Shutdown waits for in-flight requests before returning.

use super::test_helpers::*;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_drains_in_flight_request() {
    let mut server = TestServer::start(test_config(400, 401)).await;
    let state = server.state.clone();

    let client = tokio::spawn(get_root(server.addr));
    assert!(wait_until(|| state.counter.current() == 1, Duration::from_secs(2)).await);
    assert_eq!(state.tracker.pending(), 1);

    server.trigger_shutdown();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!server.is_finished(), "server returned while a request was in flight");

    let response = client.await.unwrap().unwrap();
    assert_eq!(parse_active_connections(&response), Some(1));

    let addr = server.addr;
    server.shutdown().await.unwrap();
    assert_eq!(state.tracker.pending(), 0);
    assert_eq!(state.counter.current(), 0);

    assert!(
        TcpStream::connect(addr).await.is_err(),
        "listener should be closed after shutdown"
    );
}

#[tokio::test]
async fn test_idle_shutdown_returns_promptly() {
    let server = TestServer::start(test_config(0, 5)).await;
    let state = server.state.clone();

    tokio::time::timeout(Duration::from_secs(5), server.shutdown())
        .await
        .expect("idle server did not stop")
        .unwrap();
    assert_eq!(state.tracker.pending(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_idle_connection_does_not_block_shutdown() {
    let server = TestServer::start(test_config(0, 5)).await;
    let state = server.state.clone();

    let mut silent = TcpStream::connect(server.addr).await.unwrap();
    assert!(wait_until(|| state.tracker.pending() == 1, Duration::from_secs(2)).await);
    assert_eq!(state.counter.current(), 0);

    tokio::time::timeout(Duration::from_secs(3), server.shutdown())
        .await
        .expect("drain waited on a connection that never sent a request")
        .unwrap();
    assert_eq!(state.tracker.pending(), 0);
    assert_eq!(state.totals.handled(), 0);

    // Dropped without a response.
    let mut buf = Vec::new();
    let read = silent.read_to_end(&mut buf).await;
    assert!(read.is_err() || buf.is_empty());
}
