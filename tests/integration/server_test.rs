// tests/integration/server_test.rs

//! End-to-end tests against a real listener on an ephemeral port.

use super::test_helpers::*;
use inflight::server::Server;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_connection_over_tcp() {
    let server = TestServer::start(test_config(150, 151)).await;
    let state = server.state.clone();

    let client = tokio::spawn(get_root(server.addr));
    assert!(wait_until(|| state.counter.current() == 1, Duration::from_secs(2)).await);

    let response = client.await.unwrap().unwrap();
    assert_eq!(parse_active_connections(&response), Some(1));
    assert!(wait_until(|| state.tracker.pending() == 0, Duration::from_secs(2)).await);
    assert_eq!(state.counter.current(), 0);

    server.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifty_concurrent_connections() {
    let server = TestServer::start(test_config(100, 300)).await;
    let state = server.state.clone();

    let peak = Arc::new(AtomicI64::new(0));
    let monitor = {
        let state = state.clone();
        let peak = peak.clone();
        tokio::spawn(async move {
            loop {
                let current = state.counter.current();
                assert!(current >= 0, "counter went negative");
                peak.fetch_max(current, Ordering::Relaxed);
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        })
    };

    let clients: Vec<_> = (0..50)
        .map(|_| tokio::spawn(get_root(server.addr)))
        .collect();

    let mut observed = Vec::new();
    for client in clients {
        let response = client.await.unwrap().unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
        observed.push(parse_active_connections(&response).expect("malformed body"));
    }
    monitor.abort();

    assert!(observed.iter().all(|&n| n >= 0));
    let max_seen = observed.iter().copied().max().unwrap_or(0).max(peak.load(Ordering::Relaxed));
    assert!(max_seen > 1, "expected overlapping requests, saw at most {max_seen}");

    assert!(wait_until(|| state.tracker.pending() == 0, Duration::from_secs(2)).await);
    assert_eq!(state.counter.current(), 0);
    let totals = state.totals.snapshot();
    assert_eq!((totals.accepted, totals.handled, totals.rejected), (50, 50, 0));

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_any_method_and_path_is_served() {
    let server = TestServer::start(test_config(0, 5)).await;

    let response = send_raw(
        server.addr,
        "POST /some/where?x=1 HTTP/1.0\r\nContent-Length: 0\r\n\r\n",
    )
    .await
    .unwrap();
    assert!(response.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(response.contains("Connection: close\r\n"));
    assert!(parse_active_connections(&response).is_some());

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_malformed_request_over_tcp() {
    let server = TestServer::start(test_config(0, 5)).await;
    let state = server.state.clone();

    let response = send_raw(server.addr, "GET /\r\n\r\n").await.unwrap();
    assert!(response.starts_with("HTTP/1.1 400 Bad Request\r\n"));

    assert!(wait_until(|| state.tracker.pending() == 0, Duration::from_secs(2)).await);
    assert_eq!(state.totals.handled(), 0);
    assert_eq!(state.totals.rejected(), 1);
    assert_eq!(state.totals.accepted(), 1);

    server.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_bind_to_occupied_port_fails() {
    init_tracing();
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let mut config = test_config(0, 5);
    config.port = port;

    let result = Server::bind(config).await;
    let err = result.err().expect("binding an occupied port must fail");
    assert!(format!("{err:#}").contains("Failed to bind"));
}
