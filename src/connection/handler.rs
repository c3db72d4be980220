// src/connection/handler.rs

//! Defines the `RequestHandler`, the unit of simulated work run for every
//! accepted connection.

use crate::core::metrics;
use crate::core::protocol::{HttpCodec, RequestHead, Response};
use crate::core::state::ServerState;
use crate::core::InflightError;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio_util::codec::Framed;
use tracing::debug;

/// Serves the single request carried by one connection.
pub struct RequestHandler<S> {
    framed: Framed<S, HttpCodec>,
    addr: SocketAddr,
    state: Arc<ServerState>,
    /// Fires when the server stops accepting. Only observed while waiting for
    /// the request head.
    drain_rx: broadcast::Receiver<()>,
}

impl<S> RequestHandler<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new `RequestHandler`.
    pub fn new(
        stream: S,
        addr: SocketAddr,
        state: Arc<ServerState>,
        drain_rx: broadcast::Receiver<()>,
    ) -> Self {
        Self {
            framed: Framed::new(stream, HttpCodec),
            addr,
            state,
            drain_rx,
        }
    }

    /// Reads the request, runs the counter protocol and writes the response.
    ///
    /// Returns the connection count rendered into the response body. A request
    /// that cannot be parsed is answered with an error status and never
    /// touches the counter. If the server starts draining before a complete
    /// head arrives, the connection is dropped without a response.
    pub async fn run(mut self) -> Result<i64, InflightError> {
        let head = self.read_head().await?;
        debug!(
            "{} {} HTTP/1.{} from {}",
            head.method, head.path, head.version, self.addr
        );

        // Past this point the request runs to completion regardless of shutdown.
        self.serve().await
    }

    async fn read_head(&mut self) -> Result<RequestHead, InflightError> {
        let next = tokio::select! {
            biased;
            next = self.framed.next() => next,
            _ = self.drain_rx.recv() => {
                debug!("Server draining, dropping idle connection from {}", self.addr);
                return Err(InflightError::ShutdownBeforeRequest);
            }
        };
        match next {
            Some(Ok(head)) => Ok(head),
            Some(Err(e)) => {
                self.reject(&e).await;
                Err(e)
            }
            None => Err(InflightError::ConnectionClosed),
        }
    }

    async fn serve(&mut self) -> Result<i64, InflightError> {
        let active = self.state.counter.enter();

        let delay = self.state.delay.sample();
        metrics::REQUEST_DELAY_SECONDS.observe(delay.as_secs_f64());
        tokio::time::sleep(delay).await;

        // Relaxed read: other handlers may move the count before the client sees it.
        let observed = self.state.counter.observe();
        let written = self
            .framed
            .send(Response::ok(format!("Active connections: {observed}\n")))
            .await;
        drop(active);

        self.state.totals.record_handled();
        metrics::REQUESTS_HANDLED_TOTAL.inc();
        if let Err(e) = written {
            metrics::RESPONSE_WRITE_FAILURES_TOTAL.inc();
            return Err(e);
        }
        Ok(observed)
    }

    async fn reject(&mut self, err: &InflightError) {
        let response = match err {
            InflightError::RequestTooLarge(_) => Response::header_fields_too_large(),
            InflightError::MalformedRequest(_) => Response::bad_request(),
            _ => return,
        };
        self.state.totals.record_rejected();
        metrics::REQUESTS_REJECTED_TOTAL.inc();
        if let Err(e) = self.framed.send(response).await {
            debug!("Could not send error response to {}: {}", self.addr, e);
        }
    }
}
