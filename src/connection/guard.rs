// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard tying a connection task to the
//! completion tracker.

use crate::core::WorkPermit;
use std::net::SocketAddr;
use tracing::debug;

/// Owned by a connection task for its whole lifetime. Dropping it, whether the
/// task returns, fails, panics or is aborted, marks the connection's unit of
/// work as complete.
pub struct ConnectionGuard {
    /// The network address of the client.
    addr: SocketAddr,
    /// The registration taken by the accept loop before the task was spawned.
    _permit: WorkPermit,
}

impl ConnectionGuard {
    /// Wraps a permit that was registered for the connection from `addr`.
    pub fn new(permit: WorkPermit, addr: SocketAddr) -> Self {
        Self {
            addr,
            _permit: permit,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, signalling completion for connection {}",
            self.addr
        );
    }
}
