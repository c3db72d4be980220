// src/core/errors.rs

//! Defines the primary error type for the request-tracking core.

use std::sync::Arc;
use thiserror::Error;

/// The main error enum, representing all possible failures within the server.
#[derive(Error, Debug, Clone)]
pub enum InflightError {
    #[error("IO Error: {0}")]
    Io(Arc<std::io::Error>),

    #[error("Incomplete data in stream")]
    IncompleteData,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Request head exceeds the limit of {0} bytes")]
    RequestTooLarge(usize),

    #[error("Connection closed before a complete request was received")]
    ConnectionClosed,

    #[error("Server began shutting down before a request was received")]
    ShutdownBeforeRequest,

    #[error("Memory sampling failed: {0}")]
    MemorySample(String),
}

impl From<std::io::Error> for InflightError {
    fn from(e: std::io::Error) -> Self {
        InflightError::Io(Arc::new(e))
    }
}

impl From<std::str::Utf8Error> for InflightError {
    fn from(e: std::str::Utf8Error) -> Self {
        InflightError::MalformedRequest(format!("request head is not valid UTF-8: {e}"))
    }
}
