//! Error types for qsync-sd
//!
//! Job-level failures never surface here: jobs report oracle errors through
//! logs and metrics and carry on. These errors are for startup and serving.

use std::net::SocketAddr;

use thiserror::Error;

/// Main error type for qsync-sd
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation errors
    #[error("Configuration error: {0}")]
    Config(#[from] qsync_common::Error),

    /// Listen address unavailable
    #[error("Failed to bind to {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Socket I/O errors while serving
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using qsync-sd Error
pub type Result<T> = std::result::Result<T, Error>;
