//! Errors raised while bootstrapping a connection.

use thiserror::Error;

/// Errors that can occur while building the worker pool or the client.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("Worker pool size must be at least 1")]
    InvalidPoolSize,

    #[error("Failed to start worker pool: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type alias for connection setup.
pub type Result<T> = std::result::Result<T, SetupError>;
