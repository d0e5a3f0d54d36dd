//! Common error types for EvalBoard

use thiserror::Error;

/// Common result type for EvalBoard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across EvalBoard services
#[derive(Error, Debug)]
pub enum Error {
    /// Record store operation error
    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
