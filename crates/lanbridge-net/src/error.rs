//! Error types for network probing and quick-connect.

use thiserror::Error;

/// Network-layer errors.
#[derive(Debug, Error)]
pub enum NetError {
    /// Underlying socket or file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Registry file held malformed JSON.
    #[error("registry parse error: {0}")]
    Registry(#[from] serde_json::Error),

    /// An address string could not be parsed as IPv4.
    #[error("invalid IPv4 address: {0}")]
    BadAddress(String),
}
