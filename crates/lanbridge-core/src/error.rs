//! Error types for the daemon core.

use thiserror::Error;

/// Daemon core errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Crypto box failure (seal/open/key store).
    #[error("crypto error: {0}")]
    Crypto(#[from] lanbridge_crypto::CryptoError),

    /// Wire envelope failure.
    #[error("protocol error: {0}")]
    Proto(#[from] lanbridge_proto::ProtoError),

    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(#[from] lanbridge_transport::TransportError),

    /// Network probe or registry failure.
    #[error("network error: {0}")]
    Net(#[from] lanbridge_net::NetError),

    /// Transfer engine failure.
    #[error("transfer error: {0}")]
    Transfer(#[from] lanbridge_files::TransferError),

    /// No usable interface matched the operator's selection.
    #[error("no usable network interface for selection")]
    NoInterface,

    /// Filesystem failure outside the transfer engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted JSON (inventory) failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The daemon is not running.
    #[error("daemon is stopped")]
    Stopped,
}
