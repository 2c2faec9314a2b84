//! Error types for the transfer engine.

use lanbridge_proto::TransferId;
use thiserror::Error;

/// Transfer engine errors.
#[derive(Debug, Error)]
pub enum TransferError {
    /// File or temp-file I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Chunk payload was not valid base64.
    #[error("chunk is not valid base64: {0}")]
    BadChunk(#[from] base64::DecodeError),

    /// Chunk larger than the negotiated chunk size.
    #[error("chunk {index} is {actual} bytes, chunk size is {chunk_size}")]
    ChunkTooLarge {
        /// Offending chunk index.
        index: u64,
        /// Decoded chunk length.
        actual: usize,
        /// Negotiated chunk size.
        chunk_size: usize,
    },

    /// Chunk would extend past the declared file size.
    #[error("chunk {index} extends past declared size {size}")]
    ChunkOutOfBounds {
        /// Offending chunk index.
        index: u64,
        /// Declared file size.
        size: u64,
    },

    /// On-disk size did not match the declared size on completion.
    #[error("size mismatch: declared {declared}, on disk {actual}")]
    SizeMismatch {
        /// Size from the transfer init/complete.
        declared: u64,
        /// Size of the temp file.
        actual: u64,
    },

    /// Receiver's SHA-256 did not match the sender's declaration.
    #[error("checksum mismatch: declared {declared}, computed {computed}")]
    ChecksumMismatch {
        /// Checksum from the sender.
        declared: String,
        /// Checksum computed over the received file.
        computed: String,
    },

    /// An outbound chunk exhausted its retry budget.
    #[error("chunk {index} unacknowledged after {attempts} attempts")]
    RetryExhausted {
        /// Chunk that never got acknowledged.
        index: u64,
        /// Attempts made.
        attempts: u32,
    },

    /// Frame could not be handed to the transport.
    #[error("send failed: {0}")]
    SinkClosed(String),

    /// Operation referenced a transfer the engine does not know.
    #[error("unknown transfer {0}")]
    UnknownTransfer(TransferId),
}
