//! # lanbridge-files
//!
//! Reliable file transfer for the lanbridge daemon, in both directions.
//!
//! Inbound transfers write chunks into a temp file at `index × chunk_size`,
//! acknowledge each chunk on receipt, and verify size and SHA-256 against
//! the sender's declaration before moving the file into the downloads
//! location. Outbound transfers stream chunks under a bounded sliding
//! window with per-chunk retransmission and a hard retry cap.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod hasher;
pub mod inbound;
pub mod outbound;
pub mod record;

pub use error::TransferError;
pub use hasher::{ChecksumKind, classify_checksum, sha256_bytes, sha256_file};
pub use inbound::{InboundResult, InboundTransfer};
pub use outbound::{
    ChunkSink, OutboundConfig, OutboundHandle, OutboundOutcome, OutboundTransfer,
    TransferProgress,
};
pub use record::{Direction, TransferRecord, TransferStatus};
