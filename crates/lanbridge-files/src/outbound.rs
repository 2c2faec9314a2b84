//! Sender side of a transfer: sliding-window chunk loop.

use crate::hasher;
use crate::record::{Direction, TransferRecord, TransferStatus};
use crate::TransferError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use lanbridge_proto::{
    FileChunk, FileTransferComplete, FileTransferInit, Message, TransferId,
};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Where outbound frames go. Implemented by the router over the primary
/// session; tests plug in an in-memory sink.
#[async_trait::async_trait]
pub trait ChunkSink: Send + Sync {
    /// Hand one message to the transport.
    async fn send(&self, message: Message) -> Result<(), TransferError>;
}

/// Timing and window knobs. Defaults match the protocol constants.
#[derive(Debug, Clone, Copy)]
pub struct OutboundConfig {
    /// Maximum unacknowledged chunks in flight.
    pub window: usize,
    /// Retransmit a chunk unacknowledged for this long.
    pub ack_wait: Duration,
    /// Attempts per chunk before the transfer fails.
    pub max_attempts: u32,
    /// Loop cadence.
    pub tick: Duration,
}

impl Default for OutboundConfig {
    fn default() -> Self {
        Self {
            window: 8,
            ack_wait: Duration::from_secs(2),
            max_attempts: 3,
            tick: Duration::from_millis(20),
        }
    }
}

/// Operator-visible progress update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferProgress {
    /// Transfer id.
    pub id: TransferId,
    /// Contiguously acknowledged bytes, clamped to the file size.
    pub bytes: u64,
    /// Total file size.
    pub total: u64,
}

/// Shared control surface for one outbound transfer: the router feeds acks
/// in, the operator can cancel, the send loop reads both.
#[derive(Clone)]
pub struct OutboundHandle {
    id: TransferId,
    acked: Arc<Mutex<HashSet<u64>>>,
    cancel: CancellationToken,
}

impl OutboundHandle {
    /// Create a handle for a transfer id.
    pub fn new(id: TransferId) -> Self {
        Self {
            id,
            acked: Arc::new(Mutex::new(HashSet::new())),
            cancel: CancellationToken::new(),
        }
    }

    /// The transfer id.
    pub fn id(&self) -> TransferId {
        self.id
    }

    /// Record a `fileChunkAck`. Duplicate acks are no-ops.
    pub fn ack(&self, index: u64) {
        self.acked.lock().expect("ack set poisoned").insert(index);
    }

    /// Ask the send loop to stop. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Terminal outcome of a send loop that did not error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundOutcome {
    /// Every chunk acknowledged; `fileTransferComplete` sent.
    Completed {
        /// SHA-256 of the file, as declared to the peer.
        checksum: String,
    },
    /// Cancellation observed; the loop stopped without completing.
    Cancelled,
}

struct Flight {
    payload: String,
    attempts: u32,
    last_sent: Instant,
}

/// One outbound transfer.
pub struct OutboundTransfer {
    record: TransferRecord,
    path: PathBuf,
    handle: OutboundHandle,
    config: OutboundConfig,
    sink: Arc<dyn ChunkSink>,
    progress: mpsc::UnboundedSender<TransferProgress>,
}

impl OutboundTransfer {
    /// Prepare a transfer of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file metadata cannot be read.
    pub fn new(
        path: PathBuf,
        mime: String,
        chunk_size: usize,
        handle: OutboundHandle,
        config: OutboundConfig,
        sink: Arc<dyn ChunkSink>,
        progress: mpsc::UnboundedSender<TransferProgress>,
    ) -> Result<Self, TransferError> {
        let size = std::fs::metadata(&path)?.len();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("file")
            .to_string();

        Ok(Self {
            record: TransferRecord::new(
                handle.id(),
                name,
                size,
                mime,
                chunk_size,
                Direction::Outbound,
                None,
            ),
            path,
            handle,
            config,
            sink,
            progress,
        })
    }

    /// Snapshot of the transfer record.
    pub fn record(&self) -> &TransferRecord {
        &self.record
    }

    /// Run the transfer to a terminal state.
    ///
    /// Hashes the file, announces the transfer, then drives the sliding
    /// window: fill up to `window` chunks past the contiguously acknowledged
    /// base, retransmit anything unacknowledged past `ack_wait`, fail after
    /// `max_attempts`, and announce completion once the base passes the last
    /// chunk.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::RetryExhausted`] when a chunk runs out of
    /// attempts, or an I/O/sink error.
    pub async fn run(mut self) -> Result<OutboundOutcome, TransferError> {
        let id = self.handle.id();
        let size = self.record.size;
        let chunk_size = self.record.chunk_size;
        let total_chunks = self.record.total_chunks();

        let hash_path = self.path.clone();
        let checksum = tokio::task::spawn_blocking(move || hasher::sha256_file(hash_path))
            .await
            .map_err(|join| {
                TransferError::Io(std::io::Error::new(std::io::ErrorKind::Other, join))
            })??;
        self.record.checksum = Some(checksum.clone());

        self.sink
            .send(Message::FileTransferInit(FileTransferInit {
                id,
                name: self.record.name.clone(),
                size,
                mime: self.record.mime.clone(),
                chunk_size,
                checksum: Some(checksum.clone()),
                is_clipboard: None,
            }))
            .await?;

        tracing::info!(%id, size, total_chunks, "outbound transfer started");

        let mut file = File::open(&self.path)?;
        let mut inflight: HashMap<u64, Flight> = HashMap::new();
        let mut base: u64 = 0;
        let mut next_index: u64 = 0;
        let mut reported: Option<u64> = None;

        loop {
            if self.handle.is_cancelled() {
                self.record.transition(TransferStatus::Cancelled);
                tracing::info!(%id, "outbound transfer cancelled");
                return Ok(OutboundOutcome::Cancelled);
            }

            {
                let acked = self.handle.acked.lock().expect("ack set poisoned");
                while acked.contains(&base) {
                    inflight.remove(&base);
                    base += 1;
                }
                // Out-of-order acks retire their flights without moving base.
                inflight.retain(|index, _| !acked.contains(index));
            }

            let progress_bytes = (base * chunk_size as u64).min(size);
            self.record.advance_bytes(progress_bytes);
            if reported != Some(progress_bytes) {
                reported = Some(progress_bytes);
                let _ = self.progress.send(TransferProgress {
                    id,
                    bytes: progress_bytes,
                    total: size,
                });
            }

            if base >= total_chunks {
                break;
            }

            while next_index - base < self.config.window as u64 && next_index < total_chunks {
                let payload = read_chunk_b64(&mut file, next_index, chunk_size, size)?;
                self.sink
                    .send(Message::FileChunk(FileChunk {
                        id,
                        index: next_index,
                        chunk: payload.clone(),
                    }))
                    .await?;
                inflight.insert(
                    next_index,
                    Flight {
                        payload,
                        attempts: 1,
                        last_sent: Instant::now(),
                    },
                );
                next_index += 1;
            }

            let now = Instant::now();
            let mut stale: Vec<u64> = inflight
                .iter()
                .filter(|(_, flight)| now.duration_since(flight.last_sent) >= self.config.ack_wait)
                .map(|(index, _)| *index)
                .collect();
            stale.sort_unstable();

            for index in stale {
                let flight = inflight.get_mut(&index).expect("stale flight vanished");
                if flight.attempts >= self.config.max_attempts {
                    self.record.transition(TransferStatus::Failed);
                    tracing::warn!(%id, index, attempts = flight.attempts, "retry budget exhausted");
                    return Err(TransferError::RetryExhausted {
                        index,
                        attempts: flight.attempts,
                    });
                }
                flight.attempts += 1;
                flight.last_sent = now;
                tracing::debug!(%id, index, attempt = flight.attempts, "retransmitting chunk");
                self.sink
                    .send(Message::FileChunk(FileChunk {
                        id,
                        index,
                        chunk: flight.payload.clone(),
                    }))
                    .await?;
            }

            tokio::time::sleep(self.config.tick).await;
        }

        self.sink
            .send(Message::FileTransferComplete(FileTransferComplete {
                id,
                name: self.record.name.clone(),
                size,
                checksum: Some(checksum.clone()),
            }))
            .await?;

        self.record.transition(TransferStatus::Completed);
        tracing::info!(%id, "outbound transfer complete");
        Ok(OutboundOutcome::Completed { checksum })
    }
}

fn read_chunk_b64(
    file: &mut File,
    index: u64,
    chunk_size: usize,
    size: u64,
) -> Result<String, TransferError> {
    let offset = index * chunk_size as u64;
    let len = (size - offset).min(chunk_size as u64) as usize;

    let mut buffer = vec![0u8; len];
    file.seek(SeekFrom::Start(offset))?;
    file.read_exact(&mut buffer)?;

    Ok(BASE64.encode(buffer))
}
