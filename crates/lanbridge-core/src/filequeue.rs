//! Serial worker for the file-transfer control plane.
//!
//! Every file frame (init, chunk, chunk-ack, complete, verified, cancel)
//! is routed here by the coordinator, so chunk writes for one transfer are
//! strictly ordered and the coordination task never blocks on file I/O.

use crate::collab::Collaborators;
use crate::events::UiEvent;
use dashmap::DashMap;
use lanbridge_files::{ChunkSink, InboundTransfer, OutboundHandle, TransferError};
use lanbridge_proto::{
    FileChunkAck, FileTransferCancel, Message, TransferId, TransferVerified,
};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

/// Work items for the file queue.
#[derive(Debug)]
pub enum FileCommand {
    /// A file-plane frame from the primary session.
    Frame(Message),
    /// Operator cancellation of a transfer, by id.
    CancelLocal(TransferId),
}

/// The serial file worker.
pub struct FileWorker {
    inbound: HashMap<TransferId, InboundTransfer>,
    outbound: Arc<DashMap<TransferId, OutboundHandle>>,
    downloads_dir: PathBuf,
    sink: Arc<dyn ChunkSink>,
    events: broadcast::Sender<UiEvent>,
    collab: Collaborators,
}

impl FileWorker {
    /// Create a worker.
    pub fn new(
        outbound: Arc<DashMap<TransferId, OutboundHandle>>,
        downloads_dir: PathBuf,
        sink: Arc<dyn ChunkSink>,
        events: broadcast::Sender<UiEvent>,
        collab: Collaborators,
    ) -> Self {
        Self {
            inbound: HashMap::new(),
            outbound,
            downloads_dir,
            sink,
            events,
            collab,
        }
    }

    /// Drain the queue until the sender side closes.
    pub async fn run(mut self, mut commands: mpsc::UnboundedReceiver<FileCommand>) {
        while let Some(command) = commands.recv().await {
            match command {
                FileCommand::Frame(frame) => self.handle_frame(frame).await,
                FileCommand::CancelLocal(id) => self.cancel_local(id).await,
            }
        }

        // Shutdown: abandon in-flight inbound transfers and their temp files.
        for (_, transfer) in self.inbound.drain() {
            transfer.cancel();
        }
    }

    async fn handle_frame(&mut self, frame: Message) {
        match frame {
            Message::FileTransferInit(init) => {
                if self.inbound.contains_key(&init.id) {
                    tracing::warn!(id = %init.id, "duplicate transfer init, ignored");
                    return;
                }
                match InboundTransfer::open(&init, &self.downloads_dir) {
                    Ok(transfer) => {
                        self.emit(UiEvent::TransferProgress {
                            id: init.id,
                            bytes: 0,
                            total: init.size,
                        });
                        self.inbound.insert(init.id, transfer);
                    }
                    Err(err) => {
                        tracing::warn!(id = %init.id, %err, "inbound transfer open failed");
                        self.emit(UiEvent::TransferFailed {
                            id: init.id,
                            reason: err.to_string(),
                        });
                        self.send(Message::FileTransferCancel(FileTransferCancel {
                            id: init.id,
                        }))
                        .await;
                    }
                }
            }

            Message::FileChunk(chunk) => {
                if !self.inbound.contains_key(&chunk.id) {
                    tracing::debug!(id = %chunk.id, "chunk for unknown transfer, dropped");
                    return;
                }

                // Receipt-ack: goes out before the write is known durable.
                self.send(Message::FileChunkAck(FileChunkAck {
                    id: chunk.id,
                    index: chunk.index,
                }))
                .await;

                let transfer = self.inbound.get_mut(&chunk.id).expect("checked above");
                match transfer.write_chunk(chunk.index, &chunk.chunk) {
                    Ok(bytes) => {
                        let total = transfer.record.size;
                        self.emit(UiEvent::TransferProgress {
                            id: chunk.id,
                            bytes,
                            total,
                        });
                    }
                    Err(err) => {
                        tracing::warn!(id = %chunk.id, index = chunk.index, %err, "chunk write failed");
                        if let Some(transfer) = self.inbound.remove(&chunk.id) {
                            transfer.fail();
                        }
                        self.emit(UiEvent::TransferFailed {
                            id: chunk.id,
                            reason: err.to_string(),
                        });
                        self.send(Message::FileTransferCancel(FileTransferCancel {
                            id: chunk.id,
                        }))
                        .await;
                    }
                }
            }

            Message::FileTransferComplete(declared) => {
                let Some(transfer) = self.inbound.remove(&declared.id) else {
                    tracing::debug!(id = %declared.id, "completion for unknown transfer, dropped");
                    return;
                };
                let is_clipboard = transfer.is_clipboard;
                let name = transfer.record.name.clone();

                match transfer.complete(&declared, &self.downloads_dir) {
                    Ok(result) => {
                        if result.legacy_checksum {
                            self.emit(UiEvent::TransferWarning {
                                id: declared.id,
                                message: "peer sent a legacy checksum; verification skipped"
                                    .to_string(),
                            });
                        }
                        if let Some(verified) = result.verified {
                            self.send(Message::TransferVerified(TransferVerified {
                                id: declared.id,
                                verified,
                            }))
                            .await;
                        }
                        if is_clipboard {
                            self.push_clipboard_file(&result.final_path);
                        } else {
                            self.collab.notifier.post("File received", &name);
                        }
                        self.emit(UiEvent::TransferCompleted {
                            id: declared.id,
                            path: Some(result.final_path),
                            verified: result.verified,
                        });
                    }
                    Err(err @ TransferError::ChecksumMismatch { .. }) => {
                        self.send(Message::TransferVerified(TransferVerified {
                            id: declared.id,
                            verified: false,
                        }))
                        .await;
                        self.collab.notifier.post("File transfer failed", &name);
                        self.emit(UiEvent::TransferFailed {
                            id: declared.id,
                            reason: err.to_string(),
                        });
                    }
                    Err(err) => {
                        self.collab.notifier.post("File transfer failed", &name);
                        self.emit(UiEvent::TransferFailed {
                            id: declared.id,
                            reason: err.to_string(),
                        });
                    }
                }
            }

            Message::FileChunkAck(ack) => {
                match self.outbound.get(&ack.id) {
                    Some(handle) => handle.ack(ack.index),
                    None => {
                        tracing::debug!(id = %ack.id, "ack for unknown transfer, dropped");
                    }
                }
            }

            Message::TransferVerified(verdict) => {
                // Sender side: the peer's post-transfer checksum verdict.
                self.emit(UiEvent::TransferVerified {
                    id: verdict.id,
                    verified: verdict.verified,
                });
            }

            Message::FileTransferCancel(cancel) => {
                self.cancel_transfer(cancel.id, true).await;
            }

            other => {
                tracing::debug!(kind = other.kind(), "non-file frame on file queue, dropped");
            }
        }
    }

    async fn cancel_local(&mut self, id: TransferId) {
        self.send(Message::FileTransferCancel(FileTransferCancel { id }))
            .await;
        self.cancel_transfer(id, false).await;
    }

    /// Cancel either direction. Idempotent: unknown ids are no-ops.
    async fn cancel_transfer(&mut self, id: TransferId, from_peer: bool) {
        if let Some(transfer) = self.inbound.remove(&id) {
            transfer.cancel();
            self.emit(UiEvent::TransferCancelled { id });
            return;
        }

        if let Some(handle) = self.outbound.get(&id) {
            // The send loop observes the mark on its next tick and emits the
            // terminal event itself.
            handle.cancel();
            return;
        }

        if from_peer {
            tracing::debug!(%id, "cancel for unknown transfer, ignored");
        }
    }

    fn push_clipboard_file(&self, path: &std::path::Path) {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                self.collab.pasteboard.set_text(&text);
                self.emit(UiEvent::ClipboardReceived { text });
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "clipboard file unreadable as text");
            }
        }
    }

    async fn send(&self, message: Message) {
        if let Err(err) = self.sink.send(message).await {
            tracing::debug!(%err, "file queue send dropped");
        }
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }
}
