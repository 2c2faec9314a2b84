//! Receiver side of a transfer: temp-file writer and verification.

use crate::hasher::{self, ChecksumKind};
use crate::record::{Direction, TransferRecord, TransferStatus};
use crate::TransferError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use lanbridge_proto::{FileTransferComplete, FileTransferInit};
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Name of the partial-file directory inside the downloads location.
///
/// Keeping temp files on the same filesystem as their destination makes the
/// final move a single atomic rename.
pub const PARTIAL_DIR: &str = ".lanbridge-partial";

/// Outcome of a successfully completed inbound transfer.
#[derive(Debug)]
pub struct InboundResult {
    /// Where the file landed.
    pub final_path: PathBuf,
    /// `Some(true)` when a SHA-256 was declared and matched; `None` when no
    /// usable checksum was declared. A mismatch is an error, never a result.
    pub verified: Option<bool>,
    /// Whether the declared checksum had the legacy 32-hex shape and was
    /// therefore skipped.
    pub legacy_checksum: bool,
}

/// One inbound transfer: open temp file, ordered-offset writes, verify,
/// atomic move into the downloads location.
#[derive(Debug)]
pub struct InboundTransfer {
    /// The tracked record.
    pub record: TransferRecord,
    /// Whether the payload is clipboard content.
    pub is_clipboard: bool,
    temp_path: PathBuf,
    file: Option<File>,
}

impl InboundTransfer {
    /// Open a transfer from its `fileTransferInit`.
    ///
    /// Allocates the temp file under [`PARTIAL_DIR`] inside `downloads_dir`
    /// and pre-sizes it to the declared length.
    ///
    /// # Errors
    ///
    /// Returns an error if the temp file cannot be created.
    pub fn open(init: &FileTransferInit, downloads_dir: &Path) -> Result<Self, TransferError> {
        let partial_dir = downloads_dir.join(PARTIAL_DIR);
        fs::create_dir_all(&partial_dir)?;

        let temp_path = partial_dir.join(format!("{}.part", init.id));
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        file.set_len(init.size)?;

        tracing::info!(
            id = %init.id,
            name = %init.name,
            size = init.size,
            chunk_size = init.chunk_size,
            "inbound transfer opened"
        );

        Ok(Self {
            record: TransferRecord::new(
                init.id,
                init.name.clone(),
                init.size,
                init.mime.clone(),
                init.chunk_size,
                Direction::Inbound,
                init.checksum.clone(),
            ),
            is_clipboard: init.is_clipboard.unwrap_or(false),
            temp_path,
            file: Some(file),
        })
    }

    /// Write one base64 chunk at `index × chunk_size`.
    ///
    /// Returns the updated `bytes_transferred`. The caller acknowledges the
    /// chunk on receipt, before this write is known durable.
    ///
    /// # Errors
    ///
    /// Returns an error for bad base64, an oversized chunk, a chunk past the
    /// declared size, or an I/O failure.
    pub fn write_chunk(&mut self, index: u64, chunk_b64: &str) -> Result<u64, TransferError> {
        let bytes = BASE64.decode(chunk_b64)?;

        let chunk_size = self.record.chunk_size;
        if bytes.len() > chunk_size {
            return Err(TransferError::ChunkTooLarge {
                index,
                actual: bytes.len(),
                chunk_size,
            });
        }

        let offset = index * chunk_size as u64;
        let end = offset + bytes.len() as u64;
        if end > self.record.size {
            return Err(TransferError::ChunkOutOfBounds {
                index,
                size: self.record.size,
            });
        }

        let file = self.file.as_mut().ok_or_else(|| {
            TransferError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "writer already closed",
            ))
        })?;
        file.seek(SeekFrom::Start(offset))?;
        file.write_all(&bytes)?;

        self.record.advance_bytes(end);
        Ok(self.record.bytes_transferred())
    }

    /// Finish the transfer: close the writer, check size and checksum, move
    /// the file into `downloads_dir` (overwriting any same-name file).
    ///
    /// # Errors
    ///
    /// [`TransferError::SizeMismatch`] or [`TransferError::ChecksumMismatch`]
    /// mark the record failed and remove the temp file; the peer is not
    /// re-asked.
    pub fn complete(
        mut self,
        declared: &FileTransferComplete,
        downloads_dir: &Path,
    ) -> Result<InboundResult, TransferError> {
        if let Some(file) = self.file.take() {
            file.sync_all()?;
        }

        let actual = fs::metadata(&self.temp_path)?.len();
        if actual != declared.size {
            self.fail_and_cleanup();
            return Err(TransferError::SizeMismatch {
                declared: declared.size,
                actual,
            });
        }

        // The init-declared checksum wins; fall back to the completion frame.
        let checksum = self
            .record
            .checksum
            .clone()
            .or_else(|| declared.checksum.clone());

        let mut verified = None;
        let mut legacy_checksum = false;
        if let Some(expected) = checksum {
            match hasher::classify_checksum(&expected) {
                ChecksumKind::Sha256 => {
                    let computed = hasher::sha256_file(&self.temp_path)?;
                    if !computed.eq_ignore_ascii_case(&expected) {
                        self.fail_and_cleanup();
                        return Err(TransferError::ChecksumMismatch {
                            declared: expected,
                            computed,
                        });
                    }
                    verified = Some(true);
                }
                ChecksumKind::Legacy => {
                    tracing::warn!(
                        id = %self.record.id,
                        "peer declared a legacy 32-hex checksum, skipping verification"
                    );
                    legacy_checksum = true;
                }
                ChecksumKind::Malformed => {
                    tracing::warn!(
                        id = %self.record.id,
                        checksum = %expected,
                        "ignoring malformed checksum"
                    );
                }
            }
        }

        let final_path = downloads_dir.join(&self.record.name);
        fs::rename(&self.temp_path, &final_path)?;

        self.record.transition(TransferStatus::Completed);
        if verified == Some(true) {
            self.record.transition(TransferStatus::Verified);
        }

        tracing::info!(
            id = %self.record.id,
            path = %final_path.display(),
            verified = ?verified,
            "inbound transfer complete"
        );

        Ok(InboundResult {
            final_path,
            verified,
            legacy_checksum,
        })
    }

    /// Cancel the transfer: close the writer and remove the temp file.
    pub fn cancel(mut self) {
        self.record.transition(TransferStatus::Cancelled);
        self.cleanup();
        tracing::info!(id = %self.record.id, "inbound transfer cancelled");
    }

    /// Fail the transfer after an unrecoverable write error.
    pub fn fail(mut self) {
        self.fail_and_cleanup();
    }

    fn fail_and_cleanup(&mut self) {
        self.record.transition(TransferStatus::Failed);
        self.cleanup();
    }

    fn cleanup(&mut self) {
        self.file.take();
        if self.temp_path.exists() {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}
