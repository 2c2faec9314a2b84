//! File-transfer and file-browse payloads.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Transfer identifier shared by both peers for one transfer.
pub type TransferId = Uuid;

/// `fileTransferInit` payload, both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransferInit {
    /// Transfer id.
    pub id: TransferId,
    /// File name (no path).
    pub name: String,
    /// Total size in bytes.
    pub size: u64,
    /// MIME type.
    #[serde(default = "default_mime")]
    pub mime: String,
    /// Chunk size in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// SHA-256 of the file contents, hex-encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Whether the payload is clipboard content rather than a user file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_clipboard: Option<bool>,
}

fn default_mime() -> String {
    "application/octet-stream".to_string()
}

fn default_chunk_size() -> usize {
    crate::DEFAULT_CHUNK_SIZE
}

/// `fileChunk` payload: one chunk of up to `chunk_size` bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunk {
    /// Transfer id.
    pub id: TransferId,
    /// Zero-based chunk index.
    pub index: u64,
    /// Base64-encoded chunk bytes.
    pub chunk: String,
}

/// `fileChunkAck` payload: receipt acknowledgment for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChunkAck {
    /// Transfer id.
    pub id: TransferId,
    /// Acknowledged chunk index.
    pub index: u64,
}

/// `fileTransferComplete` payload: sender EOF announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransferComplete {
    /// Transfer id.
    pub id: TransferId,
    /// File name.
    pub name: String,
    /// Declared size in bytes.
    pub size: u64,
    /// SHA-256 checksum, hex-encoded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// `transferVerified` payload: the receiver's post-hoc checksum verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferVerified {
    /// Transfer id.
    pub id: TransferId,
    /// Whether the receiver's checksum matched.
    pub verified: bool,
}

/// `fileTransferCancel` payload: abort a transfer; either side may send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileTransferCancel {
    /// Transfer id.
    pub id: TransferId,
}

/// Outbound `browseLs` payload: request a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseLs {
    /// Remote path to list.
    pub path: String,
    /// Include hidden entries.
    #[serde(default)]
    pub show_hidden: bool,
}

/// One entry of a remote directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseEntry {
    /// Entry name.
    pub name: String,
    /// Full remote path.
    pub path: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Size in bytes for files.
    #[serde(default)]
    pub size: u64,
}

/// Inbound `browseData` payload: listing or error for a `browseLs` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseData {
    /// Path that was listed.
    pub path: String,
    /// Listing entries; empty on error.
    #[serde(default)]
    pub items: Vec<BrowseEntry>,
    /// Error message when the listing failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_defaults() {
        let id = Uuid::new_v4();
        let json = format!(r#"{{"id":"{id}","name":"photo.jpg","size":200000}}"#);
        let init: FileTransferInit = serde_json::from_str(&json).unwrap();

        assert_eq!(init.chunk_size, crate::DEFAULT_CHUNK_SIZE);
        assert_eq!(init.mime, "application/octet-stream");
        assert!(init.checksum.is_none());
        assert!(init.is_clipboard.is_none());
    }

    #[test]
    fn test_chunk_roundtrip() {
        let chunk = FileChunk {
            id: Uuid::new_v4(),
            index: 3,
            chunk: "AAECAw==".into(),
        };
        let json = serde_json::to_string(&chunk).unwrap();
        let back: FileChunk = serde_json::from_str(&json).unwrap();
        assert_eq!(back, chunk);
    }

    #[test]
    fn test_browse_data_error_case() {
        let json = r#"{"path":"/sdcard/secret","error":"permission denied"}"#;
        let data: BrowseData = serde_json::from_str(json).unwrap();
        assert!(data.items.is_empty());
        assert_eq!(data.error.as_deref(), Some("permission denied"));
    }
}
