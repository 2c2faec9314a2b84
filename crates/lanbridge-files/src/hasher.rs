//! Streaming SHA-256 hashing and checksum classification.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Classification of a declared checksum string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    /// 64 hex chars: a SHA-256 digest.
    Sha256,
    /// Exactly 32 hex chars: a legacy digest from older peers. Surfaced as
    /// a warning and excluded from verification, never a failure.
    Legacy,
    /// Anything else.
    Malformed,
}

/// Classify a declared checksum by shape.
pub fn classify_checksum(checksum: &str) -> ChecksumKind {
    let is_hex = !checksum.is_empty() && checksum.chars().all(|c| c.is_ascii_hexdigit());
    match (is_hex, checksum.len()) {
        (true, 64) => ChecksumKind::Sha256,
        (true, 32) => ChecksumKind::Legacy,
        _ => ChecksumKind::Malformed,
    }
}

/// SHA-256 of a byte slice, lowercase hex.
pub fn sha256_bytes(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// SHA-256 of a file, computed streamingly, lowercase hex.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file<P: AsRef<Path>>(path: P) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
