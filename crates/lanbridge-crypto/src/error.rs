//! Error types for the crypto box.

use thiserror::Error;

/// Crypto box errors.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// AEAD seal failed.
    #[error("encryption failed")]
    EncryptionFailed,

    /// AEAD open failed (wrong key, tampered frame, or truncated tag).
    #[error("decryption failed")]
    DecryptionFailed,

    /// Frame body was not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Frame too short to hold nonce and tag.
    #[error("frame too short: expected at least {expected}, got {actual}")]
    FrameTooShort {
        /// Minimum sealed frame length.
        expected: usize,
        /// Actual decoded length.
        actual: usize,
    },

    /// Opened plaintext was not UTF-8.
    #[error("plaintext is not valid UTF-8")]
    NotUtf8,

    /// Persisted key file has the wrong length.
    #[error("stored key has invalid length {0}, expected 32")]
    InvalidKeyLength(usize),

    /// Key file I/O failure.
    #[error("key store I/O: {0}")]
    Io(#[from] std::io::Error),
}
