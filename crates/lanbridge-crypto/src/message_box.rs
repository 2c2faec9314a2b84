//! ChaCha20-Poly1305 sealing of wire frames.

use crate::CryptoError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use rand_core::{OsRng, RngCore};

/// Nonce length in bytes.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Seals and opens individual wire frames under the shared key.
///
/// Wire form: `base64(nonce(12) || ciphertext || tag(16))` of the UTF-8
/// JSON envelope. No associated data is bound.
pub struct MessageBox {
    cipher: ChaCha20Poly1305,
}

impl MessageBox {
    /// Create a message box over the given key.
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(key.into()),
        }
    }

    /// Seal a plaintext frame under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::EncryptionFailed`] if the AEAD rejects the
    /// input; fatal only to this individual send.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut framed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        framed.extend_from_slice(&nonce_bytes);
        framed.extend_from_slice(&ciphertext);

        Ok(BASE64.encode(framed))
    }

    /// Open a sealed frame back into its plaintext.
    ///
    /// # Errors
    ///
    /// Returns an error for bad base64, a frame too short to carry nonce and
    /// tag, an authentication failure, or non-UTF-8 plaintext. The caller
    /// logs and drops the frame; a decrypt failure never tears down the
    /// session by itself.
    pub fn open(&self, body: &str) -> Result<String, CryptoError> {
        let framed = BASE64.decode(body.trim())?;

        if framed.len() < NONCE_SIZE + TAG_SIZE {
            return Err(CryptoError::FrameTooShort {
                expected: NONCE_SIZE + TAG_SIZE,
                actual: framed.len(),
            });
        }

        let (nonce_bytes, ciphertext) = framed.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::NotUtf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_box() -> MessageBox {
        MessageBox::new(&[0x42u8; 32])
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let mbox = test_box();
        let frame = r#"{"type":"ping","data":{}}"#;

        let sealed = mbox.seal(frame).unwrap();
        assert_ne!(sealed, frame);
        assert_eq!(mbox.open(&sealed).unwrap(), frame);
    }

    #[test]
    fn test_fresh_nonce_per_seal() {
        let mbox = test_box();
        let a = mbox.seal("same").unwrap();
        let b = mbox.seal("same").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tamper_detection() {
        let mbox = test_box();
        let sealed = mbox.seal("payload").unwrap();

        let mut raw = BASE64.decode(&sealed).unwrap();
        raw[NONCE_SIZE] ^= 0xFF;
        let tampered = BASE64.encode(raw);

        assert!(matches!(
            mbox.open(&tampered),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_wrong_key_fails() {
        let sealed = test_box().seal("payload").unwrap();
        let other = MessageBox::new(&[0x24u8; 32]);

        assert!(matches!(
            other.open(&sealed),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_short_frame_rejected() {
        let mbox = test_box();
        let short = BASE64.encode([0u8; NONCE_SIZE + TAG_SIZE - 1]);

        assert!(matches!(
            mbox.open(&short),
            Err(CryptoError::FrameTooShort { .. })
        ));
    }

    #[test]
    fn test_garbage_base64_rejected() {
        let mbox = test_box();
        assert!(matches!(
            mbox.open("not base64 at all!!!"),
            Err(CryptoError::Base64(_))
        ));
    }

    #[test]
    fn test_unicode_roundtrip() {
        let mbox = test_box();
        let frame = r#"{"type":"clipboardUpdate","data":{"text":"héllo 📋"}}"#;
        let sealed = mbox.seal(frame).unwrap();
        assert_eq!(mbox.open(&sealed).unwrap(), frame);
    }
}
