//! # lanbridge-crypto
//!
//! Authenticated encryption for the lanbridge wire protocol.
//!
//! Every frame between the daemon and a paired device is sealed under a
//! single 256-bit symmetric key with ChaCha20-Poly1305 (96-bit nonce, 128-bit
//! tag). The wire form is `base64(nonce || ciphertext || tag)`. The key is
//! generated once on first start, persisted raw, and never crosses the
//! transport; resetting it invalidates all existing pairings.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod keystore;
pub mod message_box;

pub use error::CryptoError;
pub use keystore::{KeyStore, SharedKey};
pub use message_box::{MessageBox, NONCE_SIZE, TAG_SIZE};

/// Symmetric key length in bytes.
pub const KEY_SIZE: usize = 32;
