//! Persistence of the 256-bit shared pairing key.

use crate::{CryptoError, KEY_SIZE};
use rand_core::{OsRng, RngCore};
use std::fs;
use std::path::{Path, PathBuf};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// The shared symmetric key. Zeroed on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedKey([u8; KEY_SIZE]);

impl SharedKey {
    /// Generate a fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material.
        f.write_str("SharedKey(..)")
    }
}

impl TryFrom<&[u8]> for SharedKey {
    type Error = CryptoError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let array: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKeyLength(bytes.len()))?;
        Ok(Self(array))
    }
}

/// Loads, creates, and resets the persisted pairing key.
///
/// The key is stored verbatim as 32 raw bytes. It is created on first start
/// and reused on every subsequent start until the operator resets it, which
/// invalidates all existing pairings.
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    /// Create a key store at the given file path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the key file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored key, generating and persisting one if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or written, or if an
    /// existing file does not hold exactly 32 bytes.
    pub fn load_or_generate(&self) -> Result<SharedKey, CryptoError> {
        if self.path.exists() {
            let bytes = fs::read(&self.path)?;
            return SharedKey::try_from(bytes.as_slice());
        }

        tracing::info!(path = %self.path.display(), "no pairing key found, generating");
        let key = SharedKey::generate();
        self.persist(&key)?;
        Ok(key)
    }

    /// Replace the stored key with a fresh one. Peers must re-pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the new key cannot be written.
    pub fn reset(&self) -> Result<SharedKey, CryptoError> {
        tracing::warn!(path = %self.path.display(), "resetting pairing key");
        let key = SharedKey::generate();
        self.persist(&key)?;
        Ok(key)
    }

    fn persist(&self, key: &SharedKey) -> Result<(), CryptoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, key.as_bytes())?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_generate_then_reload() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("key"));

        let first = store.load_or_generate().unwrap();
        let second = store.load_or_generate().unwrap();

        assert_eq!(first.as_bytes(), second.as_bytes());
    }

    #[test]
    fn test_reset_replaces_key() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("key"));

        let original = store.load_or_generate().unwrap();
        let rotated = store.reset().unwrap();

        assert_ne!(original.as_bytes(), rotated.as_bytes());

        // Reload returns the rotated key, not the original.
        let reloaded = store.load_or_generate().unwrap();
        assert_eq!(reloaded.as_bytes(), rotated.as_bytes());
    }

    #[test]
    fn test_wrong_length_file_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("key");
        fs::write(&path, [0u8; 16]).unwrap();

        let store = KeyStore::new(&path);
        assert!(matches!(
            store.load_or_generate(),
            Err(CryptoError::InvalidKeyLength(16))
        ));
    }

    #[test]
    fn test_creates_parent_directory() {
        let dir = TempDir::new().unwrap();
        let store = KeyStore::new(dir.path().join("nested/dir/key"));
        assert!(store.load_or_generate().is_ok());
    }
}
