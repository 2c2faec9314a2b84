//! The last-paired registry: one remembered peer per /24 network.

use crate::{NetError, NetworkKey};
use lanbridge_proto::PeerDevice;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistent map from network key to the last peer paired on that network.
///
/// At most one entry per /24; a later successful handshake on the same
/// network replaces the previous entry. Stored as JSON.
#[derive(Debug)]
pub struct PairingRegistry {
    path: PathBuf,
    entries: HashMap<String, PeerDevice>,
}

impl PairingRegistry {
    /// Load the registry from disk, starting empty if the file is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetError> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            HashMap::new()
        };

        Ok(Self { path, entries })
    }

    /// Record (or replace) the peer for a network key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be written.
    pub fn record(&mut self, network: NetworkKey, peer: PeerDevice) -> Result<(), NetError> {
        tracing::debug!(network = %network, peer = %peer.name, "recording pairing");
        self.entries.insert(network.to_string(), peer);
        self.save()
    }

    /// Look up the remembered peer for a network key.
    pub fn lookup(&self, network: NetworkKey) -> Option<&PeerDevice> {
        self.entries.get(&network.to_string())
    }

    /// Number of remembered networks.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<(), NetError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
