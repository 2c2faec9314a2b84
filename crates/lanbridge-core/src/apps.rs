//! Persisted app inventory and the on-disk icon cache.

use crate::CoreError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use lanbridge_proto::AppIcons;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One known app on the peer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppEntry {
    /// Display name.
    pub name: String,
    /// Whether it is a system app.
    pub system_app: bool,
    /// Whether notifications from it are forwarded.
    pub listening: bool,
}

/// The app inventory: entries persisted as JSON, one cached PNG per package.
///
/// Reconciled wholesale against each inbound `appIcons` payload: entries
/// present only locally are removed along with their icon, entries in both
/// are updated in place, entries only remote are created and their icon
/// written.
#[derive(Debug)]
pub struct AppInventory {
    dir: PathBuf,
    entries: HashMap<String, AppEntry>,
}

impl AppInventory {
    /// Load the inventory rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// inventory file cannot be parsed.
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, CoreError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let index = dir.join("inventory.json");
        let entries = if index.exists() {
            serde_json::from_str(&fs::read_to_string(&index)?)?
        } else {
            HashMap::new()
        };

        Ok(Self { dir, entries })
    }

    /// Number of known packages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the inventory is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up one entry.
    pub fn get(&self, package: &str) -> Option<&AppEntry> {
        self.entries.get(package)
    }

    /// Packages for which a cached icon exists on disk, sorted. Advertised
    /// in the handshake reply so the peer can skip re-sending icons.
    pub fn packages_with_icons(&self) -> Vec<String> {
        let mut packages: Vec<String> = self
            .entries
            .keys()
            .filter(|package| self.icon_path(package).exists())
            .cloned()
            .collect();
        packages.sort();
        packages
    }

    /// Flip the `listening` flag for one package and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory cannot be written.
    pub fn set_listening(&mut self, package: &str, state: bool) -> Result<bool, CoreError> {
        match self.entries.get_mut(package) {
            Some(entry) => {
                entry.listening = state;
                self.save()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Reconcile against an inbound `appIcons` payload and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the inventory file cannot be written; individual
    /// icon failures are logged and skipped.
    pub fn reconcile(&mut self, icons: &AppIcons) -> Result<(), CoreError> {
        // Local-only entries go away, icon file included.
        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|package| !icons.contains_key(*package))
            .cloned()
            .collect();
        for package in stale {
            self.entries.remove(&package);
            let icon = self.icon_path(&package);
            if icon.exists() {
                let _ = fs::remove_file(icon);
            }
            tracing::debug!(package, "app removed from inventory");
        }

        for (package, remote) in icons {
            self.entries.insert(
                package.clone(),
                AppEntry {
                    name: remote.name.clone(),
                    system_app: remote.system_app,
                    listening: remote.listening,
                },
            );

            if let Some(icon_b64) = &remote.icon {
                match decode_icon(icon_b64) {
                    Ok(png) => {
                        if let Err(err) = fs::write(self.icon_path(package), png) {
                            tracing::warn!(package, %err, "icon write failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(package, %err, "icon payload not decodable");
                    }
                }
            }
        }

        self.save()
    }

    fn icon_path(&self, package: &str) -> PathBuf {
        self.dir.join(format!("{package}.png"))
    }

    fn save(&self) -> Result<(), CoreError> {
        let index = self.dir.join("inventory.json");
        fs::write(index, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// Decode a base64 PNG, tolerating an optional data-URI prefix.
fn decode_icon(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let raw = payload
        .split_once("base64,")
        .map(|(_, tail)| tail)
        .unwrap_or(payload);
    BASE64.decode(raw.trim())
}
