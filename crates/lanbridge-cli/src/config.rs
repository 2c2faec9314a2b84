//! Configuration file for the lanbridge CLI.

use lanbridge_core::DaemonConfig;
use lanbridge_net::InterfaceSelection;
use lanbridge_proto::{DEFAULT_CHUNK_SIZE, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// lanbridge configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Network settings.
    #[serde(default)]
    pub network: NetworkConfig,
    /// Advertised device identity.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Transfer settings.
    #[serde(default)]
    pub transfer: TransferConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// TCP port the daemon listens on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Interface name, or "auto" for the first usable one.
    #[serde(default = "default_interface")]
    pub interface: String,
    /// Run the wire in the clear (no pairing key). Debug only.
    #[serde(default)]
    pub plaintext: bool,
}

/// Advertised device identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Name shown on the peer.
    #[serde(default = "default_device_name")]
    pub name: String,
    /// Category string.
    #[serde(default = "default_category")]
    pub category: String,
    /// Model string.
    #[serde(default)]
    pub model: String,
}

/// Transfer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Chunk size in bytes for outbound transfers.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Where inbound files land; defaults to the OS downloads directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloads_dir: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_interface() -> String {
    "auto".to_string()
}

fn default_device_name() -> String {
    hostname().unwrap_or_else(|| "lanbridge".to_string())
}

fn default_category() -> String {
    "desktop".to_string()
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn hostname() -> Option<String> {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|name| !name.is_empty())
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            interface: default_interface(),
            plaintext: false,
        }
    }
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: default_device_name(),
            category: default_category(),
            model: String::new(),
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            downloads_dir: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save configuration to a file, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default config path (`~/.config/lanbridge/config.toml`).
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("lanbridge/config.toml")
    }

    /// Load from the default path, writing defaults there on first run.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or creating the config fails.
    pub fn load_or_default() -> anyhow::Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load(&path)
        } else {
            let config = Self::default();
            config.save(&path)?;
            Ok(config)
        }
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid field.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.network.port == 0 {
            anyhow::bail!("network.port must be non-zero");
        }

        if self.transfer.chunk_size == 0 || self.transfer.chunk_size > 4 * 1024 * 1024 {
            anyhow::bail!("transfer.chunk_size must be between 1 and 4 MiB");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!(
                "invalid logging.level: {}. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            );
        }

        Ok(())
    }

    /// Data directory (`~/.local/share/lanbridge` or platform equivalent).
    #[must_use]
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join("lanbridge")
    }

    /// Resolve the downloads directory.
    #[must_use]
    pub fn downloads_dir(&self) -> PathBuf {
        self.transfer
            .downloads_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Build the daemon configuration.
    #[must_use]
    pub fn to_daemon_config(&self) -> DaemonConfig {
        let data_dir = Self::data_dir();
        let mut config = DaemonConfig::with_dirs(data_dir, self.downloads_dir());

        config.port = self.network.port;
        config.interface = InterfaceSelection::parse(&self.network.interface);
        config.device_name = self.device.name.clone();
        config.device_category = self.device.category.clone();
        config.device_model = self.device.model.clone();
        config.chunk_size = self.transfer.chunk_size;
        if self.network.plaintext {
            config.key_file = None;
        }

        config
    }
}
