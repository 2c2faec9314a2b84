//! Daemon configuration.

use lanbridge_files::OutboundConfig;
use lanbridge_net::InterfaceSelection;
use lanbridge_proto::{DEFAULT_CHUNK_SIZE, DEFAULT_PORT};
use std::path::PathBuf;
use std::time::Duration;

/// Protocol timer knobs.
///
/// Defaults are the wire-protocol constants; integration tests shrink them.
#[derive(Debug, Clone, Copy)]
pub struct TimerConfig {
    /// Heartbeat ping cadence to the primary session.
    pub heartbeat: Duration,
    /// A session with no inbound frame for this long is stale.
    pub stale_after: Duration,
    /// Network probe cadence.
    pub probe_interval: Duration,
    /// Debounce before restarting on an interface change.
    pub restart_debounce: Duration,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            heartbeat: Duration::from_secs(5),
            stale_after: Duration::from_secs(11),
            probe_interval: Duration::from_secs(10),
            restart_debounce: Duration::from_secs(5),
        }
    }
}

/// Full daemon configuration, assembled by the CLI from its config file.
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// TCP port to listen on.
    pub port: u16,
    /// Interface selection: a name, or auto.
    pub interface: InterfaceSelection,
    /// Device name advertised in the handshake reply.
    pub device_name: String,
    /// Device category advertised in the handshake reply.
    pub device_category: String,
    /// Device model advertised in the handshake reply.
    pub device_model: String,
    /// Subscription flag advertised in the handshake reply.
    pub plus: bool,
    /// Where completed inbound files land.
    pub downloads_dir: PathBuf,
    /// Key file, pairing registry, and icon cache live here.
    pub data_dir: PathBuf,
    /// Pairing key file; `None` runs the transport in the clear.
    pub key_file: Option<PathBuf>,
    /// Chunk size for outbound transfers.
    pub chunk_size: usize,
    /// Protocol timers.
    pub timers: TimerConfig,
    /// Outbound transfer window/retry knobs.
    pub outbound: OutboundConfig,
}

impl DaemonConfig {
    /// A configuration rooted at `data_dir` with every knob at its default.
    pub fn with_dirs(data_dir: PathBuf, downloads_dir: PathBuf) -> Self {
        let key_file = data_dir.join("pairing.key");
        Self {
            port: DEFAULT_PORT,
            interface: InterfaceSelection::Auto,
            device_name: "lanbridge".to_string(),
            device_category: "desktop".to_string(),
            device_model: String::new(),
            plus: false,
            downloads_dir,
            data_dir,
            key_file: Some(key_file),
            chunk_size: DEFAULT_CHUNK_SIZE,
            timers: TimerConfig::default(),
            outbound: OutboundConfig::default(),
        }
    }

    /// Path of the pairing registry file.
    pub fn registry_path(&self) -> PathBuf {
        self.data_dir.join("paired.json")
    }

    /// Directory of the app-icon cache.
    pub fn icon_cache_dir(&self) -> PathBuf {
        self.data_dir.join("icons")
    }
}
