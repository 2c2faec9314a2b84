//! # lanbridge-proto
//!
//! Wire protocol definitions for the lanbridge daemon.
//!
//! This crate defines the closed set of message kinds exchanged with the
//! companion device, the payload schema for each kind, and the JSON envelope
//! they travel in. Every frame on the wire is a UTF-8 JSON object of the form
//! `{"type": "<kind>", "data": { ... }}`, optionally sealed by the crypto
//! layer before transmission.
//!
//! The catalogue is modelled as a single tagged enum ([`Message`]) so that
//! decoding an unknown kind fails at the serde boundary and the router can
//! drop the frame without dispatching it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod call;
pub mod device;
pub mod input;
pub mod media;
pub mod message;
pub mod notify;
pub mod status;
pub mod transfer;

pub use call::{CallAction, CallControl, CallControlResponse, CallDirection, CallEvent, CallState};
pub use device::{DeviceInfo, MacInfo, PeerDevice};
pub use input::{KeyModifier, ModifierStatus, MouseButton, RemoteControl};
pub use media::{
    MacMediaControl, MacMediaControlResponse, MacVolume, MediaAction, MediaControl,
    MediaControlResponse, VolumeAction, VolumeControl,
};
pub use message::{Message, ProtoError};
pub use notify::{
    ActionKind, AppIconEntry, AppIcons, ClipboardUpdate, DismissNotification, DismissalResponse,
    Notification, NotificationAction, NotificationActionDef, NotificationActionResponse,
    NotificationUpdate, ToggleAppNotif,
};
pub use status::{BatteryStatus, MediaState, PeerStatus};
pub use transfer::{
    BrowseData, BrowseEntry, BrowseLs, FileChunk, FileChunkAck, FileTransferCancel,
    FileTransferComplete, FileTransferInit, TransferId, TransferVerified,
};

/// Default TCP port the daemon listens on.
pub const DEFAULT_PORT: u16 = 6996;

/// Stable WebSocket endpoint path.
pub const SOCKET_PATH: &str = "/socket";

/// Default file-transfer chunk size (64 KiB).
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Protocol version advertised in the handshake reply.
pub const PROTOCOL_VERSION: &str = "2.0.0";
