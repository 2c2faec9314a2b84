//! The message envelope: one tagged enum covering the whole wire catalogue.

use crate::call::{CallControl, CallControlResponse, CallEvent};
use crate::device::{DeviceInfo, MacInfo};
use crate::input::{ModifierStatus, RemoteControl};
use crate::media::{
    MacMediaControl, MacMediaControlResponse, MacVolume, MediaControl, MediaControlResponse,
    VolumeControl,
};
use crate::notify::{
    AppIcons, ClipboardUpdate, DismissNotification, DismissalResponse, Notification,
    NotificationAction, NotificationActionResponse, NotificationUpdate, ToggleAppNotif,
};
use crate::status::PeerStatus;
use crate::transfer::{
    BrowseData, BrowseLs, FileChunk, FileChunkAck, FileTransferCancel, FileTransferComplete,
    FileTransferInit, TransferVerified,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Envelope encode/decode errors.
#[derive(Debug, Error)]
pub enum ProtoError {
    /// Frame body was not a well-formed envelope of a known kind.
    #[error("frame decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// Message could not be serialized (should not happen for valid payloads).
    #[error("frame encode failed: {0}")]
    Encode(#[source] serde_json::Error),
}

/// A typed wire message: `{"type": "<kind>", "data": { ... }}`.
///
/// The closed catalogue of everything either peer may send. Kinds the peer
/// sends that are not listed here fail to decode and are dropped by the
/// router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Message {
    // Handshake
    /// Peer handshake.
    Device(DeviceInfo),
    /// Our handshake reply.
    MacInfo(MacInfo),

    // Status and media
    /// Peer status snapshot.
    Status(PeerStatus),
    /// Drive the peer's media player.
    MediaControl(MediaControl),
    /// Peer's verdict on a `mediaControl`.
    MediaControlResponse(MediaControlResponse),
    /// Peer drives our media player.
    MacMediaControl(MacMediaControl),
    /// Our verdict on a `macMediaControl`.
    MacMediaControlResponse(MacMediaControlResponse),
    /// Drive the peer's volume.
    VolumeControl(VolumeControl),
    /// Report our own volume to the peer.
    MacVolume(MacVolume),

    // Notifications
    /// New notification from the peer.
    Notification(Notification),
    /// Update (usually dismissal) of an existing notification.
    NotificationUpdate(NotificationUpdate),
    /// Ask the peer to invoke a notification action.
    NotificationAction(NotificationAction),
    /// Peer's verdict on a `notificationAction`.
    NotificationActionResponse(NotificationActionResponse),
    /// Ask the peer to dismiss a notification.
    DismissNotification(DismissNotification),
    /// Peer's verdict on a `dismissNotification`.
    DismissalResponse(DismissalResponse),

    // App inventory
    /// App inventory with icons.
    AppIcons(AppIcons),
    /// Toggle notification forwarding for one package.
    ToggleAppNotif(ToggleAppNotif),

    // Clipboard
    /// Clipboard text, either direction.
    ClipboardUpdate(ClipboardUpdate),

    // Remote input
    /// Peer drives desktop input.
    RemoteControl(RemoteControl),
    /// Desktop modifier-key state for the remote keyboard view.
    ModifierStatus(ModifierStatus),

    // File browse
    /// Request a remote directory listing.
    BrowseLs(BrowseLs),
    /// Remote directory listing or error.
    BrowseData(BrowseData),

    // File transfer
    /// Open a transfer.
    FileTransferInit(FileTransferInit),
    /// One chunk.
    FileChunk(FileChunk),
    /// Receipt acknowledgment for one chunk.
    FileChunkAck(FileChunkAck),
    /// Sender EOF announcement.
    FileTransferComplete(FileTransferComplete),
    /// Receiver's checksum verdict.
    TransferVerified(TransferVerified),
    /// Abort a transfer.
    FileTransferCancel(FileTransferCancel),

    // Calls
    /// Call state event from the peer.
    CallEvent(CallEvent),
    /// Ask the peer to accept/end a call.
    CallControl(CallControl),
    /// Peer's verdict on a `callControl`.
    CallControlResponse(CallControlResponse),

    // Session plumbing
    /// Ask the peer to drop the connection cleanly.
    DisconnectRequest {},
    /// Ask the peer to re-advertise its debug-bridge ports.
    RefreshAdbPorts {},
    /// Server liveness probe.
    Ping {},
    /// Client liveness reply.
    Pong {},
}

impl Message {
    /// Serialize to the JSON envelope string.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<String, ProtoError> {
        serde_json::to_string(self).map_err(ProtoError::Encode)
    }

    /// Decode a JSON envelope string into a typed message.
    ///
    /// # Errors
    ///
    /// Returns [`ProtoError::Decode`] for malformed JSON, an unknown kind,
    /// or a payload that does not match the kind's schema.
    pub fn decode(body: &str) -> Result<Self, ProtoError> {
        serde_json::from_str(body).map_err(ProtoError::Decode)
    }

    /// Wire name of the message kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Device(_) => "device",
            Message::MacInfo(_) => "macInfo",
            Message::Status(_) => "status",
            Message::MediaControl(_) => "mediaControl",
            Message::MediaControlResponse(_) => "mediaControlResponse",
            Message::MacMediaControl(_) => "macMediaControl",
            Message::MacMediaControlResponse(_) => "macMediaControlResponse",
            Message::VolumeControl(_) => "volumeControl",
            Message::MacVolume(_) => "macVolume",
            Message::Notification(_) => "notification",
            Message::NotificationUpdate(_) => "notificationUpdate",
            Message::NotificationAction(_) => "notificationAction",
            Message::NotificationActionResponse(_) => "notificationActionResponse",
            Message::DismissNotification(_) => "dismissNotification",
            Message::DismissalResponse(_) => "dismissalResponse",
            Message::AppIcons(_) => "appIcons",
            Message::ToggleAppNotif(_) => "toggleAppNotif",
            Message::ClipboardUpdate(_) => "clipboardUpdate",
            Message::RemoteControl(_) => "remoteControl",
            Message::ModifierStatus(_) => "modifierStatus",
            Message::BrowseLs(_) => "browseLs",
            Message::BrowseData(_) => "browseData",
            Message::FileTransferInit(_) => "fileTransferInit",
            Message::FileChunk(_) => "fileChunk",
            Message::FileChunkAck(_) => "fileChunkAck",
            Message::FileTransferComplete(_) => "fileTransferComplete",
            Message::TransferVerified(_) => "transferVerified",
            Message::FileTransferCancel(_) => "fileTransferCancel",
            Message::CallEvent(_) => "callEvent",
            Message::CallControl(_) => "callControl",
            Message::CallControlResponse(_) => "callControlResponse",
            Message::DisconnectRequest {} => "disconnectRequest",
            Message::RefreshAdbPorts {} => "refreshAdbPorts",
            Message::Ping {} => "ping",
            Message::Pong {} => "pong",
        }
    }

    /// Whether this kind belongs to the file-transfer control plane and must
    /// be processed on the serial file queue.
    pub fn is_file_frame(&self) -> bool {
        matches!(
            self,
            Message::FileTransferInit(_)
                | Message::FileChunk(_)
                | Message::FileChunkAck(_)
                | Message::FileTransferComplete(_)
                | Message::TransferVerified(_)
                | Message::FileTransferCancel(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceInfo;

    #[test]
    fn test_handshake_envelope_shape() {
        let json = r#"{"type":"device","data":{"name":"P","ipAddress":"192.168.1.41","port":8090,"version":"2.0.0"}}"#;
        let msg = Message::decode(json).unwrap();

        match msg {
            Message::Device(info) => assert_eq!(info.name, "P"),
            other => panic!("expected device, got {}", other.kind()),
        }
    }

    #[test]
    fn test_ping_pong_envelope() {
        let ping = Message::Ping {};
        assert_eq!(ping.encode().unwrap(), r#"{"type":"ping","data":{}}"#);

        let pong = Message::decode(r#"{"type":"pong","data":{}}"#).unwrap();
        assert_eq!(pong, Message::Pong {});
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = Message::decode(r#"{"type":"selfDestruct","data":{}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_malformed_payload_rejected() {
        // `device` requires name/ipAddress/port/version.
        let err = Message::decode(r#"{"type":"device","data":{"name":"P"}}"#);
        assert!(err.is_err());
    }

    #[test]
    fn test_roundtrip_preserves_kind_names() {
        let msg = Message::Device(DeviceInfo {
            name: "P".into(),
            ip_address: "10.0.0.2".into(),
            port: 9000,
            version: "2.0.0".into(),
            target_ip_address: None,
            adb_ports: None,
            wallpaper: None,
        });

        let encoded = msg.encode().unwrap();
        assert!(encoded.starts_with(r#"{"type":"device""#));
        assert_eq!(Message::decode(&encoded).unwrap(), msg);
    }

    #[test]
    fn test_file_frame_classification() {
        let cancel = Message::FileTransferCancel(crate::transfer::FileTransferCancel {
            id: uuid::Uuid::new_v4(),
        });
        assert!(cancel.is_file_frame());
        assert!(!Message::Ping {}.is_file_frame());
    }
}
