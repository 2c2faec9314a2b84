//! Peer status snapshot payloads.

use serde::{Deserialize, Serialize};

/// Battery state reported by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatteryStatus {
    /// Charge level, 0..=100.
    pub level: u8,
    /// Whether the device is currently charging.
    pub charging: bool,
}

/// Media playback state reported by the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MediaState {
    /// Whether anything is playing.
    pub playing: bool,
    /// Track title.
    #[serde(default)]
    pub title: String,
    /// Track artist.
    #[serde(default)]
    pub artist: String,
    /// Media volume, 0..=100.
    #[serde(default)]
    pub volume: u8,
    /// Whether media volume is muted.
    #[serde(default)]
    pub muted: bool,
    /// Base64 album art blob.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    /// Like state of the current track, if the player exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_status: Option<String>,
}

/// Inbound `status` payload.
///
/// Overwrites the daemon's snapshot wholesale each time it arrives; fields
/// are never merged with the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerStatus {
    /// Battery state.
    pub battery: BatteryStatus,
    /// Whether the peer considers itself paired with us.
    pub paired: bool,
    /// Media playback state.
    #[serde(default)]
    pub media: MediaState,
}
