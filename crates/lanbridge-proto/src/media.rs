//! Media and volume control payloads.

use serde::{Deserialize, Serialize};

/// Shared media action vocabulary for `mediaControl` and `macMediaControl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MediaAction {
    /// Start playback.
    Play,
    /// Pause playback.
    Pause,
    /// Toggle play/pause.
    PlayPause,
    /// Skip to next track.
    Next,
    /// Skip to previous track.
    Previous,
    /// Stop playback.
    Stop,
    /// Like the current track.
    Like,
    /// Remove a like from the current track.
    Unlike,
    /// Toggle the like state.
    ToggleLike,
}

/// Outbound `mediaControl` payload: drive the peer's player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaControl {
    /// Requested action.
    pub action: MediaAction,
}

/// Inbound `mediaControlResponse` payload (informational).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaControlResponse {
    /// Action the peer executed.
    pub action: MediaAction,
    /// Whether the peer's player accepted it.
    pub success: bool,
}

/// Inbound `macMediaControl` payload: the peer drives our local player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacMediaControl {
    /// Requested action.
    pub action: MediaAction,
}

/// Outbound `macMediaControlResponse` payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacMediaControlResponse {
    /// Action we executed locally.
    pub action: MediaAction,
    /// Whether the local media collaborator accepted it.
    pub success: bool,
}

/// Volume action vocabulary for `volumeControl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeAction {
    /// Step volume up.
    VolumeUp,
    /// Step volume down.
    VolumeDown,
    /// Toggle mute.
    Mute,
    /// Set an absolute level (requires `level`).
    SetVolume,
}

/// Outbound `volumeControl` payload: drive the peer's volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VolumeControl {
    /// Requested action.
    pub action: VolumeAction,
    /// Absolute level 0..=100, only meaningful with [`VolumeAction::SetVolume`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u8>,
}

/// Outbound `macVolume` payload: report the desktop's own volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacVolume {
    /// Desktop volume, 0..=100.
    pub volume: u8,
}
