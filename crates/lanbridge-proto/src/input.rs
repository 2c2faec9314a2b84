//! Remote-control-of-desktop input payloads.

use serde::{Deserialize, Serialize};

/// Keyboard modifier names carried in a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyModifier {
    /// Shift key.
    Shift,
    /// Control key.
    Control,
    /// Option/Alt key.
    Option,
    /// Command/Super key.
    Command,
}

/// Mouse button names for click events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MouseButton {
    /// Left button.
    Left,
    /// Right button.
    Right,
    /// Middle button.
    Center,
}

/// Inbound `remoteControl` payload.
///
/// The peer drives the desktop: keyboard, volume, media, and mouse events.
/// Each event is forwarded to the platform injector collaborator; none of
/// them produce a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RemoteControl {
    /// Press a named key with modifiers.
    KeyPress {
        /// Key name (platform injector vocabulary).
        key: String,
        /// Held modifiers.
        #[serde(default)]
        modifiers: Vec<KeyModifier>,
    },
    /// Type a string of text.
    TypeText {
        /// Text to type.
        text: String,
    },
    /// Directional: up.
    DpadUp,
    /// Directional: down.
    DpadDown,
    /// Directional: left.
    DpadLeft,
    /// Directional: right.
    DpadRight,
    /// Enter/return key.
    Enter,
    /// Space key.
    Space,
    /// Escape key.
    Escape,
    /// Step system volume up.
    VolumeUp,
    /// Step system volume down.
    VolumeDown,
    /// Toggle system mute.
    VolumeMute,
    /// Set absolute system volume.
    SetVolume {
        /// Level 0..=100.
        level: u8,
    },
    /// Toggle local media play/pause.
    MediaPlayPause,
    /// Local media next track.
    MediaNext,
    /// Local media previous track.
    MediaPrevious,
    /// Relative mouse movement.
    MouseMove {
        /// Horizontal delta in points.
        dx: f64,
        /// Vertical delta in points.
        dy: f64,
    },
    /// Mouse button transition.
    MouseClick {
        /// Which button.
        button: MouseButton,
        /// True on press, false on release.
        down: bool,
    },
    /// Mouse scroll.
    MouseScroll {
        /// Horizontal scroll delta.
        dx: f64,
        /// Vertical scroll delta.
        dy: f64,
    },
}

/// Outbound `modifierStatus` payload: current desktop modifier state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierStatus {
    /// Shift held.
    pub shift: bool,
    /// Control held.
    pub control: bool,
    /// Option/Alt held.
    pub option: bool,
    /// Command/Super held.
    pub command: bool,
    /// Caps lock engaged.
    pub caps_lock: bool,
}
