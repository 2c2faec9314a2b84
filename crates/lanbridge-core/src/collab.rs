//! Collaborator contracts for the platform pieces outside the core.
//!
//! The pasteboard, the media player, the system volume, the input injector,
//! and the notification center are owned by platform glue. The core talks to
//! them through these traits; the defaults do nothing, which is what
//! headless and test runs want.

use lanbridge_proto::{MediaAction, RemoteControl};
use std::sync::Arc;

/// OS pasteboard.
pub trait Pasteboard: Send + Sync {
    /// Replace the pasteboard contents with `text`.
    fn set_text(&self, text: &str);
}

/// Local media player control.
pub trait MediaController: Send + Sync {
    /// Apply an action to the local player; returns whether it was accepted.
    fn apply(&self, action: MediaAction) -> bool;
}

/// Local system volume control.
pub trait VolumeController: Send + Sync {
    /// Step volume up.
    fn volume_up(&self);
    /// Step volume down.
    fn volume_down(&self);
    /// Toggle mute.
    fn toggle_mute(&self);
    /// Set an absolute level, 0..=100.
    fn set_volume(&self, level: u8);
}

/// Native hotkey/mouse injector for remote control of the desktop.
pub trait InputInjector: Send + Sync {
    /// Execute one remote input event.
    fn inject(&self, event: &RemoteControl);
}

/// OS notification center.
pub trait SystemNotifier: Send + Sync {
    /// Post a notification.
    fn post(&self, title: &str, body: &str);
    /// Dismiss the OS-level notification mirroring peer notification `id`.
    fn dismiss(&self, id: &str);
}

struct Null;

impl Pasteboard for Null {
    fn set_text(&self, _text: &str) {}
}
impl MediaController for Null {
    fn apply(&self, _action: MediaAction) -> bool {
        false
    }
}
impl VolumeController for Null {
    fn volume_up(&self) {}
    fn volume_down(&self) {}
    fn toggle_mute(&self) {}
    fn set_volume(&self, _level: u8) {}
}
impl InputInjector for Null {
    fn inject(&self, _event: &RemoteControl) {}
}
impl SystemNotifier for Null {
    fn post(&self, _title: &str, _body: &str) {}
    fn dismiss(&self, _id: &str) {}
}

/// The bundle of collaborators injected at daemon startup.
#[derive(Clone)]
pub struct Collaborators {
    /// OS pasteboard.
    pub pasteboard: Arc<dyn Pasteboard>,
    /// Local media player.
    pub media: Arc<dyn MediaController>,
    /// Local system volume.
    pub volume: Arc<dyn VolumeController>,
    /// Input injector.
    pub injector: Arc<dyn InputInjector>,
    /// OS notification center.
    pub notifier: Arc<dyn SystemNotifier>,
}

impl Default for Collaborators {
    fn default() -> Self {
        let null = Arc::new(Null);
        Self {
            pasteboard: null.clone(),
            media: null.clone(),
            volume: null.clone(),
            injector: null.clone(),
            notifier: null,
        }
    }
}
