//! Shared daemon state owned by the coordination task.

use lanbridge_proto::{BrowseData, CallEvent, Notification, PeerDevice, PeerStatus};
use std::collections::HashMap;

/// Peer-derived state. Owned and mutated only by the coordinator; published
/// outward through [`crate::UiEvent`]s.
#[derive(Debug, Default)]
pub struct SharedState {
    /// The paired peer, set by the handshake.
    pub peer: Option<PeerDevice>,
    /// Latest status snapshot; overwritten wholesale.
    pub status: Option<PeerStatus>,
    /// Live notifications by id.
    pub notifications: HashMap<String, Notification>,
    /// Call events by event id.
    pub calls: HashMap<String, CallEvent>,
    /// Latest directory listing for the browser view model.
    pub browse: Option<BrowseData>,
}

impl SharedState {
    /// Clear everything derived from the peer. Used on restart and when the
    /// primary session ends.
    pub fn clear_peer(&mut self) {
        self.peer = None;
        self.status = None;
        self.notifications.clear();
        self.calls.clear();
        self.browse = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lanbridge_proto::{BatteryStatus, MediaState};

    #[test]
    fn test_clear_peer_resets_everything() {
        let mut state = SharedState::default();
        state.peer = Some(PeerDevice {
            name: "P".into(),
            ip_address: "192.168.1.41".into(),
            port: 8090,
            version: "2.0.0".into(),
            wallpaper: None,
            extra_ports: Vec::new(),
        });
        state.status = Some(PeerStatus {
            battery: BatteryStatus {
                level: 50,
                charging: false,
            },
            paired: true,
            media: MediaState::default(),
        });
        state.notifications.insert(
            "n1".into(),
            Notification {
                id: "n1".into(),
                title: "t".into(),
                body: String::new(),
                app: String::new(),
                package: String::new(),
                actions: Vec::new(),
            },
        );

        state.clear_peer();

        assert!(state.peer.is_none());
        assert!(state.status.is_none());
        assert!(state.notifications.is_empty());
        assert!(state.calls.is_empty());
        assert!(state.browse.is_none());
    }
}
