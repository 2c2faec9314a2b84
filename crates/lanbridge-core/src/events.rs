//! Typed event channel from the core to its subscribers.

use lanbridge_proto::{
    BrowseData, CallEvent, DismissalResponse, Notification, NotificationActionResponse,
    PeerDevice, PeerStatus, TransferId,
};
use lanbridge_transport::TransportStatus;
use std::path::PathBuf;

/// Everything externally observable that the daemon does.
///
/// Published on a `tokio::sync::broadcast` channel. Subscribers that lag are
/// allowed to miss events; nothing in the core depends on delivery.
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// Transport state changed.
    Transport(TransportStatus),
    /// A peer completed the handshake and became primary.
    PeerPaired(PeerDevice),
    /// The primary session ended; peer-derived state was cleared.
    PeerUnpaired,
    /// The bound address changed; any presented pairing code is stale.
    PairingCodeStale,
    /// Fresh peer status snapshot.
    PeerStatus(PeerStatus),
    /// Wallpaper blob from the handshake, for the UI.
    Wallpaper(String),
    /// Session count rose to one: enable auxiliary monitors.
    MonitorsEnabled,
    /// Session count fell to zero: disable auxiliary monitors.
    MonitorsDisabled,
    /// A notification arrived.
    NotificationPosted(Notification),
    /// A notification went away (peer dismissal or local action).
    NotificationDismissed {
        /// Notification id.
        id: String,
    },
    /// Peer answered a `notificationAction`.
    NotificationActionResult(NotificationActionResponse),
    /// Peer answered a `dismissNotification`.
    DismissalResult(DismissalResponse),
    /// Inbound clipboard text was pushed to the pasteboard.
    ClipboardReceived {
        /// The text.
        text: String,
    },
    /// App inventory was reconciled.
    AppsUpdated {
        /// Number of packages now known.
        packages: usize,
    },
    /// Call state changed.
    CallUpdated(CallEvent),
    /// A directory listing (or error) arrived for the browser.
    BrowseListing(BrowseData),
    /// Transfer progress.
    TransferProgress {
        /// Transfer id.
        id: TransferId,
        /// Bytes transferred.
        bytes: u64,
        /// Total bytes.
        total: u64,
    },
    /// An inbound transfer finished and the file landed.
    TransferCompleted {
        /// Transfer id.
        id: TransferId,
        /// Final path for inbound transfers.
        path: Option<PathBuf>,
        /// Checksum verdict, when one was computed.
        verified: Option<bool>,
    },
    /// A transfer failed.
    TransferFailed {
        /// Transfer id.
        id: TransferId,
        /// Human-readable reason.
        reason: String,
    },
    /// A transfer was cancelled (either side).
    TransferCancelled {
        /// Transfer id.
        id: TransferId,
    },
    /// A non-fatal transfer oddity (e.g. legacy checksum).
    TransferWarning {
        /// Transfer id.
        id: TransferId,
        /// Human-readable warning.
        message: String,
    },
    /// The peer's checksum verdict for one of our outbound transfers.
    TransferVerified {
        /// Transfer id.
        id: TransferId,
        /// Whether the peer's checksum matched.
        verified: bool,
    },
}
