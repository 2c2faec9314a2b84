//! Notification, app-inventory, and clipboard payloads.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Kind of a notification action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Plain tap action.
    Button,
    /// Action expecting reply text.
    Reply,
}

/// One action attached to a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActionDef {
    /// Action name as shown on the peer.
    pub name: String,
    /// Whether the action takes reply text.
    pub kind: ActionKind,
}

/// Inbound `notification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Peer-assigned notification id.
    pub id: String,
    /// Title line.
    pub title: String,
    /// Body text.
    #[serde(default)]
    pub body: String,
    /// Human-readable app label.
    #[serde(default)]
    pub app: String,
    /// App package identifier.
    #[serde(default)]
    pub package: String,
    /// Actions the peer can invoke on our behalf.
    #[serde(default)]
    pub actions: Vec<NotificationActionDef>,
}

/// Inbound `notificationUpdate` payload.
///
/// Dismissal is signalled either via `action: "dismiss"` or
/// `dismissed: true`; both spellings appear in the wild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationUpdate {
    /// Notification id being updated.
    pub id: String,
    /// Update action, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Dismissal flag, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dismissed: Option<bool>,
}

impl NotificationUpdate {
    /// Whether this update dismisses the notification.
    pub fn is_dismissal(&self) -> bool {
        self.dismissed == Some(true) || self.action.as_deref() == Some("dismiss")
    }
}

/// Outbound `notificationAction` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationAction {
    /// Notification id.
    pub id: String,
    /// Action name to invoke.
    pub name: String,
    /// Reply text for `Reply` actions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Inbound `notificationActionResponse` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActionResponse {
    /// Notification id.
    pub id: String,
    /// Action name that was invoked.
    pub action: String,
    /// Whether the peer managed to invoke it.
    pub success: bool,
    /// Optional failure detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outbound `dismissNotification` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissNotification {
    /// Notification id to dismiss on the peer.
    pub id: String,
}

/// Inbound `dismissalResponse` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DismissalResponse {
    /// Notification id.
    pub id: String,
    /// Whether the peer dismissed it.
    pub success: bool,
}

/// One entry of the inbound `appIcons` inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppIconEntry {
    /// App display name.
    pub name: String,
    /// Base64 PNG icon, possibly with a data-URI prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Whether the app is a system app.
    #[serde(default)]
    pub system_app: bool,
    /// Whether notifications from this app are forwarded.
    #[serde(default)]
    pub listening: bool,
}

/// Inbound `appIcons` payload: package identifier to entry.
pub type AppIcons = HashMap<String, AppIconEntry>;

/// Outbound `toggleAppNotif` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleAppNotif {
    /// Package identifier.
    pub package: String,
    /// New listening state.
    pub state: bool,
}

/// `clipboardUpdate` payload, both directions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardUpdate {
    /// Clipboard text.
    pub text: String,
}
