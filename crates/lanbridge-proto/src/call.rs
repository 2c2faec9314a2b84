//! Call event and call control payloads.

use serde::{Deserialize, Serialize};

/// Direction of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallDirection {
    /// Call placed to the peer device.
    Incoming,
    /// Call placed from the peer device.
    Outgoing,
}

/// State of a call as reported by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallState {
    /// Incoming call ringing.
    Ringing,
    /// Outgoing call dialling.
    Dialing,
    /// Call connected.
    Active,
    /// Call on hold.
    Held,
    /// Call ended normally.
    Ended,
    /// Incoming call not answered.
    Missed,
}

/// Inbound `callEvent` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    /// Peer-assigned event id; updates reuse the id of the call they mutate.
    pub event_id: String,
    /// Raw dialled/received number.
    pub number: String,
    /// E.164-normalised number.
    #[serde(default)]
    pub normalized_number: String,
    /// Call direction.
    pub direction: CallDirection,
    /// Current call state.
    pub state: CallState,
    /// Event timestamp, milliseconds since the epoch.
    pub timestamp: i64,
    /// Identifier of the device the call is on.
    pub device_id: String,
    /// Contact name, when the peer resolved one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    /// Base64 contact photo, when available.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_photo: Option<String>,
}

/// Action vocabulary for outbound `callControl`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CallAction {
    /// Accept the ringing call.
    Accept,
    /// Hang up the call.
    End,
}

/// Outbound `callControl` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallControl {
    /// Event id of the call to act on.
    pub event_id: String,
    /// Requested action.
    pub action: CallAction,
}

/// Inbound `callControlResponse` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallControlResponse {
    /// Event id of the call acted on.
    pub event_id: String,
    /// Whether the peer executed the action.
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_event_decode() {
        let json = r#"{
            "eventId": "c42",
            "number": "+15551234567",
            "normalizedNumber": "+15551234567",
            "direction": "incoming",
            "state": "ringing",
            "timestamp": 1722470400000,
            "deviceId": "pixel-1",
            "contactName": "Alice"
        }"#;
        let event: CallEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.direction, CallDirection::Incoming);
        assert_eq!(event.state, CallState::Ringing);
        assert_eq!(event.contact_name.as_deref(), Some("Alice"));
        assert!(event.contact_photo.is_none());
    }

    #[test]
    fn test_call_state_is_closed_set() {
        assert!(serde_json::from_str::<CallState>("\"connected\"").is_err());
        assert!(serde_json::from_str::<CallState>("\"held\"").is_ok());
    }
}
