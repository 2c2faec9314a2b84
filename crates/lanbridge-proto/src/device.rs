//! Handshake payloads and the peer device record derived from them.

use serde::{Deserialize, Serialize};

/// Inbound `device` handshake payload.
///
/// Sent by the companion device as the first frame on a new session. The
/// optional `target_ip_address` is the address the device believes it is
/// talking to; it drives primary-session election when two handshakes race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Human-readable device name.
    pub name: String,
    /// The device's own IPv4 address.
    pub ip_address: String,
    /// Port the device listens on for wake requests.
    pub port: u16,
    /// Protocol version the device speaks.
    pub version: String,
    /// Address the device dialled to reach us, if it reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_ip_address: Option<String>,
    /// Extra debug-bridge ports advertised by the device.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adb_ports: Option<Vec<u16>>,
    /// Base64 wallpaper blob forwarded to the UI collaborator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
}

/// Outbound `macInfo` handshake reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacInfo {
    /// Local device name shown on the peer.
    pub name: String,
    /// Device category string (e.g. "laptop").
    pub category: String,
    /// Model string (e.g. "MacBookPro18,3").
    pub model: String,
    /// Protocol version we speak.
    pub version: String,
    /// Subscription flag the peer uses to unlock extra features.
    pub plus: bool,
    /// Package identifiers for which we already hold cached icons, so the
    /// peer can skip re-sending them.
    #[serde(default)]
    pub saved_icon_packages: Vec<String>,
}

/// The paired peer as remembered by the daemon.
///
/// Created on handshake and replaced wholesale if the peer re-handshakes;
/// destroyed when the primary session ends. Also the value persisted in the
/// quick-connect registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerDevice {
    /// Device name.
    pub name: String,
    /// IPv4 address of the device.
    pub ip_address: String,
    /// Wake/listen port on the device.
    pub port: u16,
    /// Protocol version.
    pub version: String,
    /// Wallpaper blob, if the device sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallpaper: Option<String>,
    /// Extra ports advertised by the device.
    #[serde(default)]
    pub extra_ports: Vec<u16>,
}

impl From<DeviceInfo> for PeerDevice {
    fn from(info: DeviceInfo) -> Self {
        Self {
            name: info.name,
            ip_address: info.ip_address,
            port: info.port,
            version: info.version,
            wallpaper: info.wallpaper,
            extra_ports: info.adb_ports.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_info_decodes_minimal_payload() {
        let json = r#"{"name":"P","ipAddress":"192.168.1.41","port":8090,"version":"2.0.0"}"#;
        let info: DeviceInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.name, "P");
        assert_eq!(info.ip_address, "192.168.1.41");
        assert_eq!(info.port, 8090);
        assert!(info.target_ip_address.is_none());
        assert!(info.adb_ports.is_none());
    }

    #[test]
    fn test_device_info_decodes_full_payload() {
        let json = r#"{
            "name": "Pixel",
            "ipAddress": "192.168.1.41",
            "port": 8090,
            "version": "2.0.0",
            "targetIpAddress": "192.168.1.34",
            "adbPorts": [5555, 5556],
            "wallpaper": "aGk="
        }"#;
        let info: DeviceInfo = serde_json::from_str(json).unwrap();

        assert_eq!(info.target_ip_address.as_deref(), Some("192.168.1.34"));
        assert_eq!(info.adb_ports, Some(vec![5555, 5556]));
        assert_eq!(info.wallpaper.as_deref(), Some("aGk="));
    }

    #[test]
    fn test_peer_device_from_device_info() {
        let info = DeviceInfo {
            name: "Pixel".into(),
            ip_address: "192.168.1.41".into(),
            port: 8090,
            version: "2.0.0".into(),
            target_ip_address: None,
            adb_ports: Some(vec![5555]),
            wallpaper: None,
        };

        let peer = PeerDevice::from(info);
        assert_eq!(peer.name, "Pixel");
        assert_eq!(peer.extra_ports, vec![5555]);
        assert!(peer.wallpaper.is_none());
    }
}
