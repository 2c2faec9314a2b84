//! Quick-connect wake unicast.
//!
//! On startup, if the registry remembers a peer on the current /24, the
//! daemon fires a best-effort UDP datagram at it asking it to reinitiate the
//! WebSocket handshake. No retry, no delivery guarantee.

use crate::{NetError, NetworkKey, PairingRegistry};
use lanbridge_proto::PeerDevice;
use std::net::Ipv4Addr;
use tokio::net::UdpSocket;

/// Opaque wake token; the peer only checks that a datagram arrived.
pub const WAKE_TOKEN: &[u8] = b"lanbridge-wake";

/// Result of a wake attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WakeOutcome {
    /// A datagram was sent to the remembered peer.
    Sent {
        /// The peer that was woken.
        peer: PeerDevice,
    },
    /// The remembered peer's address is on a different /24; no wake sent.
    SkippedDifferentNetwork {
        /// Our /24.
        local: NetworkKey,
        /// The remembered peer's /24.
        peer: NetworkKey,
    },
    /// Nothing is remembered for the current network.
    NoEntry,
}

/// Send one wake datagram to `(ip, port)`.
///
/// # Errors
///
/// Returns an error if the socket cannot be created or the send fails;
/// callers treat this as best-effort and only log.
pub async fn send_wake(peer_ip: Ipv4Addr, port: u16) -> Result<(), NetError> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.send_to(WAKE_TOKEN, (peer_ip, port)).await?;
    tracing::info!(peer = %peer_ip, port, "wake datagram sent");
    Ok(())
}

/// Wake the remembered peer for the local address's network, if any.
///
/// The wake fires only when the recorded peer IP shares the local /24;
/// otherwise the peer is presumed elsewhere and the mismatch is logged.
pub async fn wake_if_familiar(local: Ipv4Addr, registry: &PairingRegistry) -> WakeOutcome {
    let local_key = NetworkKey::of(local);

    let Some(peer) = registry.lookup(local_key) else {
        tracing::debug!(network = %local_key, "no remembered peer for this network");
        return WakeOutcome::NoEntry;
    };

    let peer_key = match NetworkKey::parse(&peer.ip_address) {
        Ok(key) => key,
        Err(_) => {
            tracing::warn!(peer = %peer.name, addr = %peer.ip_address, "remembered peer has unparseable address");
            return WakeOutcome::NoEntry;
        }
    };

    if peer_key != local_key {
        tracing::info!(
            local = %local_key,
            peer = %peer_key,
            "remembered peer is on a different /24, skipping wake"
        );
        return WakeOutcome::SkippedDifferentNetwork {
            local: local_key,
            peer: peer_key,
        };
    }

    let peer = peer.clone();
    match peer.ip_address.parse::<Ipv4Addr>() {
        Ok(ip) => {
            if let Err(err) = send_wake(ip, peer.port).await {
                tracing::warn!(peer = %peer.name, %err, "wake send failed");
            }
        }
        Err(_) => {
            tracing::warn!(addr = %peer.ip_address, "wake skipped, bad address");
        }
    }

    WakeOutcome::Sent { peer }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn peer_at(ip: &str) -> PeerDevice {
        PeerDevice {
            name: "Pixel".to_string(),
            ip_address: ip.to_string(),
            port: 8090,
            version: "2.0.0".to_string(),
            wallpaper: None,
            extra_ports: Vec::new(),
        }
    }

    async fn registry_with(local: &str, peer_ip: &str, dir: &TempDir) -> PairingRegistry {
        let mut registry = PairingRegistry::load(dir.path().join("paired.json")).unwrap();
        registry
            .record(NetworkKey::parse(local).unwrap(), peer_at(peer_ip))
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_wake_skipped_on_network_mismatch() {
        // Registry entry for 10.0.0/24 points at a 192.168.1 peer: the peer
        // is presumed elsewhere and no wake is attempted.
        let dir = TempDir::new().unwrap();
        let registry = registry_with("10.0.0.5", "192.168.1.41", &dir).await;

        let outcome = wake_if_familiar("10.0.0.5".parse().unwrap(), &registry).await;
        assert_eq!(
            outcome,
            WakeOutcome::SkippedDifferentNetwork {
                local: NetworkKey::parse("10.0.0.5").unwrap(),
                peer: NetworkKey::parse("192.168.1.41").unwrap(),
            }
        );
    }

    #[tokio::test]
    async fn test_wake_no_entry_for_unknown_network() {
        let dir = TempDir::new().unwrap();
        let registry = PairingRegistry::load(dir.path().join("paired.json")).unwrap();

        let outcome = wake_if_familiar("172.16.0.2".parse().unwrap(), &registry).await;
        assert_eq!(outcome, WakeOutcome::NoEntry);
    }

    #[tokio::test]
    async fn test_wake_sent_on_same_network() {
        // A listener on loopback receives the wake token.
        let listener = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let dir = TempDir::new().unwrap();
        let mut registry = PairingRegistry::load(dir.path().join("paired.json")).unwrap();
        let mut peer = peer_at("127.0.0.1");
        peer.port = port;
        registry
            .record(NetworkKey::parse("127.0.0.1").unwrap(), peer)
            .unwrap();

        let outcome = wake_if_familiar("127.0.0.1".parse().unwrap(), &registry).await;
        assert!(matches!(outcome, WakeOutcome::Sent { .. }));

        let mut buf = [0u8; 64];
        let (len, _) = listener.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], WAKE_TOKEN);
    }
}
