//! IPv4 interface enumeration, selection policy, and the change watcher.

use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tokio_util::sync::CancellationToken;

/// One usable local interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceRecord {
    /// OS interface name (e.g. `en0`).
    pub name: String,
    /// The interface's IPv4 address.
    pub addr: Ipv4Addr,
}

/// Operator's interface preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InterfaceSelection {
    /// Bind the named interface's address.
    Named(String),
    /// Bind a literal address, whether or not enumeration lists it.
    Address(Ipv4Addr),
    /// Bind the first enumerated address.
    Auto,
}

impl InterfaceSelection {
    /// Parse the config spelling: `"auto"`, a literal IPv4 address, or an
    /// interface name.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("auto") {
            Self::Auto
        } else if let Ok(addr) = value.parse::<Ipv4Addr>() {
            Self::Address(addr)
        } else {
            Self::Named(value.to_string())
        }
    }
}

/// The first three octets of an IPv4 address.
///
/// Two hosts share a network key iff they are on the same /24.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NetworkKey([u8; 3]);

impl NetworkKey {
    /// Derive the key from an address.
    pub fn of(addr: Ipv4Addr) -> Self {
        let octets = addr.octets();
        Self([octets[0], octets[1], octets[2]])
    }

    /// Derive the key from an address string.
    ///
    /// # Errors
    ///
    /// Returns the offending string if it is not a valid IPv4 address.
    pub fn parse(addr: &str) -> Result<Self, crate::NetError> {
        addr.parse::<Ipv4Addr>()
            .map(Self::of)
            .map_err(|_| crate::NetError::BadAddress(addr.to_string()))
    }
}

impl fmt::Display for NetworkKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0[0], self.0[1], self.0[2])
    }
}

/// Enumerate IPv4-reachable, non-loopback interfaces in OS order.
pub fn list_interfaces() -> Vec<InterfaceRecord> {
    let Ok(interfaces) = get_if_addrs::get_if_addrs() else {
        return Vec::new();
    };

    interfaces
        .into_iter()
        .filter(|iface| !iface.is_loopback())
        .filter_map(|iface| match iface.ip() {
            std::net::IpAddr::V4(addr) => Some(InterfaceRecord {
                name: iface.name,
                addr,
            }),
            std::net::IpAddr::V6(_) => None,
        })
        .collect()
}

/// Resolve the operator's selection against an interface list.
///
/// `Named` picks that interface's address; `Auto` picks the first address
/// in OS order. Returns `None` when nothing matches.
pub fn select_address(
    selection: &InterfaceSelection,
    interfaces: &[InterfaceRecord],
) -> Option<Ipv4Addr> {
    match selection {
        InterfaceSelection::Named(name) => interfaces
            .iter()
            .find(|iface| &iface.name == name)
            .map(|iface| iface.addr),
        InterfaceSelection::Address(addr) => Some(*addr),
        InterfaceSelection::Auto => interfaces.first().map(|iface| iface.addr),
    }
}

/// Whether an address string is an RFC1918 private IPv4 address.
///
/// Private addresses are preferred when resolving handshake ambiguity.
pub fn addr_is_private(addr: &str) -> bool {
    addr.parse::<Ipv4Addr>()
        .map(|ip| ip.is_private())
        .unwrap_or(false)
}

/// Events emitted by the network watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The bound address disappeared from the interface set; the transport
    /// should restart and any presented pairing code is stale.
    AddressLost {
        /// The address that was bound.
        bound: Ipv4Addr,
    },
}

/// Timing knobs for the watcher. Defaults match the protocol constants.
#[derive(Debug, Clone, Copy)]
pub struct WatcherConfig {
    /// Cadence of the interface scan.
    pub probe_interval: Duration,
    /// Delay between noticing a loss and reporting it, to ride out flaps.
    pub debounce: Duration,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(10),
            debounce: Duration::from_secs(5),
        }
    }
}

/// Watch for the bound address disappearing.
///
/// Scans on `config.probe_interval`. When a scan no longer contains
/// `bound`, waits `config.debounce`, re-checks, and only then emits
/// [`NetworkEvent::AddressLost`] and returns. The enumerator is injected so
/// tests can drive synthetic interface sets.
pub async fn run_network_watcher<F>(
    bound: Ipv4Addr,
    enumerate: F,
    config: WatcherConfig,
    events: mpsc::Sender<NetworkEvent>,
    cancel: CancellationToken,
) where
    F: Fn() -> Vec<InterfaceRecord> + Send,
{
    let mut tick = interval(config.probe_interval);
    // The first tick of a tokio interval fires immediately; consume it so
    // the first real scan happens one full interval after start.
    tick.tick().await;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tick.tick() => {
                let present = enumerate().iter().any(|iface| iface.addr == bound);
                if present {
                    continue;
                }

                tracing::debug!(%bound, "bound address missing, debouncing");
                tokio::select! {
                    _ = cancel.cancelled() => return,
                    _ = tokio::time::sleep(config.debounce) => {}
                }

                if enumerate().iter().any(|iface| iface.addr == bound) {
                    tracing::debug!(%bound, "bound address came back during debounce");
                    continue;
                }

                tracing::info!(%bound, "bound address lost, requesting transport restart");
                let _ = events.send(NetworkEvent::AddressLost { bound }).await;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iface(name: &str, addr: [u8; 4]) -> InterfaceRecord {
        InterfaceRecord {
            name: name.to_string(),
            addr: Ipv4Addr::from(addr),
        }
    }

    #[test]
    fn test_network_key_same_slash24() {
        let a = NetworkKey::of("192.168.1.41".parse().unwrap());
        let b = NetworkKey::of("192.168.1.254".parse().unwrap());
        let c = NetworkKey::of("192.168.2.41".parse().unwrap());

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.to_string(), "192.168.1");
    }

    #[test]
    fn test_network_key_parse_rejects_garbage() {
        assert!(NetworkKey::parse("not-an-ip").is_err());
        assert!(NetworkKey::parse("10.0.0.5").is_ok());
    }

    #[test]
    fn test_private_ranges() {
        assert!(addr_is_private("10.8.0.2"));
        assert!(addr_is_private("172.16.4.1"));
        assert!(addr_is_private("192.168.1.34"));
        assert!(!addr_is_private("8.8.8.8"));
        assert!(!addr_is_private("172.32.0.1"));
        assert!(!addr_is_private("bogus"));
    }

    #[test]
    fn test_select_named_interface() {
        let interfaces = vec![iface("en0", [192, 168, 1, 10]), iface("en5", [10, 0, 0, 7])];

        let named = InterfaceSelection::Named("en5".into());
        assert_eq!(
            select_address(&named, &interfaces),
            Some(Ipv4Addr::new(10, 0, 0, 7))
        );

        let missing = InterfaceSelection::Named("utun3".into());
        assert_eq!(select_address(&missing, &interfaces), None);
    }

    #[test]
    fn test_select_auto_takes_first() {
        let interfaces = vec![iface("en0", [192, 168, 1, 10]), iface("en5", [10, 0, 0, 7])];
        assert_eq!(
            select_address(&InterfaceSelection::Auto, &interfaces),
            Some(Ipv4Addr::new(192, 168, 1, 10))
        );
        assert_eq!(select_address(&InterfaceSelection::Auto, &[]), None);
    }

    #[test]
    fn test_selection_parse() {
        assert_eq!(InterfaceSelection::parse("AUTO"), InterfaceSelection::Auto);
        assert_eq!(
            InterfaceSelection::parse("en0"),
            InterfaceSelection::Named("en0".into())
        );
        assert_eq!(
            InterfaceSelection::parse("192.168.1.5"),
            InterfaceSelection::Address(Ipv4Addr::new(192, 168, 1, 5))
        );
    }

    #[test]
    fn test_select_literal_address() {
        let selection = InterfaceSelection::Address(Ipv4Addr::LOCALHOST);
        assert_eq!(select_address(&selection, &[]), Some(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_emits_after_debounce() {
        let bound = Ipv4Addr::new(192, 168, 1, 10);
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let handle = tokio::spawn(run_network_watcher(
            bound,
            Vec::new, // address never present
            WatcherConfig::default(),
            tx,
            cancel,
        ));

        let event = rx.recv().await.unwrap();
        assert_eq!(event, NetworkEvent::AddressLost { bound });
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_quiet_while_address_present() {
        let bound = Ipv4Addr::new(192, 168, 1, 10);
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        let interfaces = vec![iface("en0", [192, 168, 1, 10])];
        let handle = tokio::spawn(run_network_watcher(
            bound,
            move || interfaces.clone(),
            WatcherConfig::default(),
            tx,
            cancel.clone(),
        ));

        // Several probe cycles pass without an event.
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        handle.await.unwrap();
    }
}
