//! # lanbridge-net
//!
//! LAN plumbing for the lanbridge daemon: IPv4 interface enumeration and
//! selection, `/24` network keys, a periodic watcher that detects when the
//! bound address disappears, the last-paired registry, and the quick-connect
//! wake unicast.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod probe;
pub mod registry;
pub mod wake;

pub use error::NetError;
pub use probe::{
    InterfaceRecord, InterfaceSelection, NetworkEvent, NetworkKey, WatcherConfig, addr_is_private,
    list_interfaces, run_network_watcher, select_address,
};
pub use registry::PairingRegistry;
pub use wake::{WAKE_TOKEN, WakeOutcome, send_wake, wake_if_familiar};
