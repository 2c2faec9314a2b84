//! Session bookkeeping: primary election, activity tracking, staleness.

use lanbridge_net::{NetworkKey, addr_is_private};
use lanbridge_transport::SessionId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::time::Instant;

/// How strongly a handshake's declared target address binds it to this LAN.
///
/// Ordered: a target on the daemon's own /24 outranks a merely private
/// target, which outranks a public or absent one. A handshake supersedes the
/// primary only with a strictly higher rank, so a WAN- or VPN-reachable peer
/// never pre-empts a peer that dialled our LAN address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum TargetRank {
    Public,
    Private,
    LocalNetwork,
}

fn rank_target(target: Option<&str>, local: Option<Ipv4Addr>) -> TargetRank {
    let Some(target) = target else {
        return TargetRank::Public;
    };
    if !addr_is_private(target) {
        return TargetRank::Public;
    }
    match (NetworkKey::parse(target), local) {
        (Ok(key), Some(local)) if key == NetworkKey::of(local) => TargetRank::LocalNetwork,
        _ => TargetRank::Private,
    }
}

#[derive(Debug)]
struct SessionInfo {
    remote: SocketAddr,
    last_activity: Instant,
    primary: bool,
    target_rank: TargetRank,
}

/// Result of a primary-election attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Election {
    /// The session is (now) primary.
    Elected {
        /// Session it pre-empted, which should be closed.
        superseded: Option<SessionId>,
    },
    /// A primary already exists and this handshake does not outrank it.
    Rejected,
}

/// Tracks accepted sessions and enforces the single-primary invariant.
///
/// At most one session holds the primary flag at any instant. Non-primary
/// sessions may only contribute a handshake attempt; the router mutes them
/// for every other kind.
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Mutex<HashMap<SessionId, SessionInfo>>,
}

impl SessionManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an accepted session.
    pub fn connected(&self, session: SessionId, remote: SocketAddr) {
        self.sessions.lock().insert(
            session,
            SessionInfo {
                remote,
                last_activity: Instant::now(),
                primary: false,
                target_rank: TargetRank::Public,
            },
        );
    }

    /// Remove a session. Returns whether it was primary.
    pub fn disconnected(&self, session: SessionId) -> bool {
        self.sessions
            .lock()
            .remove(&session)
            .map(|info| info.primary)
            .unwrap_or(false)
    }

    /// Refresh a session's activity timestamp.
    pub fn touch(&self, session: SessionId) {
        if let Some(info) = self.sessions.lock().get_mut(&session) {
            info.last_activity = Instant::now();
        }
    }

    /// The current primary, if any.
    pub fn primary(&self) -> Option<SessionId> {
        self.sessions
            .lock()
            .iter()
            .find(|(_, info)| info.primary)
            .map(|(id, _)| *id)
    }

    /// Whether `session` is the primary.
    pub fn is_primary(&self, session: SessionId) -> bool {
        self.sessions
            .lock()
            .get(&session)
            .map(|info| info.primary)
            .unwrap_or(false)
    }

    /// Remote address of a session.
    pub fn remote(&self, session: SessionId) -> Option<SocketAddr> {
        self.sessions.lock().get(&session).map(|info| info.remote)
    }

    /// Number of live sessions.
    pub fn count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Run primary election for a completed `device` handshake.
    ///
    /// The first handshake wins. A later handshake supersedes the primary
    /// only when its declared target address outranks the primary's (see
    /// [`TargetRank`]). A re-handshake on the current primary is trivially
    /// re-elected.
    pub fn try_elect(
        &self,
        session: SessionId,
        target_address: Option<&str>,
        local: Option<Ipv4Addr>,
    ) -> Election {
        let mut sessions = self.sessions.lock();
        let new_rank = rank_target(target_address, local);

        let incumbent = sessions
            .iter()
            .find(|(_, info)| info.primary)
            .map(|(id, info)| (*id, info.target_rank));

        match incumbent {
            Some((current, _)) if current == session => {
                // Re-handshake with fresh data.
                if let Some(info) = sessions.get_mut(&session) {
                    info.target_rank = new_rank;
                    info.last_activity = Instant::now();
                }
                Election::Elected { superseded: None }
            }
            Some((current, current_rank)) => {
                if new_rank > current_rank {
                    if let Some(info) = sessions.get_mut(&current) {
                        info.primary = false;
                    }
                    if let Some(info) = sessions.get_mut(&session) {
                        info.primary = true;
                        info.target_rank = new_rank;
                        info.last_activity = Instant::now();
                    }
                    tracing::info!(
                        old = current,
                        new = session,
                        ?new_rank,
                        ?current_rank,
                        "handshake supersedes primary"
                    );
                    Election::Elected {
                        superseded: Some(current),
                    }
                } else {
                    tracing::debug!(session, "handshake ignored, primary already bound");
                    Election::Rejected
                }
            }
            None => {
                if let Some(info) = sessions.get_mut(&session) {
                    info.primary = true;
                    info.target_rank = new_rank;
                    info.last_activity = Instant::now();
                    Election::Elected { superseded: None }
                } else {
                    // Handshake from a session the transport already dropped.
                    Election::Rejected
                }
            }
        }
    }

    /// Sessions whose last activity is older than `stale_after`.
    pub fn stale_sessions(&self, stale_after: Duration) -> Vec<SessionId> {
        let now = Instant::now();
        self.sessions
            .lock()
            .iter()
            .filter(|(_, info)| now.duration_since(info.last_activity) > stale_after)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Drop all bookkeeping (transport restart).
    pub fn clear(&self) {
        self.sessions.lock().clear();
    }
}
