//! # lanbridge-transport
//!
//! WebSocket transport for the lanbridge daemon.
//!
//! Binds one listening socket on the selected interface and serves the
//! `/socket` endpoint. Each accepted upgrade becomes a session with an
//! opaque id; inbound text and binary frames are delivered in order on a
//! single event channel, outbound text is written through a per-session
//! queue. The transport orders frames within a session only; it never
//! orders across sessions.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod server;

pub use server::{SessionId, TransportEvent, TransportStatus, WsServer};

use thiserror::Error;

/// Transport-layer errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    BindFailed {
        /// Address that was requested.
        addr: std::net::SocketAddr,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Send addressed to a session that no longer exists.
    #[error("unknown session {0}")]
    UnknownSession(u64),

    /// Session exists but its writer has shut down.
    #[error("session {0} is closed")]
    SessionClosed(u64),
}
