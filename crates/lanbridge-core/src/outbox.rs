//! The router's codec half: seal-and-send outbound, open-and-decode inbound.

use crate::CoreError;
use lanbridge_crypto::MessageBox;
use lanbridge_files::{ChunkSink, TransferError};
use lanbridge_proto::Message;
use lanbridge_transport::{SessionId, WsServer};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::session::SessionManager;

/// Shared frame path used by the coordinator, the file queue, and outbound
/// transfer tasks.
///
/// Outgoing: encode the envelope, seal it when a key is configured, write to
/// the primary session. A send with no primary session is a no-op. Incoming:
/// open (when sealed) and decode; failures are counted and surface as
/// errors the router logs and drops.
pub struct Outbox {
    transport: RwLock<Option<Arc<WsServer>>>,
    mbox: Option<MessageBox>,
    sessions: Arc<SessionManager>,
    decode_failures: AtomicU64,
}

impl Outbox {
    /// Create an outbox. `mbox` of `None` runs the wire in the clear.
    pub fn new(mbox: Option<MessageBox>, sessions: Arc<SessionManager>) -> Self {
        Self {
            transport: RwLock::new(None),
            mbox,
            sessions,
            decode_failures: AtomicU64::new(0),
        }
    }

    /// Install the live transport after a (re)start.
    pub fn set_transport(&self, server: Arc<WsServer>) {
        *self.transport.write() = Some(server);
    }

    /// Drop the transport (stop/restart).
    pub fn clear_transport(&self) {
        *self.transport.write() = None;
    }

    /// Whether frames are sealed.
    pub fn encrypted(&self) -> bool {
        self.mbox.is_some()
    }

    /// Frames dropped at the decode boundary so far.
    pub fn decode_failures(&self) -> u64 {
        self.decode_failures.load(Ordering::Relaxed)
    }

    /// Send to the primary session. Returns `false` (a no-op) when there is
    /// no primary or no transport.
    pub fn send(&self, message: &Message) -> bool {
        match self.sessions.primary() {
            Some(primary) => self.send_to(primary, message),
            None => {
                tracing::debug!(kind = message.kind(), "send with no primary session, dropped");
                false
            }
        }
    }

    /// Send to a specific session (handshake replies).
    pub fn send_to(&self, session: SessionId, message: &Message) -> bool {
        let body = match self.encode_body(message) {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!(kind = message.kind(), %err, "frame encode failed");
                return false;
            }
        };

        let transport = self.transport.read();
        let Some(server) = transport.as_ref() else {
            tracing::debug!(kind = message.kind(), "send with no transport, dropped");
            return false;
        };

        match server.send_text(session, body) {
            Ok(()) => true,
            Err(err) => {
                tracing::debug!(kind = message.kind(), session, %err, "send failed");
                false
            }
        }
    }

    /// Decode one inbound frame body into a typed message.
    ///
    /// # Errors
    ///
    /// Returns an error for bad base64, a failed open, non-JSON, or an
    /// unknown kind. The counter advances; the caller logs and drops.
    pub fn decode_frame(&self, body: &str) -> Result<Message, CoreError> {
        let result = match &self.mbox {
            Some(mbox) => mbox
                .open(body)
                .map_err(CoreError::from)
                .and_then(|plain| Message::decode(&plain).map_err(CoreError::from)),
            None => Message::decode(body).map_err(CoreError::from),
        };

        if result.is_err() {
            self.decode_failures.fetch_add(1, Ordering::Relaxed);
        }
        result
    }

    fn encode_body(&self, message: &Message) -> Result<String, CoreError> {
        let plain = message.encode()?;
        match &self.mbox {
            Some(mbox) => Ok(mbox.seal(&plain)?),
            None => Ok(plain),
        }
    }
}

#[async_trait::async_trait]
impl ChunkSink for Outbox {
    async fn send(&self, message: Message) -> Result<(), TransferError> {
        if Outbox::send(self, &message) {
            Ok(())
        } else {
            Err(TransferError::SinkClosed("no primary session".to_string()))
        }
    }
}
