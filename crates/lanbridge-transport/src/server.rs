//! WebSocket server: accept loop, per-session pumps, status surface.

use crate::TransportError;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_util::sync::CancellationToken;

/// Opaque session handle, unique for the lifetime of the process.
pub type SessionId = u64;

/// Operator-visible transport state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// Not listening.
    Stopped,
    /// Bind in progress.
    Starting,
    /// Listening.
    Started {
        /// Bound port.
        port: u16,
        /// Bound address.
        ip: Ipv4Addr,
    },
    /// Bind failed; the daemon idles until the operator changes selection.
    Failed(String),
}

/// Events delivered by the transport, in per-session order.
#[derive(Debug)]
pub enum TransportEvent {
    /// A session completed the WebSocket upgrade.
    Connected {
        /// Session id.
        session: SessionId,
        /// Remote socket address.
        remote: SocketAddr,
    },
    /// A text frame arrived.
    Text {
        /// Session id.
        session: SessionId,
        /// Frame body as received (possibly sealed).
        body: String,
    },
    /// A binary frame arrived. Treated as liveness only.
    Binary {
        /// Session id.
        session: SessionId,
    },
    /// A session went away.
    Disconnected {
        /// Session id.
        session: SessionId,
    },
}

enum Outbound {
    Text(String),
    Close,
}

struct SessionHandle {
    outbound: mpsc::UnboundedSender<Outbound>,
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// The WebSocket server.
///
/// `start` binds and begins accepting; `stop` cancels the accept loop and
/// closes every session. Dropping the server without `stop` aborts the
/// accept task.
pub struct WsServer {
    local_addr: SocketAddr,
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
    cancel: CancellationToken,
    accept_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl WsServer {
    /// Bind `ip:port` and start accepting sessions on `/socket`.
    ///
    /// Pass port `0` to bind an ephemeral port (tests). Returns the server
    /// and the event receiver.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::BindFailed`] when the socket cannot be
    /// bound (port in use, interface gone).
    pub async fn start(
        ip: Ipv4Addr,
        port: u16,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TransportEvent>), TransportError> {
        let addr = SocketAddr::from((ip, port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::BindFailed { addr, source })?;
        let local_addr = listener.local_addr().map_err(|source| {
            TransportError::BindFailed { addr, source }
        })?;

        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let sessions: Arc<DashMap<SessionId, SessionHandle>> = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();

        let accept_task = tokio::spawn(accept_loop(
            listener,
            Arc::clone(&sessions),
            events_tx,
            cancel.clone(),
        ));

        tracing::info!(%local_addr, "transport listening");

        Ok((
            Self {
                local_addr,
                sessions,
                cancel,
                accept_task: parking_lot::Mutex::new(Some(accept_task)),
            },
            events_rx,
        ))
    }

    /// The bound socket address.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Queue a text frame to one session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or its writer has gone.
    pub fn send_text(&self, session: SessionId, body: String) -> Result<(), TransportError> {
        let handle = self
            .sessions
            .get(&session)
            .ok_or(TransportError::UnknownSession(session))?;
        handle
            .outbound
            .send(Outbound::Text(body))
            .map_err(|_| TransportError::SessionClosed(session))
    }

    /// Force-close one session. The disconnect event follows through the
    /// normal path.
    pub fn close_session(&self, session: SessionId) {
        if let Some(handle) = self.sessions.get(&session) {
            let _ = handle.outbound.send(Outbound::Close);
        }
    }

    /// Stop listening and close every session. Idempotent.
    pub async fn stop(&self) {
        self.cancel.cancel();
        for entry in self.sessions.iter() {
            let _ = entry.value().outbound.send(Outbound::Close);
        }
        let task = self.accept_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        tracing::info!("transport stopped");
    }
}

impl Drop for WsServer {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.accept_task.lock().take() {
            task.abort();
        }
    }
}

async fn accept_loop(
    listener: TcpListener,
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, remote)) => {
                        let sessions = Arc::clone(&sessions);
                        let events = events.clone();
                        let cancel = cancel.child_token();
                        tokio::spawn(async move {
                            run_session(stream, remote, sessions, events, cancel).await;
                        });
                    }
                    Err(err) => {
                        tracing::warn!(%err, "accept error");
                    }
                }
            }
        }
    }
}

async fn run_session(
    stream: TcpStream,
    remote: SocketAddr,
    sessions: Arc<DashMap<SessionId, SessionHandle>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    cancel: CancellationToken,
) {
    // Only upgrades on the fixed endpoint path are accepted.
    let path_check = |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        if req.uri().path() == lanbridge_proto::SOCKET_PATH {
            Ok(resp)
        } else {
            tracing::debug!(path = %req.uri().path(), "rejecting upgrade on wrong path");
            let mut reject = ErrorResponse::new(Some("not found".to_string()));
            *reject.status_mut() = StatusCode::NOT_FOUND;
            Err(reject)
        }
    };

    let mut ws = match accept_hdr_async(stream, path_check).await {
        Ok(ws) => ws,
        Err(err) => {
            tracing::debug!(%remote, %err, "websocket upgrade failed");
            return;
        }
    };

    let session = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    sessions.insert(
        session,
        SessionHandle {
            outbound: outbound_tx,
        },
    );

    tracing::info!(session, %remote, "session connected");
    if events
        .send(TransportEvent::Connected { session, remote })
        .is_err()
    {
        sessions.remove(&session);
        return;
    }

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws.close(None).await;
                break;
            }
            queued = outbound_rx.recv() => {
                match queued {
                    Some(Outbound::Text(body)) => {
                        if let Err(err) = ws.send(WsMessage::Text(body)).await {
                            tracing::debug!(session, %err, "send failed");
                            break;
                        }
                    }
                    Some(Outbound::Close) | None => {
                        let _ = ws.close(None).await;
                        break;
                    }
                }
            }
            inbound = ws.next() => {
                match inbound {
                    Some(Ok(WsMessage::Text(body))) => {
                        if events.send(TransportEvent::Text { session, body }).is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Binary(_))) => {
                        // Liveness ping only; content ignored.
                        if events.send(TransportEvent::Binary { session }).is_err() {
                            break;
                        }
                    }
                    Some(Ok(WsMessage::Ping(_) | WsMessage::Pong(_))) => {
                        // tungstenite answers pings internally.
                    }
                    Some(Ok(WsMessage::Close(_))) | None => break,
                    Some(Ok(WsMessage::Frame(_))) => {}
                    Some(Err(err)) => {
                        tracing::debug!(session, %err, "read error");
                        break;
                    }
                }
            }
        }
    }

    sessions.remove(&session);
    tracing::info!(session, "session disconnected");
    let _ = events.send(TransportEvent::Disconnected { session });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    async fn start_server() -> (WsServer, mpsc::UnboundedReceiver<TransportEvent>) {
        WsServer::start(Ipv4Addr::LOCALHOST, 0).await.unwrap()
    }

    fn socket_url(server: &WsServer) -> String {
        format!(
            "ws://{}{}",
            server.local_addr(),
            lanbridge_proto::SOCKET_PATH
        )
    }

    #[tokio::test]
    async fn test_accept_and_echo_events() {
        let (server, mut events) = start_server().await;

        let (mut client, _) = connect_async(socket_url(&server)).await.unwrap();

        let connected = events.recv().await.unwrap();
        let session = match connected {
            TransportEvent::Connected { session, .. } => session,
            other => panic!("expected Connected, got {other:?}"),
        };

        client
            .send(WsMessage::Text("hello".to_string()))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            TransportEvent::Text { session: s, body } => {
                assert_eq!(s, session);
                assert_eq!(body, "hello");
            }
            other => panic!("expected Text, got {other:?}"),
        }

        server.send_text(session, "world".to_string()).unwrap();
        match client.next().await.unwrap().unwrap() {
            WsMessage::Text(body) => assert_eq!(body, "world"),
            other => panic!("expected text, got {other:?}"),
        }

        server.stop().await;
    }

    #[tokio::test]
    async fn test_wrong_path_rejected() {
        let (server, mut events) = start_server().await;

        let url = format!("ws://{}/other", server.local_addr());
        assert!(connect_async(url).await.is_err());

        // No session event should have been produced.
        assert!(events.try_recv().is_err());
        server.stop().await;
    }

    #[tokio::test]
    async fn test_close_session_emits_disconnect() {
        let (server, mut events) = start_server().await;
        let (_client, _) = connect_async(socket_url(&server)).await.unwrap();

        let session = match events.recv().await.unwrap() {
            TransportEvent::Connected { session, .. } => session,
            other => panic!("expected Connected, got {other:?}"),
        };
        assert_eq!(server.session_count(), 1);

        server.close_session(session);
        match events.recv().await.unwrap() {
            TransportEvent::Disconnected { session: s } => assert_eq!(s, session),
            other => panic!("expected Disconnected, got {other:?}"),
        }
        assert_eq!(server.session_count(), 0);

        server.stop().await;
    }

    #[tokio::test]
    async fn test_send_to_unknown_session_fails() {
        let (server, _events) = start_server().await;
        assert!(matches!(
            server.send_text(9999, "x".to_string()),
            Err(TransportError::UnknownSession(9999))
        ));
        server.stop().await;
    }

    #[tokio::test]
    async fn test_binary_frame_is_liveness_event() {
        let (server, mut events) = start_server().await;
        let (mut client, _) = connect_async(socket_url(&server)).await.unwrap();

        let session = match events.recv().await.unwrap() {
            TransportEvent::Connected { session, .. } => session,
            other => panic!("expected Connected, got {other:?}"),
        };

        client
            .send(WsMessage::Binary(vec![1, 2, 3]))
            .await
            .unwrap();

        match events.recv().await.unwrap() {
            TransportEvent::Binary { session: s } => assert_eq!(s, session),
            other => panic!("expected Binary, got {other:?}"),
        }

        server.stop().await;
    }
}
