//! Shared helpers for lanbridge integration tests.

use futures_util::{SinkExt, StreamExt};
use lanbridge_core::{Collaborators, Daemon, DaemonConfig, DaemonHandle, TimerConfig, UiEvent};
use lanbridge_crypto::MessageBox;
use lanbridge_net::InterfaceSelection;
use lanbridge_proto::{DeviceInfo, Message, SOCKET_PATH};
use lanbridge_transport::TransportStatus;
use std::net::Ipv4Addr;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

/// Well-known key used by encrypted test runs.
pub const TEST_KEY: [u8; 32] = [0x5A; 32];

/// A daemon plus the scratch directories backing it.
pub struct TestEnv {
    /// The running daemon.
    pub daemon: Daemon,
    /// Operator handle.
    pub handle: DaemonHandle,
    /// Bound port on loopback.
    pub port: u16,
    /// The key, when the wire is encrypted.
    pub key: Option<[u8; 32]>,
    /// Downloads directory.
    pub downloads: TempDir,
    /// Data directory (key, registry, icon cache).
    pub data: TempDir,
}

/// Timers for tests that exercise staleness: fast heartbeat, slow probe.
pub fn fast_timers() -> TimerConfig {
    TimerConfig {
        heartbeat: Duration::from_millis(100),
        stale_after: Duration::from_millis(400),
        probe_interval: Duration::from_secs(120),
        restart_debounce: Duration::from_secs(5),
    }
}

/// Timers that keep every periodic job out of the test's way.
pub fn quiet_timers() -> TimerConfig {
    TimerConfig {
        heartbeat: Duration::from_secs(60),
        stale_after: Duration::from_secs(300),
        probe_interval: Duration::from_secs(120),
        restart_debounce: Duration::from_secs(5),
    }
}

/// Start a daemon on an ephemeral loopback port.
pub async fn spawn_daemon(encrypted: bool, timers: TimerConfig) -> TestEnv {
    let data = TempDir::new().unwrap();
    let downloads = TempDir::new().unwrap();

    let mut config =
        DaemonConfig::with_dirs(data.path().to_path_buf(), downloads.path().to_path_buf());
    config.port = 0;
    config.interface = InterfaceSelection::Address(Ipv4Addr::LOCALHOST);
    config.timers = timers;
    config.device_name = "test-desktop".to_string();

    let key = if encrypted {
        let key_path = data.path().join("pairing.key");
        std::fs::write(&key_path, TEST_KEY).unwrap();
        config.key_file = Some(key_path);
        Some(TEST_KEY)
    } else {
        config.key_file = None;
        None
    };

    let daemon = Daemon::start(config, Collaborators::default())
        .await
        .unwrap();

    // Wait for the bind to land and learn the ephemeral port.
    let mut status = daemon.status_watch();
    let port = loop {
        match status.borrow().clone() {
            TransportStatus::Started { port, .. } => break port,
            TransportStatus::Failed(reason) => panic!("transport failed: {reason}"),
            _ => {}
        }
        status.changed().await.unwrap();
    };

    let handle = daemon.handle();
    TestEnv {
        daemon,
        handle,
        port,
        key,
        downloads,
        data,
    }
}

/// Wait for the next `Transport(Started)` on an event stream (post-restart)
/// and return the new port. Broadcast order makes this deterministic as long
/// as the receiver was subscribed before the restart trigger.
pub async fn wait_restarted(events: &mut broadcast::Receiver<UiEvent>) -> u16 {
    let event = wait_event(events, Duration::from_secs(5), |e| {
        matches!(e, UiEvent::Transport(TransportStatus::Started { .. }))
    })
    .await;
    match event {
        UiEvent::Transport(TransportStatus::Started { port, .. }) => port,
        other => panic!("expected Started, got {other:?}"),
    }
}

/// A WebSocket peer speaking the wire protocol, sealed or clear.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    mbox: Option<MessageBox>,
}

impl TestClient {
    /// Connect to the daemon's `/socket` endpoint.
    pub async fn connect(env: &TestEnv) -> Self {
        let url = format!("ws://127.0.0.1:{}{}", env.port, SOCKET_PATH);
        let (ws, _) = connect_async(url).await.expect("connect failed");
        Self {
            ws,
            mbox: env.key.map(|key| MessageBox::new(&key)),
        }
    }

    /// Send one typed message, sealing it when a key is configured.
    pub async fn send_msg(&mut self, message: &Message) {
        let body = message.encode().unwrap();
        let body = match &self.mbox {
            Some(mbox) => mbox.seal(&body).unwrap(),
            None => body,
        };
        self.ws.send(WsMessage::Text(body)).await.expect("send failed");
    }

    /// Send a raw text frame (malformed-input tests).
    pub async fn send_raw(&mut self, body: &str) {
        self.ws
            .send(WsMessage::Text(body.to_string()))
            .await
            .expect("send failed");
    }

    /// Receive the next typed message, skipping frames that fail to decode.
    pub async fn recv_msg(&mut self) -> Option<Message> {
        loop {
            match self.ws.next().await? {
                Ok(WsMessage::Text(body)) => {
                    let plain = match &self.mbox {
                        Some(mbox) => match mbox.open(&body) {
                            Ok(plain) => plain,
                            Err(_) => continue,
                        },
                        None => body,
                    };
                    match Message::decode(&plain) {
                        Ok(message) => return Some(message),
                        Err(_) => continue,
                    }
                }
                Ok(WsMessage::Close(_)) => return None,
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Receive until `pred` matches, with a timeout. Pings and unrelated
    /// frames are skipped.
    pub async fn recv_until<F>(&mut self, timeout: Duration, mut pred: F) -> Message
    where
        F: FnMut(&Message) -> bool,
    {
        tokio::time::timeout(timeout, async {
            loop {
                match self.recv_msg().await {
                    Some(message) if pred(&message) => break message,
                    Some(_) => continue,
                    None => panic!("connection closed while waiting for frame"),
                }
            }
        })
        .await
        .expect("timed out waiting for frame")
    }

    /// Wait until the server closes the connection.
    pub async fn wait_closed(&mut self, timeout: Duration) {
        tokio::time::timeout(timeout, async {
            while self.recv_msg().await.is_some() {}
        })
        .await
        .expect("connection was not closed in time");
    }
}

/// A `device` handshake message.
pub fn device_msg(name: &str, target: Option<&str>) -> Message {
    Message::Device(DeviceInfo {
        name: name.to_string(),
        ip_address: "127.0.0.1".to_string(),
        port: 8090,
        version: "2.0.0".to_string(),
        target_ip_address: target.map(str::to_string),
        adb_ports: None,
        wallpaper: None,
    })
}

/// Wait for a UI event matching `pred`.
pub async fn wait_event<F>(
    events: &mut broadcast::Receiver<UiEvent>,
    timeout: Duration,
    mut pred: F,
) -> UiEvent
where
    F: FnMut(&UiEvent) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => break event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("event stream closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}

/// Assert that no event matching `pred` arrives within `window`.
pub async fn assert_no_event<F>(
    events: &mut broadcast::Receiver<UiEvent>,
    window: Duration,
    mut pred: F,
) where
    F: FnMut(&UiEvent) -> bool,
{
    let outcome = tokio::time::timeout(window, async {
        loop {
            match events.recv().await {
                Ok(event) if pred(&event) => break event,
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    std::future::pending::<UiEvent>().await;
                }
            }
        }
    })
    .await;

    if let Ok(event) = outcome {
        panic!("unexpected event: {event:?}");
    }
}
