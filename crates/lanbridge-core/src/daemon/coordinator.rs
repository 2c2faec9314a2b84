//! The coordination task: owns shared state, runs election, heartbeat,
//! routing, and every non-file protocol handler.

use crate::apps::AppInventory;
use crate::collab::Collaborators;
use crate::config::DaemonConfig;
use crate::daemon::DaemonCommand;
use crate::events::UiEvent;
use crate::filequeue::FileCommand;
use crate::outbox::Outbox;
use crate::session::{Election, SessionManager};
use crate::state::SharedState;
use dashmap::DashMap;
use lanbridge_files::{ChunkSink, OutboundHandle, OutboundOutcome, OutboundTransfer};
use lanbridge_net::{
    InterfaceSelection, NetworkEvent, NetworkKey, PairingRegistry, WatcherConfig,
    list_interfaces, run_network_watcher, select_address, wake_if_familiar,
};
use lanbridge_proto::{
    DeviceInfo, MacInfo, MacMediaControl, MacMediaControlResponse, Message, PeerDevice,
    TransferId, PROTOCOL_VERSION,
};
use lanbridge_transport::{SessionId, TransportEvent, TransportStatus, WsServer};
use std::net::Ipv4Addr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::interval;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub(crate) struct Coordinator {
    config: DaemonConfig,
    state: SharedState,
    sessions: Arc<SessionManager>,
    outbox: Arc<Outbox>,
    events: broadcast::Sender<UiEvent>,
    status: watch::Sender<TransportStatus>,
    collab: Collaborators,
    file_tx: mpsc::UnboundedSender<FileCommand>,
    outbound: Arc<DashMap<TransferId, OutboundHandle>>,
    apps: AppInventory,
    registry: PairingRegistry,
    commands: mpsc::UnboundedReceiver<DaemonCommand>,
    cancel: CancellationToken,

    server: Option<Arc<WsServer>>,
    server_events: Option<mpsc::UnboundedReceiver<TransportEvent>>,
    bound_ip: Option<Ipv4Addr>,
    net_events: Option<mpsc::Receiver<NetworkEvent>>,
    net_cancel: Option<CancellationToken>,
}

async fn next_transport(
    rx: &mut Option<mpsc::UnboundedReceiver<TransportEvent>>,
) -> Option<TransportEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn next_network(rx: &mut Option<mpsc::Receiver<NetworkEvent>>) -> Option<NetworkEvent> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

impl Coordinator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        config: DaemonConfig,
        sessions: Arc<SessionManager>,
        outbox: Arc<Outbox>,
        events: broadcast::Sender<UiEvent>,
        status: watch::Sender<TransportStatus>,
        collab: Collaborators,
        file_tx: mpsc::UnboundedSender<FileCommand>,
        outbound: Arc<DashMap<TransferId, OutboundHandle>>,
        apps: AppInventory,
        registry: PairingRegistry,
        commands: mpsc::UnboundedReceiver<DaemonCommand>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            state: SharedState::default(),
            sessions,
            outbox,
            events,
            status,
            collab,
            file_tx,
            outbound,
            apps,
            registry,
            commands,
            cancel,
            server: None,
            server_events: None,
            bound_ip: None,
            net_events: None,
            net_cancel: None,
        }
    }

    pub(crate) async fn run(mut self) {
        self.start_transport(true).await;

        let mut heartbeat = interval(self.config.timers.heartbeat);
        // Staleness has to be detected well inside one extra second past the
        // threshold, so it gets its own faster cadence.
        let stale_check = (self.config.timers.stale_after / 20)
            .max(std::time::Duration::from_millis(10));
        let mut staleness = interval(stale_check);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    self.shutdown().await;
                    return;
                }
                command = self.commands.recv() => {
                    match command {
                        Some(command) => self.on_command(command).await,
                        None => {
                            self.shutdown().await;
                            return;
                        }
                    }
                }
                _ = heartbeat.tick() => self.on_heartbeat(),
                _ = staleness.tick() => self.on_stale_check().await,
                event = next_transport(&mut self.server_events) => {
                    match event {
                        Some(event) => self.on_transport_event(event).await,
                        None => self.server_events = None,
                    }
                }
                event = next_network(&mut self.net_events) => {
                    match event {
                        Some(NetworkEvent::AddressLost { bound }) => {
                            tracing::info!(%bound, "interface change, restarting transport");
                            self.emit(UiEvent::PairingCodeStale);
                            self.restart_transport().await;
                        }
                        None => self.net_events = None,
                    }
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Transport lifecycle
    // ------------------------------------------------------------------

    async fn start_transport(&mut self, initial: bool) {
        self.set_status(TransportStatus::Starting);

        let interfaces = list_interfaces();
        let Some(ip) = select_address(&self.config.interface, &interfaces) else {
            tracing::error!(selection = ?self.config.interface, "no usable interface");
            self.set_status(TransportStatus::Failed(
                "no usable network interface".to_string(),
            ));
            return;
        };

        match WsServer::start(ip, self.config.port).await {
            Ok((server, events)) => {
                let server = Arc::new(server);
                let port = server.local_addr().port();
                self.outbox.set_transport(Arc::clone(&server));
                self.server = Some(server);
                self.server_events = Some(events);
                self.bound_ip = Some(ip);
                self.set_status(TransportStatus::Started { port, ip });

                // A pinned literal address is the operator's explicit choice
                // and may never show up in enumeration (loopback); only
                // watch addresses that came from enumeration.
                if !matches!(self.config.interface, InterfaceSelection::Address(_)) {
                    self.spawn_network_watcher(ip);
                }

                if initial {
                    let outcome = wake_if_familiar(ip, &self.registry).await;
                    tracing::debug!(?outcome, "quick-connect wake evaluated");
                }
            }
            Err(err) => {
                tracing::error!(%err, "transport bind failed");
                self.set_status(TransportStatus::Failed(err.to_string()));
            }
        }
    }

    fn spawn_network_watcher(&mut self, bound: Ipv4Addr) {
        if let Some(cancel) = self.net_cancel.take() {
            cancel.cancel();
        }

        let (tx, rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        tokio::spawn(run_network_watcher(
            bound,
            list_interfaces,
            WatcherConfig {
                probe_interval: self.config.timers.probe_interval,
                debounce: self.config.timers.restart_debounce,
            },
            tx,
            cancel.clone(),
        ));
        self.net_events = Some(rx);
        self.net_cancel = Some(cancel);
    }

    async fn stop_transport(&mut self) {
        if let Some(cancel) = self.net_cancel.take() {
            cancel.cancel();
        }
        self.net_events = None;

        self.outbox.clear_transport();
        if let Some(server) = self.server.take() {
            server.stop().await;
        }
        self.server_events = None;
        self.bound_ip = None;

        self.sessions.clear();
        if self.state.peer.is_some() {
            self.state.clear_peer();
            self.emit(UiEvent::PeerUnpaired);
        }
        self.set_status(TransportStatus::Stopped);
    }

    async fn restart_transport(&mut self) {
        self.stop_transport().await;
        self.start_transport(false).await;
    }

    async fn shutdown(&mut self) {
        for entry in self.outbound.iter() {
            entry.value().cancel();
        }
        self.stop_transport().await;
    }

    // ------------------------------------------------------------------
    // Timers
    // ------------------------------------------------------------------

    fn on_heartbeat(&mut self) {
        if self.sessions.primary().is_some() {
            self.outbox.send(&Message::Ping {});
        }
    }

    async fn on_stale_check(&mut self) {
        let stale = self.sessions.stale_sessions(self.config.timers.stale_after);
        if stale.is_empty() {
            return;
        }

        let primary = self.sessions.primary();
        let primary_stale = primary.map(|p| stale.contains(&p)).unwrap_or(false);

        if primary_stale {
            tracing::warn!(session = ?primary, "primary session stale, restarting transport");
            self.restart_transport().await;
        } else {
            for session in stale {
                tracing::info!(session, "closing stale session");
                if let Some(server) = &self.server {
                    server.close_session(session);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Transport events and routing
    // ------------------------------------------------------------------

    async fn on_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected { session, remote } => {
                self.sessions.connected(session, remote);
                if self.sessions.count() == 1 {
                    self.emit(UiEvent::MonitorsEnabled);
                }
            }
            TransportEvent::Text { session, body } => {
                self.sessions.touch(session);
                match self.outbox.decode_frame(&body) {
                    Ok(message) => self.route(session, message).await,
                    Err(err) => {
                        tracing::debug!(session, %err, "frame dropped at decode boundary");
                    }
                }
            }
            TransportEvent::Binary { session } => {
                // Binary frames count as liveness only.
                self.sessions.touch(session);
            }
            TransportEvent::Disconnected { session } => {
                let was_primary = self.sessions.disconnected(session);
                if self.sessions.count() == 0 {
                    self.emit(UiEvent::MonitorsDisabled);
                }
                if was_primary {
                    tracing::info!(session, "primary session disconnected");
                    self.restart_transport().await;
                }
            }
        }
    }

    async fn route(&mut self, session: SessionId, message: Message) {
        // The encrypted pong is consumed here; the touch already happened.
        if matches!(message, Message::Pong {}) {
            return;
        }

        // Every kind except the handshake is accepted only from the primary.
        if !matches!(message, Message::Device(_)) && !self.sessions.is_primary(session) {
            tracing::debug!(session, kind = message.kind(), "frame from non-primary, dropped");
            return;
        }

        if message.is_file_frame() {
            let _ = self.file_tx.send(FileCommand::Frame(message));
            return;
        }

        self.handle_message(session, message);
    }

    fn handle_message(&mut self, session: SessionId, message: Message) {
        match message {
            Message::Device(info) => self.handle_device(session, info),

            Message::Status(status) => {
                self.state.status = Some(status.clone());
                self.emit(UiEvent::PeerStatus(status));
            }

            Message::Notification(notification) => {
                self.collab
                    .notifier
                    .post(&notification.title, &notification.body);
                self.state
                    .notifications
                    .insert(notification.id.clone(), notification.clone());
                self.emit(UiEvent::NotificationPosted(notification));
            }

            Message::NotificationUpdate(update) => {
                if update.is_dismissal() {
                    self.state.notifications.remove(&update.id);
                    self.collab.notifier.dismiss(&update.id);
                    self.emit(UiEvent::NotificationDismissed { id: update.id });
                }
            }

            Message::NotificationActionResponse(response) => {
                self.emit(UiEvent::NotificationActionResult(response));
            }

            Message::DismissalResponse(response) => {
                self.state.notifications.remove(&response.id);
                self.emit(UiEvent::DismissalResult(response));
            }

            Message::MediaControlResponse(response) => {
                tracing::debug!(
                    action = ?response.action,
                    success = response.success,
                    "peer media verdict"
                );
            }

            Message::MacMediaControl(MacMediaControl { action }) => {
                let success = self.collab.media.apply(action);
                self.outbox
                    .send(&Message::MacMediaControlResponse(MacMediaControlResponse {
                        action,
                        success,
                    }));
            }

            Message::AppIcons(icons) => {
                if let Err(err) = self.apps.reconcile(&icons) {
                    tracing::warn!(%err, "app inventory reconcile failed");
                }
                self.emit(UiEvent::AppsUpdated {
                    packages: self.apps.len(),
                });
            }

            Message::ClipboardUpdate(update) => {
                self.collab.pasteboard.set_text(&update.text);
                self.emit(UiEvent::ClipboardReceived { text: update.text });
            }

            Message::RemoteControl(event) => {
                self.collab.injector.inject(&event);
            }

            Message::BrowseData(listing) => {
                self.state.browse = Some(listing.clone());
                self.emit(UiEvent::BrowseListing(listing));
            }

            Message::CallEvent(call) => {
                self.state.calls.insert(call.event_id.clone(), call.clone());
                self.emit(UiEvent::CallUpdated(call));
            }

            Message::CallControlResponse(response) => {
                tracing::debug!(
                    event_id = %response.event_id,
                    success = response.success,
                    "call control verdict"
                );
            }

            other => {
                tracing::debug!(session, kind = other.kind(), "unexpected inbound kind, dropped");
            }
        }
    }

    fn handle_device(&mut self, session: SessionId, info: DeviceInfo) {
        let election =
            self.sessions
                .try_elect(session, info.target_ip_address.as_deref(), self.bound_ip);

        match election {
            Election::Rejected => {
                tracing::debug!(session, "handshake from quarantined session, ignored");
            }
            Election::Elected { superseded } => {
                if let Some(old) = superseded {
                    if let Some(server) = &self.server {
                        server.close_session(old);
                    }
                }

                let wallpaper = info.wallpaper.clone();
                let peer = PeerDevice::from(info);
                self.state.peer = Some(peer.clone());

                if let Some(wallpaper) = wallpaper {
                    self.emit(UiEvent::Wallpaper(wallpaper));
                }

                if let Some(ip) = self.bound_ip {
                    if let Err(err) = self.registry.record(NetworkKey::of(ip), peer.clone()) {
                        tracing::warn!(%err, "pairing registry write failed");
                    }
                }

                let reply = Message::MacInfo(MacInfo {
                    name: self.config.device_name.clone(),
                    category: self.config.device_category.clone(),
                    model: self.config.device_model.clone(),
                    version: PROTOCOL_VERSION.to_string(),
                    plus: self.config.plus,
                    saved_icon_packages: self.apps.packages_with_icons(),
                });
                self.outbox.send_to(session, &reply);

                tracing::info!(session, peer = %peer.name, "peer paired");
                self.emit(UiEvent::PeerPaired(peer));
            }
        }
    }

    // ------------------------------------------------------------------
    // Operator commands
    // ------------------------------------------------------------------

    async fn on_command(&mut self, command: DaemonCommand) {
        match command {
            DaemonCommand::SendFile { path } => self.start_outbound(path),
            DaemonCommand::CancelTransfer { id } => {
                let _ = self.file_tx.send(FileCommand::CancelLocal(id));
            }
            DaemonCommand::SendClipboard { text } => {
                self.outbox.send(&Message::ClipboardUpdate(
                    lanbridge_proto::ClipboardUpdate { text },
                ));
            }
            DaemonCommand::SendMessage { message } => {
                // The listening flag is ours to keep in sync when the
                // operator toggles notification forwarding for a package.
                if let Message::ToggleAppNotif(toggle) = &message {
                    match self.apps.set_listening(&toggle.package, toggle.state) {
                        Ok(true) => {}
                        Ok(false) => {
                            tracing::debug!(package = %toggle.package, "toggle for unknown package");
                        }
                        Err(err) => {
                            tracing::warn!(%err, "inventory write failed");
                        }
                    }
                }
                self.outbox.send(&message);
            }
            DaemonCommand::Disconnect => {
                self.outbox.send(&Message::DisconnectRequest {});
                if let (Some(primary), Some(server)) = (self.sessions.primary(), &self.server) {
                    server.close_session(primary);
                }
            }
            DaemonCommand::Restart => self.restart_transport().await,
        }
    }

    fn start_outbound(&mut self, path: std::path::PathBuf) {
        let id = Uuid::new_v4();
        let handle = OutboundHandle::new(id);
        let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();

        let transfer = match OutboundTransfer::new(
            path.clone(),
            guess_mime(&path).to_string(),
            self.config.chunk_size,
            handle.clone(),
            self.config.outbound,
            Arc::clone(&self.outbox) as Arc<dyn ChunkSink>,
            progress_tx,
        ) {
            Ok(transfer) => transfer,
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "outbound transfer rejected");
                self.emit(UiEvent::TransferFailed {
                    id,
                    reason: err.to_string(),
                });
                return;
            }
        };

        self.outbound.insert(id, handle);

        let events = self.events.clone();
        tokio::spawn(async move {
            while let Some(update) = progress_rx.recv().await {
                let _ = events.send(UiEvent::TransferProgress {
                    id: update.id,
                    bytes: update.bytes,
                    total: update.total,
                });
            }
        });

        let events = self.events.clone();
        let outbound = Arc::clone(&self.outbound);
        tokio::spawn(async move {
            let result = transfer.run().await;
            outbound.remove(&id);
            match result {
                Ok(OutboundOutcome::Completed { .. }) => {
                    let _ = events.send(UiEvent::TransferCompleted {
                        id,
                        path: None,
                        verified: None,
                    });
                }
                Ok(OutboundOutcome::Cancelled) => {
                    let _ = events.send(UiEvent::TransferCancelled { id });
                }
                Err(err) => {
                    let _ = events.send(UiEvent::TransferFailed {
                        id,
                        reason: err.to_string(),
                    });
                }
            }
        });
    }

    // ------------------------------------------------------------------

    fn set_status(&mut self, status: TransportStatus) {
        tracing::info!(?status, "transport status");
        self.status.send_replace(status.clone());
        self.emit(UiEvent::Transport(status));
    }

    fn emit(&self, event: UiEvent) {
        let _ = self.events.send(event);
    }
}

fn guess_mime(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("mp4") => "video/mp4",
        Some("mp3") => "audio/mpeg",
        Some("pdf") => "application/pdf",
        Some("txt" | "log") => "text/plain",
        Some("json") => "application/json",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_mime() {
        assert_eq!(guess_mime(Path::new("a/photo.JPG")), "image/jpeg");
        assert_eq!(guess_mime(Path::new("notes.txt")), "text/plain");
        assert_eq!(guess_mime(Path::new("blob")), "application/octet-stream");
    }
}
