//! Daemon assembly and the operator-facing handle.

mod coordinator;

use crate::apps::AppInventory;
use crate::collab::Collaborators;
use crate::config::DaemonConfig;
use crate::error::CoreError;
use crate::events::UiEvent;
use crate::filequeue::{FileCommand, FileWorker};
use crate::outbox::Outbox;
use crate::session::SessionManager;
use coordinator::Coordinator;
use dashmap::DashMap;
use lanbridge_crypto::{KeyStore, MessageBox};
use lanbridge_files::{ChunkSink, OutboundHandle};
use lanbridge_net::PairingRegistry;
use lanbridge_proto::{Message, TransferId};
use lanbridge_transport::TransportStatus;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Operator commands into the coordinator.
#[derive(Debug)]
pub enum DaemonCommand {
    /// Send a file to the paired peer.
    SendFile {
        /// Local file path.
        path: PathBuf,
    },
    /// Cancel a transfer by id (either direction).
    CancelTransfer {
        /// Transfer id.
        id: TransferId,
    },
    /// Push clipboard text to the peer.
    SendClipboard {
        /// The text.
        text: String,
    },
    /// Send an arbitrary outbound message to the primary session.
    SendMessage {
        /// The message.
        message: Message,
    },
    /// Ask the peer to drop the connection, then close the primary session.
    Disconnect,
    /// Stop and re-start the transport.
    Restart,
}

/// The running daemon. One per process.
pub struct Daemon {
    commands: mpsc::UnboundedSender<DaemonCommand>,
    events: broadcast::Sender<UiEvent>,
    status: watch::Receiver<TransportStatus>,
    cancel: CancellationToken,
    coordinator: JoinHandle<()>,
    file_worker: JoinHandle<()>,
}

impl Daemon {
    /// Assemble and start the daemon: load the pairing key, the last-paired
    /// registry, and the app inventory, then spawn the file worker and the
    /// coordination task. Binding happens inside the coordinator; a bind
    /// failure surfaces as a [`UiEvent::Transport`] status, not an error
    /// here.
    ///
    /// # Errors
    ///
    /// Returns an error if persisted state (key, registry, inventory)
    /// cannot be loaded.
    pub async fn start(
        config: DaemonConfig,
        collab: Collaborators,
    ) -> Result<Self, CoreError> {
        std::fs::create_dir_all(&config.data_dir)?;
        std::fs::create_dir_all(&config.downloads_dir)?;

        let mbox = match &config.key_file {
            Some(path) => {
                let key = KeyStore::new(path).load_or_generate()?;
                Some(MessageBox::new(key.as_bytes()))
            }
            None => {
                tracing::warn!("no key file configured, transport runs in the clear");
                None
            }
        };

        let registry = PairingRegistry::load(config.registry_path())?;
        let apps = AppInventory::load(config.icon_cache_dir())?;

        let sessions = Arc::new(SessionManager::new());
        let outbox = Arc::new(Outbox::new(mbox, Arc::clone(&sessions)));
        let (events, _) = broadcast::channel(256);
        let (commands_tx, commands_rx) = mpsc::unbounded_channel();
        let (file_tx, file_rx) = mpsc::unbounded_channel::<FileCommand>();
        let outbound: Arc<DashMap<TransferId, OutboundHandle>> = Arc::new(DashMap::new());
        let cancel = CancellationToken::new();

        let file_worker = FileWorker::new(
            Arc::clone(&outbound),
            config.downloads_dir.clone(),
            Arc::clone(&outbox) as Arc<dyn ChunkSink>,
            events.clone(),
            collab.clone(),
        );
        let file_worker = tokio::spawn(file_worker.run(file_rx));

        let (status_tx, status) = watch::channel(TransportStatus::Stopped);

        let coordinator = Coordinator::new(
            config,
            sessions,
            outbox,
            events.clone(),
            status_tx,
            collab,
            file_tx,
            outbound,
            apps,
            registry,
            commands_rx,
            cancel.clone(),
        );
        let coordinator = tokio::spawn(coordinator.run());

        Ok(Self {
            commands: commands_tx,
            events,
            status,
            cancel,
            coordinator,
            file_worker,
        })
    }

    /// A cloneable operator handle.
    pub fn handle(&self) -> DaemonHandle {
        DaemonHandle {
            commands: self.commands.clone(),
            events: self.events.clone(),
        }
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Current transport status.
    pub fn transport_status(&self) -> TransportStatus {
        self.status.borrow().clone()
    }

    /// Watch transport status changes.
    pub fn status_watch(&self) -> watch::Receiver<TransportStatus> {
        self.status.clone()
    }

    /// Stop the daemon: close the transport and every worker.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.coordinator.await;
        drop(self.commands);
        let _ = self.file_worker.await;
    }
}

/// Cloneable handle the UI/CLI drives the daemon with.
#[derive(Clone)]
pub struct DaemonHandle {
    commands: mpsc::UnboundedSender<DaemonCommand>,
    events: broadcast::Sender<UiEvent>,
}

impl DaemonHandle {
    fn command(&self, command: DaemonCommand) -> Result<(), CoreError> {
        self.commands.send(command).map_err(|_| CoreError::Stopped)
    }

    /// Send a file to the paired peer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn send_file(&self, path: PathBuf) -> Result<(), CoreError> {
        self.command(DaemonCommand::SendFile { path })
    }

    /// Cancel a transfer by id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn cancel_transfer(&self, id: TransferId) -> Result<(), CoreError> {
        self.command(DaemonCommand::CancelTransfer { id })
    }

    /// Push clipboard text to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn send_clipboard(&self, text: String) -> Result<(), CoreError> {
        self.command(DaemonCommand::SendClipboard { text })
    }

    /// Send a typed outbound message (media control, browse request, ...).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn send_message(&self, message: Message) -> Result<(), CoreError> {
        self.command(DaemonCommand::SendMessage { message })
    }

    /// Ask the peer to disconnect, then close the primary session.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn request_disconnect(&self) -> Result<(), CoreError> {
        self.command(DaemonCommand::Disconnect)
    }

    /// Restart the transport (stop, re-select interface, start).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Stopped`] if the daemon has shut down.
    pub fn restart(&self) -> Result<(), CoreError> {
        self.command(DaemonCommand::Restart)
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }
}
