//! # lanbridge-core
//!
//! The daemon core: one coordination task owns the shared state and runs
//! every protocol handler; the transport, the file queue, and per-transfer
//! send loops run on their own tasks and talk to it through channels.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Daemon (orchestration)                   │
//! │  key store · interface selection · wake-on-start · restart   │
//! ├──────────────────────────────────────────────────────────────┤
//! │                  Coordinator (single task)                   │
//! │  session election · heartbeat · router · protocol handlers  │
//! ├───────────────┬──────────────────────────┬───────────────────┤
//! │  WsServer     │  FileWorker (serial)     │  Outbound senders │
//! │  accept/pump  │  chunk writes, acks      │  sliding window   │
//! └───────────────┴──────────────────────────┴───────────────────┘
//! ```
//!
//! State changes are published on a typed broadcast channel; the UI and CLI
//! subscribe instead of holding references into the core.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apps;
pub mod collab;
pub mod config;
pub mod daemon;
pub mod error;
pub mod events;
pub mod filequeue;
pub mod outbox;
pub mod session;
pub mod state;

pub use collab::{
    Collaborators, InputInjector, MediaController, Pasteboard, SystemNotifier, VolumeController,
};
pub use config::{DaemonConfig, TimerConfig};
pub use daemon::{Daemon, DaemonCommand, DaemonHandle};
pub use error::CoreError;
pub use events::UiEvent;
pub use outbox::Outbox;
pub use session::{Election, SessionManager};
pub use state::SharedState;
