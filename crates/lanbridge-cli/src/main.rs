//! lanbridge CLI
//!
//! Desktop-side LAN bridge daemon pairing with a companion mobile device.

mod config;

use clap::{Parser, Subcommand};
use config::Config;
use lanbridge_core::{Collaborators, Daemon, UiEvent};
use lanbridge_crypto::KeyStore;
use lanbridge_net::{PairingRegistry, list_interfaces};
use std::path::PathBuf;
use uuid::Uuid;

/// lanbridge - bridge a desktop to a companion mobile device over the LAN
#[derive(Parser)]
#[command(name = "lanbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the daemon
    Run,

    /// Pair with the peer, send one file, and exit (ctrl-c cancels)
    Send {
        /// File to send
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Regenerate the pairing key (all peers must re-pair)
    ResetKey,

    /// List usable network interfaces
    Interfaces,

    /// Show configuration and pairing state
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default()?,
    };
    config.validate()?;

    // Initialize logging
    let filter = if cli.verbose {
        "debug".to_string()
    } else {
        config.logging.level.clone()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Run => run_daemon(&config).await?,
        Commands::Send { file } => send_file(&config, file).await?,
        Commands::ResetKey => reset_key(&config)?,
        Commands::Interfaces => list_interfaces_cmd(),
        Commands::Status => show_status(&config)?,
    }

    Ok(())
}

/// Run the daemon until ctrl-c.
async fn run_daemon(config: &Config) -> anyhow::Result<()> {
    let daemon = Daemon::start(config.to_daemon_config(), Collaborators::default()).await?;
    let mut events = daemon.subscribe();

    println!("transport: {:?}", daemon.transport_status());
    tracing::info!("daemon running, ctrl-c to stop");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => {
                match event {
                    Ok(event) => print_event(&event),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "event stream lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    daemon.stop().await;
    Ok(())
}

/// Wait for a peer, push one file, wait for the outcome.
async fn send_file(config: &Config, file: PathBuf) -> anyhow::Result<()> {
    if !file.exists() {
        anyhow::bail!("file not found: {}", file.display());
    }

    let daemon = Daemon::start(config.to_daemon_config(), Collaborators::default()).await?;
    let handle = daemon.handle();
    let mut events = daemon.subscribe();

    println!("waiting for the peer to connect ...");

    let mut transfer_id: Option<Uuid> = None;
    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                match transfer_id {
                    Some(id) => {
                        println!("\ncancelling transfer {id}");
                        handle.cancel_transfer(id)?;
                    }
                    None => break Err(anyhow::anyhow!("interrupted before pairing")),
                }
            }
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => {
                        break Err(anyhow::anyhow!("daemon stopped"));
                    }
                };

                match event {
                    UiEvent::PeerPaired(peer) if transfer_id.is_none() => {
                        println!("paired with {} ({})", peer.name, peer.ip_address);
                        handle.send_file(file.clone())?;
                    }
                    UiEvent::TransferProgress { id, bytes, total } => {
                        transfer_id = Some(id);
                        print!("\r{bytes}/{total} bytes");
                    }
                    UiEvent::TransferCompleted { .. } if transfer_id.is_some() => {
                        println!("\ntransfer complete");
                        break Ok(());
                    }
                    UiEvent::TransferVerified { verified, .. } => {
                        println!(
                            "peer verification: {}",
                            if verified { "ok" } else { "FAILED" }
                        );
                    }
                    UiEvent::TransferFailed { reason, .. } if transfer_id.is_some() => {
                        break Err(anyhow::anyhow!("transfer failed: {reason}"));
                    }
                    UiEvent::TransferCancelled { .. } if transfer_id.is_some() => {
                        break Err(anyhow::anyhow!("transfer cancelled"));
                    }
                    _ => {}
                }
            }
        }
    };

    daemon.stop().await;
    result
}

/// Replace the pairing key. Existing pairings become invalid.
fn reset_key(config: &Config) -> anyhow::Result<()> {
    let daemon_config = config.to_daemon_config();
    let Some(key_file) = daemon_config.key_file else {
        anyhow::bail!("plaintext mode is configured; there is no key to reset");
    };

    KeyStore::new(&key_file).reset()?;
    println!("pairing key replaced; peers must re-pair");
    Ok(())
}

fn list_interfaces_cmd() {
    let interfaces = list_interfaces();
    if interfaces.is_empty() {
        println!("no usable IPv4 interfaces");
        return;
    }

    for iface in interfaces {
        println!("{:<12} {}", iface.name, iface.addr);
    }
}

fn show_status(config: &Config) -> anyhow::Result<()> {
    let daemon_config = config.to_daemon_config();

    println!("port:          {}", config.network.port);
    println!("interface:     {}", config.network.interface);
    println!("downloads:     {}", daemon_config.downloads_dir.display());
    println!("data dir:      {}", daemon_config.data_dir.display());

    match &daemon_config.key_file {
        Some(path) => {
            let state = if path.exists() { "present" } else { "not yet generated" };
            println!("pairing key:   {state} ({})", path.display());
        }
        None => println!("pairing key:   disabled (plaintext mode)"),
    }

    let registry_path = daemon_config.registry_path();
    if registry_path.exists() {
        let registry = PairingRegistry::load(&registry_path)?;
        println!("known networks: {}", registry.len());
    } else {
        println!("known networks: 0");
    }

    Ok(())
}

fn print_event(event: &UiEvent) {
    match event {
        UiEvent::Transport(status) => println!("transport: {status:?}"),
        UiEvent::PeerPaired(peer) => println!("paired: {} ({})", peer.name, peer.ip_address),
        UiEvent::PeerUnpaired => println!("peer disconnected"),
        UiEvent::PairingCodeStale => println!("network changed; pairing code is stale"),
        UiEvent::NotificationPosted(n) => println!("notification [{}] {}", n.app, n.title),
        UiEvent::TransferProgress { id, bytes, total } => {
            println!("transfer {id}: {bytes}/{total}");
        }
        UiEvent::TransferCompleted { id, path, .. } => match path {
            Some(path) => println!("transfer {id} complete: {}", path.display()),
            None => println!("transfer {id} complete"),
        },
        UiEvent::TransferFailed { id, reason } => println!("transfer {id} failed: {reason}"),
        UiEvent::TransferWarning { id, message } => println!("transfer {id}: {message}"),
        _ => {}
    }
}
