//! KeepGoing peer entry point.
//!
//! Loads the configuration, connects to the other machine (listening as
//! Host, dialling as Peer), and runs one session until the link drops or
//! Ctrl+C is pressed.
//!
//! # Usage
//!
//! ```text
//! keepgoing [OPTIONS]
//!
//! Options:
//!   --config <PATH>          Config file [default: platform config dir]
//!   --mode <host|peer>       Overrides session.mode
//!   --direction <EDGE>       Overrides session.direction (left|right|top|bottom)
//!   --peer-host <HOST>       Overrides network.peer_host
//!   --port <PORT>            Overrides network.port
//!   --init-config            Writes the effective configuration and exits
//! ```
//!
//! CLI flags (or their `KEEPGOING_*` environment variables) take precedence
//! over the config file.
//!
//! # Input back-ends
//!
//! This build wires the in-memory capture, injection and display adapters
//! from `infrastructure`, so it runs headless: the full handshake, relay and
//! replay path is exercised without touching the desktop.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use keepgoing_core::{Direction, Mode};
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use keepgoing_peer::application::apply_input::InputSink;
use keepgoing_peer::application::handoff::{CursorController, Devices};
use keepgoing_peer::application::session::{run_session, stop_requested, SessionError};
use keepgoing_peer::infrastructure::{
    input_capture::mock::MockInputSource,
    input_emulation::mock::{MockInputSink, SimulatedCursor},
    network::{connect, relay::spawn_relay},
    screen_info::{DisplayEnumerator, MockDisplayEnumerator},
    storage::config::{config_file_path, load_config_from, save_config_to, AppConfig},
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Share one keyboard and mouse between two machines.
#[derive(Debug, Parser)]
#[command(name = "keepgoing", version)]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long, env = "KEEPGOING_CONFIG")]
    config: Option<PathBuf>,

    /// `host` listens for the other machine; `peer` connects to it.
    #[arg(long, env = "KEEPGOING_MODE")]
    mode: Option<Mode>,

    /// Edge of this machine's screen that borders the other machine.
    #[arg(long, env = "KEEPGOING_DIRECTION")]
    direction: Option<Direction>,

    /// Host to connect to in peer mode.
    #[arg(long, env = "KEEPGOING_PEER_HOST")]
    peer_host: Option<String>,

    /// TCP port to listen on or connect to.
    #[arg(long, env = "KEEPGOING_PORT")]
    port: Option<u16>,

    /// Write the effective configuration to the config path and exit.
    #[arg(long)]
    init_config: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.session.mode = mode;
        }
        if let Some(direction) = self.direction {
            config.session.direction = direction;
        }
        if let Some(host) = &self.peer_host {
            config.network.peer_host = host.clone();
        }
        if let Some(port) = self.port {
            config.network.port = port;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config_file_path().context("no --config given and no platform config dir")?,
    };
    let mut config = load_config_from(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    cli.apply_to(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if cli.init_config {
        save_config_to(&config_path, &config)
            .with_context(|| format!("writing {}", config_path.display()))?;
        info!("wrote configuration to {}", config_path.display());
        return Ok(());
    }

    info!(
        mode = %config.session.mode,
        direction = %config.session.direction,
        config = %config_path.display(),
        "KeepGoing starting"
    );

    // ── Graceful shutdown signal ──────────────────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C; shutting down");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    // ── Devices ───────────────────────────────────────────────────────────────
    warn!("using in-memory input adapters; local input is not captured");
    let enumerator = MockDisplayEnumerator::single_1080p();
    let cursor = Arc::new(SimulatedCursor::new(enumerator.list_displays()?));
    let devices = Devices {
        input: Arc::new(MockInputSource::new()),
        sink: Arc::new(MockInputSink::driving(Arc::clone(&cursor))) as Arc<dyn InputSink>,
        cursor: cursor as Arc<dyn CursorController>,
        displays: Arc::new(enumerator),
    };

    // ── Connect ───────────────────────────────────────────────────────────────
    let endpoint = config.endpoint();
    let stream = tokio::select! {
        stream = connect(config.session.mode, &endpoint) => stream?,
        true = stop_requested(&mut shutdown_rx) => {
            info!("KeepGoing stopped before a peer connected");
            return Ok(());
        }
    };

    // ── Session ───────────────────────────────────────────────────────────────
    let (link, relay) = spawn_relay(stream, config.relay_config());
    let result = run_session(config.session_config(), devices, link, shutdown_rx).await;
    relay.abort();

    match result {
        Ok(()) => info!("KeepGoing stopped"),
        Err(SessionError::PeerClosed) => info!("peer disconnected; KeepGoing stopped"),
        Err(e) => return Err(e).context("session failed"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_overrides_nothing() {
        // Arrange
        let cli = Cli::parse_from(["keepgoing"]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_to(&mut config);

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_flags_override_config_file() {
        // Arrange
        let cli = Cli::parse_from([
            "keepgoing",
            "--mode",
            "peer",
            "--direction",
            "Left",
            "--peer-host",
            "10.0.0.7",
            "--port",
            "6000",
        ]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_to(&mut config);

        // Assert
        assert_eq!(config.session.mode, Mode::Peer);
        assert_eq!(config.session.direction, Direction::Left);
        assert_eq!(config.network.peer_host, "10.0.0.7");
        assert_eq!(config.network.port, 6000);
    }

    #[test]
    fn test_cli_rejects_unknown_direction() {
        let result = Cli::try_parse_from(["keepgoing", "--direction", "up"]);
        assert!(result.is_err());
    }
}
