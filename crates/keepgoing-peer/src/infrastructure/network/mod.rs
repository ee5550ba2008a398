//! Network infrastructure: TCP bootstrapping and the frame relay.
//!
//! Exactly one connection exists per session.  The Host listens and accepts
//! the first peer that connects; the Peer dials the Host once.  Either way
//! the result is a plain [`TcpStream`] with Nagle's algorithm disabled, which
//! is handed to [`relay::spawn_relay`].
//!
//! Reconnection is not attempted: a lost link ends the session.

use std::io;

use keepgoing_core::{Mode, ProtocolError};
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tracing::info;

pub mod mock;
pub mod relay;

/// Default TCP port.
pub const DEFAULT_PORT: u16 = 50310;

/// Errors that can occur in the network layer.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Binding the listening socket failed.
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// Connecting to the host failed.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// An I/O error occurred on the established connection.
    #[error("connection I/O error: {0}")]
    Io(#[from] io::Error),
    /// Frame boundaries in the inbound stream can no longer be trusted.
    #[error("inbound stream desynchronised: {0}")]
    Desync(ProtocolError),
}

/// Where to listen or connect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Interface the Host listens on.
    pub bind_address: String,
    /// Address the Peer dials.
    pub peer_host: String,
    pub port: u16,
}

impl Default for Endpoint {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            peer_host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Establishes the session connection for `mode`.
///
/// # Errors
///
/// Returns [`RelayError::Bind`], [`RelayError::Connect`] or
/// [`RelayError::Io`] if the connection cannot be established.
pub async fn connect(mode: Mode, endpoint: &Endpoint) -> Result<TcpStream, RelayError> {
    match mode {
        Mode::Host => {
            let addr = format!("{}:{}", endpoint.bind_address, endpoint.port);
            let listener = TcpListener::bind(&addr)
                .await
                .map_err(|source| RelayError::Bind {
                    addr: addr.clone(),
                    source,
                })?;
            info!("listening on {addr}; waiting for peer");
            accept_peer(&listener).await
        }
        Mode::Peer => dial_host(&endpoint.peer_host, endpoint.port).await,
    }
}

/// Accepts a single connection on `listener`.
pub async fn accept_peer(listener: &TcpListener) -> Result<TcpStream, RelayError> {
    let (stream, remote) = listener.accept().await?;
    stream.set_nodelay(true)?;
    info!(%remote, "peer connected");
    Ok(stream)
}

/// Dials the host once.
pub async fn dial_host(host: &str, port: u16) -> Result<TcpStream, RelayError> {
    let addr = format!("{host}:{port}");
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|source| RelayError::Connect {
            addr: addr.clone(),
            source,
        })?;
    stream.set_nodelay(true)?;
    info!("connected to host at {addr}");
    Ok(stream)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
