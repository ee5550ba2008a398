//! TOML-based configuration for the peer application.
//!
//! Reads and writes [`AppConfig`] at the platform-appropriate location:
//! - Windows:  `%APPDATA%\KeepGoing\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/keepgoing/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/KeepGoing/config.toml`
//!
//! Example:
//!
//! ```toml
//! log_level = "info"
//!
//! [session]
//! mode = "host"
//! direction = "right"
//!
//! [network]
//! bind_address = "0.0.0.0"
//! peer_host = "127.0.0.1"
//! port = 50310
//!
//! [timing]
//! poll_interval_ms = 50
//! coalesce_window_ms = 60
//! handshake_timeout_ms = 3000
//! outbound_queue_capacity = 256
//! enqueue_timeout_ms = 250
//! strict_ordering = true
//! ```
//!
//! # Serde default values
//!
//! Every field carries `#[serde(default = "...")]`, so a missing file, a
//! missing section, or a file written by an older version all load cleanly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use keepgoing_core::{Direction, Mode, Settings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::coalescer::CoalescerConfig;
use crate::application::handoff::HandoffConfig;
use crate::application::session::SessionConfig;
use crate::infrastructure::network::{relay::RelayConfig, Endpoint, DEFAULT_PORT};

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level application configuration stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub timing: TimingSection,
}

/// Role and shared edge.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSection {
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Edge of the local screen that borders the peer.  A Peer's value is
    /// replaced by the mirror of the Host's once connected.
    #[serde(default = "default_direction")]
    pub direction: Direction,
}

/// Listening and dialling addresses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NetworkSection {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_peer_host")]
    pub peer_host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Polling, batching and backpressure knobs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimingSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_coalesce_window_ms")]
    pub coalesce_window_ms: u64,
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    #[serde(default = "default_enqueue_timeout_ms")]
    pub enqueue_timeout_ms: u64,
    /// Send a pending pointer batch before any click, scroll or key.
    #[serde(default = "default_true")]
    pub strict_ordering: bool,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_mode() -> Mode {
    Mode::Host
}
fn default_direction() -> Direction {
    Direction::Right
}
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}
fn default_peer_host() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_poll_interval_ms() -> u64 {
    50
}
fn default_coalesce_window_ms() -> u64 {
    60
}
fn default_handshake_timeout_ms() -> u64 {
    3000
}
fn default_outbound_queue_capacity() -> usize {
    256
}
fn default_enqueue_timeout_ms() -> u64 {
    250
}
fn default_true() -> bool {
    true
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            session: SessionSection::default(),
            network: NetworkSection::default(),
            timing: TimingSection::default(),
        }
    }
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            direction: default_direction(),
        }
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            peer_host: default_peer_host(),
            port: default_port(),
        }
    }
}

impl Default for TimingSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            coalesce_window_ms: default_coalesce_window_ms(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            enqueue_timeout_ms: default_enqueue_timeout_ms(),
            strict_ordering: default_true(),
        }
    }
}

// ── Conversions into runtime configuration ────────────────────────────────────

impl AppConfig {
    pub fn settings(&self) -> Settings {
        Settings::new(self.session.mode, self.session.direction)
    }

    pub fn endpoint(&self) -> Endpoint {
        Endpoint {
            bind_address: self.network.bind_address.clone(),
            peer_host: self.network.peer_host.clone(),
            port: self.network.port,
        }
    }

    pub fn relay_config(&self) -> RelayConfig {
        RelayConfig {
            queue_capacity: self.timing.outbound_queue_capacity,
            enqueue_timeout: Duration::from_millis(self.timing.enqueue_timeout_ms),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        let timing = &self.timing;
        SessionConfig {
            settings: self.settings(),
            poll_interval: Duration::from_millis(timing.poll_interval_ms.max(1)),
            handoff: HandoffConfig {
                handshake_timeout: Duration::from_millis(timing.handshake_timeout_ms),
                coalescer: CoalescerConfig {
                    window: Duration::from_millis(timing.coalesce_window_ms),
                    strict_ordering: timing.strict_ordering,
                },
            },
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Resolves the full path to the default config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    platform_config_dir()
        .map(|dir| dir.join("config.toml"))
        .ok_or(ConfigError::NoPlatformConfigDir)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Loads `AppConfig` from the platform default location.
///
/// # Errors
///
/// See [`load_config_from`]; also fails if no config directory exists.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config directory, including the `KeepGoing` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("KeepGoing"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("keepgoing"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("KeepGoing")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
