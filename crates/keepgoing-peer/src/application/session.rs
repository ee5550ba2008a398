//! Session: one connected link, from settings exchange to disconnect.
//!
//! A session starts once the TCP connection is up.  The Host announces its
//! [`Settings`]; the Peer waits for them and adopts the mirrored direction.
//! After that the session loop multiplexes everything the controller reacts
//! to: peer messages, captured input, edge-poll ticks, the handshake
//! deadline and the stop signal.
//!
//! The session ends when the link closes or fails, or when shutdown is
//! requested.  Both peers return to Idle either way.

use std::sync::Arc;
use std::time::Duration;

use keepgoing_core::{protocol::messages::MessageType, Mode, PeerMessage, Settings};
use thiserror::Error;
use tokio::{
    sync::{mpsc, watch},
    time::{self, MissedTickBehavior},
};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::application::coalescer::{until, TransmitError, Transmitter};
use crate::application::handoff::{Devices, HandoffConfig, HandoffController, HandoffError};
use crate::infrastructure::screen_info::DisplayError;

/// Something that happened on the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A complete, well-formed message arrived.
    Message(PeerMessage),
    /// The peer closed the connection.
    Closed,
    /// The connection failed; the string describes why.
    Failed(String),
}

/// The session's view of a connected link.
pub struct Link {
    /// Ordered outbound queue.
    pub transmitter: Arc<dyn Transmitter>,
    /// Inbound messages and link state changes.
    pub events: mpsc::Receiver<LinkEvent>,
}

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("peer closed the connection")]
    PeerClosed,
    #[error("protocol violation: expected Settings first, got {0:?}")]
    UnexpectedFirstMessage(MessageType),
    #[error("no settings received from host within {0:?}")]
    SettingsTimeout(Duration),
    #[error("display enumeration failed: {0}")]
    Display(#[from] DisplayError),
}

impl From<HandoffError> for SessionError {
    fn from(e: HandoffError) -> Self {
        match e {
            HandoffError::LinkClosed => SessionError::PeerClosed,
            HandoffError::Display(inner) => SessionError::Display(inner),
        }
    }
}

/// Session tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Local settings before negotiation.
    pub settings: Settings,
    /// How often the local pointer is sampled for edge crossings.
    pub poll_interval: Duration,
    pub handoff: HandoffConfig,
}

/// Exchanges settings at session start and returns the settings to use.
///
/// The Host sends its settings unchanged.  The Peer waits up to `timeout`
/// for the Host's and adopts the mirrored direction.
///
/// # Errors
///
/// Returns [`SessionError`] if the link fails, the first message is not
/// `Settings`, or nothing arrives in time.
pub async fn negotiate_settings(
    local: Settings,
    link: &mut Link,
    timeout: Duration,
) -> Result<Settings, SessionError> {
    match local.mode {
        Mode::Host => {
            link.transmitter
                .send(PeerMessage::Settings(local))
                .await
                .map_err(|e| match e {
                    TransmitError::Closed => SessionError::PeerClosed,
                    TransmitError::QueueFull => SessionError::Transport(e.to_string()),
                })?;
            info!(direction = %local.direction, "settings sent to peer");
            Ok(local)
        }
        Mode::Peer => {
            let first = time::timeout(timeout, link.events.recv())
                .await
                .map_err(|_| SessionError::SettingsTimeout(timeout))?;
            match first {
                Some(LinkEvent::Message(PeerMessage::Settings(host))) => {
                    let adopted = local.adopt_from(host);
                    if adopted.direction != local.direction {
                        info!(
                            configured = %local.direction,
                            adopted = %adopted.direction,
                            "direction overridden by host"
                        );
                    }
                    info!(direction = %adopted.direction, "settings received from host");
                    Ok(adopted)
                }
                Some(LinkEvent::Message(other)) => {
                    Err(SessionError::UnexpectedFirstMessage(other.message_type()))
                }
                Some(LinkEvent::Failed(reason)) => Err(SessionError::Transport(reason)),
                Some(LinkEvent::Closed) | None => Err(SessionError::PeerClosed),
            }
        }
    }
}

/// Runs one session to completion.
///
/// Returns `Ok(())` when shutdown was requested, or the error that ended
/// the session.
///
/// # Errors
///
/// Returns [`SessionError`] when negotiation fails or the link is lost.
pub async fn run_session(
    config: SessionConfig,
    devices: Devices,
    link: Link,
    shutdown: watch::Receiver<bool>,
) -> Result<(), SessionError> {
    let id = Uuid::new_v4();
    let span = info_span!("session", %id, mode = %config.settings.mode);
    drive(config, devices, link, shutdown).instrument(span).await
}

async fn drive(
    config: SessionConfig,
    devices: Devices,
    mut link: Link,
    mut shutdown: watch::Receiver<bool>,
) -> Result<(), SessionError> {
    let settings =
        negotiate_settings(config.settings, &mut link, config.handoff.handshake_timeout).await?;
    let (mut controller, mut captured) = HandoffController::new(
        settings,
        devices,
        Arc::clone(&link.transmitter),
        config.handoff,
    )?;

    let mut poll = time::interval(config.poll_interval);
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);
    info!(direction = %settings.direction, "session established");

    loop {
        let step: Result<(), HandoffError> = tokio::select! {
            true = stop_requested(&mut shutdown) => {
                info!("shutdown requested; ending session");
                if let Err(e) = controller.cancel().await {
                    warn!("could not notify peer during shutdown: {e}");
                }
                return Ok(());
            }
            event = link.events.recv() => match event {
                Some(LinkEvent::Message(message)) => controller.handle_message(message).await,
                Some(LinkEvent::Failed(reason)) => {
                    error!("link failed: {reason}");
                    controller.on_link_lost().await;
                    return Err(SessionError::Transport(reason));
                }
                Some(LinkEvent::Closed) | None => {
                    info!("peer disconnected");
                    controller.on_link_lost().await;
                    return Err(SessionError::PeerClosed);
                }
            },
            Some(event) = captured.recv() => {
                controller.handle_captured(event);
                Ok(())
            }
            _ = poll.tick() => controller.poll_edge().await,
            _ = until(controller.handshake_deadline()) => controller.expire_handshake().await,
        };

        if let Err(e) = step {
            error!("session ending: {e}");
            controller.on_link_lost().await;
            return Err(e.into());
        }
    }
}

/// Resolves to `true` once a stop is signalled; `false` if the sender is gone.
pub async fn stop_requested(shutdown: &mut watch::Receiver<bool>) -> bool {
    shutdown.wait_for(|stop| *stop).await.is_ok()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
