//! Handoff controller: the state machine that moves input control between
//! this machine and its peer.
//!
//! # States (for beginners)
//!
//! ```text
//!            crossing                 DisplayInfo
//!   Idle ─────────────▶ Handshaking ─────────────▶ Active
//!    ▲ ▲                    │ timeout                │ ReturnControl / cancel /
//!    │ └────────────────────┘                        │ link lost
//!    │ ◀─────────────────────────────────────────────┘
//!    │
//!    │  ReturnControl / local crossing        Ready
//!    └──────────────────────────── Controlled ◀──────── Idle
//! ```
//!
//! Both peers run the same controller, so either side may start a handoff.
//! The side that detects the edge crossing becomes **Active**: its local
//! input is captured, scaled, batched and relayed, and never reaches the
//! local OS.  The other side becomes **Controlled**: it replays what
//! arrives until its own pointer is pushed back across the shared edge.
//!
//! # Re-centring
//!
//! While Active the local pointer is teleported back to the centre of the
//! primary display after every move, so it never runs into a screen edge
//! and keeps producing deltas.  The teleport itself shows up as a synthetic
//! move in the capture stream; a small counter swallows those.

use std::sync::Arc;
use std::time::Duration;

use keepgoing_core::{
    edge_display, map_delta,
    protocol::messages::{
        saturate_i16, InputEvent, KeyMessage, MouseButtonMessage, MouseWheelMessage,
    },
    ControlToken, Display, EdgeMonitor, Mode, MouseButton, PeerMessage, Point, Settings,
};
use thiserror::Error;
use tokio::{sync::mpsc, time::Instant};
use tracing::{debug, error, info, warn};

use crate::application::apply_input::{InjectionError, InputSink, RemoteInputApplier};
use crate::application::coalescer::{
    spawn_coalescer, CoalescerConfig, CoalescerHandle, TransmitError, Transmitter,
};
use crate::infrastructure::input_capture::{InputSource, RawInputEvent};
use crate::infrastructure::screen_info::{DisplayEnumerator, DisplayError};

/// Upper bound on re-centring moves still expected from the capture hook.
const MAX_IN_FLIGHT_RECENTRES: u8 = 4;

/// Reads and warps the local OS pointer.
#[cfg_attr(test, mockall::automock)]
pub trait CursorController: Send + Sync {
    /// Moves the pointer to (x, y) without generating a user-visible drag.
    fn teleport_cursor(&self, x: i32, y: i32) -> Result<(), InjectionError>;

    /// Returns the current pointer position in virtual screen coordinates.
    fn cursor_position(&self) -> Result<Point, InjectionError>;
}

/// Which side of a handoff this machine is on, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandoffState {
    /// Local input goes to the local OS.
    Idle,
    /// A crossing was detected; waiting for the peer's display.
    Handshaking,
    /// Local input is captured and relayed to the peer.
    Active,
    /// The peer is driving this machine's pointer and keyboard.
    Controlled,
}

/// Errors that end the session.
#[derive(Debug, Error)]
pub enum HandoffError {
    #[error("link to peer closed")]
    LinkClosed,
    #[error("no local display available: {0}")]
    Display(#[from] DisplayError),
}

/// OS-facing capabilities used by the controller.
#[derive(Clone)]
pub struct Devices {
    pub input: Arc<dyn InputSource>,
    pub cursor: Arc<dyn CursorController>,
    pub sink: Arc<dyn InputSink>,
    pub displays: Arc<dyn DisplayEnumerator>,
}

/// Controller tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffConfig {
    /// How long to wait for the peer's display after sending `Ready`.
    pub handshake_timeout: Duration,
    pub coalescer: CoalescerConfig,
}

impl Default for HandoffConfig {
    fn default() -> Self {
        Self {
            handshake_timeout: Duration::from_millis(3000),
            coalescer: CoalescerConfig::default(),
        }
    }
}

pub struct HandoffController {
    settings: Settings,
    state: HandoffState,
    devices: Devices,
    transmitter: Arc<dyn Transmitter>,
    coalescer: CoalescerHandle,
    applier: RemoteInputApplier,
    capture_tx: mpsc::UnboundedSender<RawInputEvent>,
    displays: Vec<Display>,
    primary: Display,
    peer_display: Option<Display>,
    edge: EdgeMonitor,
    handshake_timeout: Duration,
    handshake_deadline: Option<Instant>,
    anchor: Point,
    last_position: Point,
    suppress_moves: u8,
}

impl HandoffController {
    /// Creates an Idle controller and spawns its coalescer.
    ///
    /// Returns the controller and the receiver on which captured input is
    /// delivered while Active; feed those events to
    /// [`handle_captured`](Self::handle_captured).
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Display`] if no local display can be found.
    pub fn new(
        settings: Settings,
        devices: Devices,
        transmitter: Arc<dyn Transmitter>,
        config: HandoffConfig,
    ) -> Result<(Self, mpsc::UnboundedReceiver<RawInputEvent>), HandoffError> {
        let displays = devices.displays.list_displays()?;
        let primary = *displays.first().ok_or(DisplayError::NoDisplays)?;
        let (coalescer, _task) = spawn_coalescer(config.coalescer, Arc::clone(&transmitter));
        let (capture_tx, capture_rx) = mpsc::unbounded_channel();
        let anchor = primary.center();

        let controller = Self {
            settings,
            state: HandoffState::Idle,
            applier: RemoteInputApplier::new(Arc::clone(&devices.sink)),
            devices,
            transmitter,
            coalescer,
            capture_tx,
            displays,
            primary,
            peer_display: None,
            edge: EdgeMonitor::new(settings.direction),
            handshake_timeout: config.handshake_timeout,
            handshake_deadline: None,
            anchor,
            last_position: anchor,
            suppress_moves: 0,
        };
        Ok((controller, capture_rx))
    }

    pub fn state(&self) -> HandoffState {
        self.state
    }

    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// The peer's primary display, once it has been received.
    pub fn peer_display(&self) -> Option<Display> {
        self.peer_display
    }

    /// When the pending handshake gives up, if one is pending.
    pub fn handshake_deadline(&self) -> Option<Instant> {
        self.handshake_deadline
    }

    // ── Edge polling ──────────────────────────────────────────────────────────

    /// Samples the local pointer and reacts to an edge crossing.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::LinkClosed`] if a control message cannot be sent.
    pub async fn poll_edge(&mut self) -> Result<(), HandoffError> {
        if !matches!(self.state, HandoffState::Idle | HandoffState::Controlled) {
            return Ok(());
        }
        let position = match self.devices.cursor.cursor_position() {
            Ok(p) => p,
            Err(e) => {
                warn!("cannot read pointer position: {e}");
                return Ok(());
            }
        };
        if !self.edge.sample(position, &self.displays) {
            return Ok(());
        }

        match self.state {
            HandoffState::Idle => self.begin_handshake().await,
            HandoffState::Controlled => {
                info!(direction = %self.settings.direction, "pointer returned across edge");
                self.release_control().await
            }
            _ => Ok(()),
        }
    }

    async fn begin_handshake(&mut self) -> Result<(), HandoffError> {
        self.refresh_displays();
        self.peer_display = None;
        self.handshake_deadline = Some(Instant::now() + self.handshake_timeout);
        self.state = HandoffState::Handshaking;
        info!(direction = %self.settings.direction, "edge crossed; requesting handoff");
        self.send(ControlToken::Ready.into()).await
    }

    /// Falls back to Idle if the handshake deadline has passed.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::LinkClosed`] if the link is gone.
    pub async fn expire_handshake(&mut self) -> Result<(), HandoffError> {
        let expired = self
            .handshake_deadline
            .is_some_and(|deadline| Instant::now() >= deadline);
        if self.state != HandoffState::Handshaking || !expired {
            return Ok(());
        }
        warn!(
            timeout_ms = self.handshake_timeout.as_millis() as u64,
            "peer display info did not arrive; abandoning handoff"
        );
        self.handshake_deadline = None;
        self.state = HandoffState::Idle;
        self.send(ControlToken::ReturnControl.into()).await
    }

    // ── Inbound messages ──────────────────────────────────────────────────────

    /// Reacts to one message from the peer.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::LinkClosed`] if a reply cannot be sent.
    pub async fn handle_message(&mut self, message: PeerMessage) -> Result<(), HandoffError> {
        debug!(kind = ?message.message_type(), state = ?self.state, "message from peer");
        match message {
            PeerMessage::Control(ControlToken::Ready) => self.on_ready().await,
            PeerMessage::Control(ControlToken::ReadyAck) => {
                if self.state == HandoffState::Handshaking {
                    self.send(PeerMessage::DisplayInfo(self.primary)).await
                } else {
                    debug!(state = ?self.state, "ignoring stray ReadyAck");
                    Ok(())
                }
            }
            PeerMessage::Control(ControlToken::ReturnControl) => self.on_return_control().await,
            PeerMessage::DisplayInfo(peer) => {
                self.peer_display = Some(peer);
                debug!(
                    width = peer.width,
                    height = peer.height,
                    "peer display updated"
                );
                if self.state == HandoffState::Handshaking {
                    self.activate().await
                } else {
                    Ok(())
                }
            }
            PeerMessage::Settings(settings) => {
                warn!(?settings, "ignoring settings received after negotiation");
                Ok(())
            }
            PeerMessage::Input(event) => {
                if self.state == HandoffState::Controlled {
                    if let Err(e) = self.applier.apply(&event) {
                        warn!("failed to apply {:?}: {e}", event.message_type());
                    }
                } else {
                    debug!(state = ?self.state, "dropping input received while not controlled");
                }
                Ok(())
            }
        }
    }

    async fn on_ready(&mut self) -> Result<(), HandoffError> {
        match self.state {
            HandoffState::Idle => self.accept_handoff().await,
            HandoffState::Handshaking if self.settings.mode == Mode::Host => {
                info!("simultaneous crossing; host keeps its own request");
                Ok(())
            }
            HandoffState::Handshaking => {
                info!("simultaneous crossing; yielding to host");
                self.handshake_deadline = None;
                self.accept_handoff().await
            }
            HandoffState::Active | HandoffState::Controlled => {
                warn!(state = ?self.state, "ignoring Ready during a handoff");
                Ok(())
            }
        }
    }

    /// Answers a `Ready` and hands local control to the peer.
    async fn accept_handoff(&mut self) -> Result<(), HandoffError> {
        self.refresh_displays();
        self.state = HandoffState::Controlled;
        info!("peer took control");
        self.send(ControlToken::ReadyAck.into()).await?;
        self.send(PeerMessage::DisplayInfo(self.primary)).await?;

        let target = self.display_facing_peer();
        let entry = target.entry_point(self.settings.direction);
        if let Err(e) = self.applier.enter(target, entry) {
            warn!("failed to place pointer at entry point: {e}");
        }
        self.edge.reset(entry);
        Ok(())
    }

    async fn on_return_control(&mut self) -> Result<(), HandoffError> {
        match self.state {
            HandoffState::Active => {
                info!("peer returned control");
                self.deactivate().await;
            }
            HandoffState::Controlled => {
                info!("peer released control");
                self.applier.leave();
                self.state = HandoffState::Idle;
            }
            HandoffState::Handshaking => {
                info!("peer declined handoff");
                self.handshake_deadline = None;
                self.state = HandoffState::Idle;
            }
            HandoffState::Idle => debug!("ignoring ReturnControl while idle"),
        }
        Ok(())
    }

    // ── Active side ───────────────────────────────────────────────────────────

    async fn activate(&mut self) -> Result<(), HandoffError> {
        self.handshake_deadline = None;
        if let Err(e) = self.devices.input.install(self.capture_tx.clone()) {
            error!("cannot capture local input: {e}");
            self.state = HandoffState::Idle;
            return self.send(ControlToken::ReturnControl.into()).await;
        }
        self.state = HandoffState::Active;
        self.anchor = self.primary.center();
        self.last_position = self.anchor;
        self.suppress_moves = 0;
        self.recentre();
        info!(
            peer_width = self.peer_display.map(|d| d.width),
            peer_height = self.peer_display.map(|d| d.height),
            "handoff active; relaying input"
        );
        Ok(())
    }

    /// Routes one captured event while Active.
    pub fn handle_captured(&mut self, event: RawInputEvent) {
        if self.state != HandoffState::Active {
            debug!(state = ?self.state, "dropping captured event outside a handoff");
            return;
        }
        let forwarded = match event {
            RawInputEvent::MouseMove { x, y } => {
                self.on_captured_move(Point::new(x, y));
                true
            }
            RawInputEvent::MouseButtonDown { button, x, y } => {
                self.coalescer
                    .on_discrete(InputEvent::MouseDown(button_message(button, x, y)))
            }
            RawInputEvent::MouseButtonUp { button, x, y } => self
                .coalescer
                .on_discrete(InputEvent::MouseUp(button_message(button, x, y))),
            RawInputEvent::MouseWheel { dx, dy } => self
                .coalescer
                .on_discrete(InputEvent::MouseWheel(MouseWheelMessage { dx, dy })),
            RawInputEvent::KeyDown { raw_code } => self
                .coalescer
                .on_discrete(InputEvent::KeyDown(KeyMessage { raw_code })),
            RawInputEvent::KeyUp { raw_code } => self
                .coalescer
                .on_discrete(InputEvent::KeyUp(KeyMessage { raw_code })),
        };
        if !forwarded {
            warn!("coalescer stopped; captured input dropped");
        }
    }

    fn on_captured_move(&mut self, position: Point) {
        if self.suppress_moves > 0 && position == self.anchor {
            self.suppress_moves -= 1;
            return;
        }
        let delta = position.delta_from(self.last_position);
        self.last_position = position;
        if delta.is_zero() {
            return;
        }
        if let Some(peer) = self.peer_display {
            let mapped = map_delta(delta, &self.primary, &peer);
            if !mapped.is_zero() && !self.coalescer.on_move(mapped) {
                warn!("coalescer stopped; pointer movement dropped");
            }
        }
        self.recentre();
    }

    fn recentre(&mut self) {
        match self
            .devices
            .cursor
            .teleport_cursor(self.anchor.x, self.anchor.y)
        {
            Ok(()) => {
                self.last_position = self.anchor;
                self.suppress_moves = (self.suppress_moves + 1).min(MAX_IN_FLIGHT_RECENTRES);
            }
            Err(e) => warn!("failed to re-centre pointer: {e}"),
        }
    }

    /// Stops capturing, sends what is pending and parks the pointer just
    /// inside the handoff edge.
    async fn deactivate(&mut self) {
        self.devices.input.uninstall();
        self.coalescer.flush().await;
        self.suppress_moves = 0;
        self.state = HandoffState::Idle;

        let park = self
            .display_facing_peer()
            .entry_point(self.settings.direction);
        if let Err(e) = self.devices.cursor.teleport_cursor(park.x, park.y) {
            warn!("failed to park pointer: {e}");
        }
        self.edge.reset(park);
        info!("handoff ended; local input restored");
    }

    // ── Local cancellation and link loss ──────────────────────────────────────

    /// Ends any handoff in progress from this side and tells the peer.
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::LinkClosed`] if the peer cannot be told.
    pub async fn cancel(&mut self) -> Result<(), HandoffError> {
        match self.state {
            HandoffState::Idle => Ok(()),
            HandoffState::Active => {
                self.deactivate().await;
                self.send(ControlToken::ReturnControl.into()).await
            }
            HandoffState::Handshaking => {
                self.handshake_deadline = None;
                self.state = HandoffState::Idle;
                self.send(ControlToken::ReturnControl.into()).await
            }
            HandoffState::Controlled => self.release_control().await,
        }
    }

    async fn release_control(&mut self) -> Result<(), HandoffError> {
        self.applier.leave();
        self.state = HandoffState::Idle;
        self.send(ControlToken::ReturnControl.into()).await
    }

    /// Returns to Idle after the link is gone; nothing is sent.
    pub async fn on_link_lost(&mut self) {
        match self.state {
            HandoffState::Active => self.deactivate().await,
            HandoffState::Controlled => self.applier.leave(),
            HandoffState::Handshaking | HandoffState::Idle => {}
        }
        self.handshake_deadline = None;
        self.state = HandoffState::Idle;
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// The outermost local display on the shared edge.
    fn display_facing_peer(&self) -> Display {
        edge_display(&self.displays, self.settings.direction)
            .copied()
            .unwrap_or(self.primary)
    }

    fn refresh_displays(&mut self) {
        match self.devices.displays.list_displays() {
            Ok(displays) => {
                if let Some(primary) = displays.first() {
                    self.primary = *primary;
                    self.displays = displays;
                }
            }
            Err(e) => warn!("display enumeration failed; keeping previous layout: {e}"),
        }
    }

    async fn send(&self, message: PeerMessage) -> Result<(), HandoffError> {
        match self.transmitter.send(message).await {
            Ok(()) => Ok(()),
            Err(TransmitError::QueueFull) => {
                warn!(kind = ?message.message_type(), "control message dropped");
                Ok(())
            }
            Err(TransmitError::Closed) => Err(HandoffError::LinkClosed),
        }
    }
}

fn button_message(button: MouseButton, x: i32, y: i32) -> MouseButtonMessage {
    MouseButtonMessage {
        button,
        x: saturate_i16(x),
        y: saturate_i16(y),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
