//! RemoteInputApplier: replays events received from the driving peer.
//!
//! This use case sits at the application layer and delegates to an
//! [`InputSink`] trait object for OS-level event injection.  Pointer moves
//! arrive as already-scaled deltas; they are accumulated onto a
//! [`PointerTracker`] that clamps to the local primary display, and the
//! resulting absolute position is injected.

use std::sync::Arc;

use keepgoing_core::{
    protocol::messages::{InputEvent, MouseButton},
    Display, Point, PointerTracker,
};
use thiserror::Error;

/// Error type for input injection operations.
#[derive(Debug, Error)]
pub enum InjectionError {
    #[error("platform error: {0}")]
    Platform(String),
    #[error("pointer tracking not started; no handoff is in progress")]
    NotInitialized,
}

/// Platform-agnostic input synthesis trait.
///
/// Each supported OS provides an implementation in the infrastructure layer.
pub trait InputSink: Send + Sync {
    /// Moves the pointer to an absolute position.
    fn move_to(&self, x: i32, y: i32) -> Result<(), InjectionError>;

    fn button_down(&self, button: MouseButton) -> Result<(), InjectionError>;

    fn button_up(&self, button: MouseButton) -> Result<(), InjectionError>;

    /// Scrolls the wheel; positive `dy` scrolls away from the user.
    fn scroll(&self, dx: i16, dy: i16) -> Result<(), InjectionError>;

    fn key_down(&self, raw_code: u16) -> Result<(), InjectionError>;

    fn key_up(&self, raw_code: u16) -> Result<(), InjectionError>;
}

/// The receive-side dispatcher.
pub struct RemoteInputApplier {
    sink: Arc<dyn InputSink>,
    tracker: Option<PointerTracker>,
    last_sent: Option<Point>,
}

impl RemoteInputApplier {
    pub fn new(sink: Arc<dyn InputSink>) -> Self {
        Self {
            sink,
            tracker: None,
            last_sent: None,
        }
    }

    /// Starts a controlled period: the pointer is placed at `start` on
    /// `display` and subsequent moves are tracked from there.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError`] if the initial placement fails; tracking is
    /// started regardless.
    pub fn enter(&mut self, display: Display, start: Point) -> Result<(), InjectionError> {
        let tracker = PointerTracker::new(display, start);
        let position = tracker.position();
        self.tracker = Some(tracker);
        self.last_sent = None;
        self.inject_move(position)
    }

    /// Ends the controlled period.
    pub fn leave(&mut self) {
        self.tracker = None;
        self.last_sent = None;
    }

    pub fn is_engaged(&self) -> bool {
        self.tracker.is_some()
    }

    /// Tracked pointer position, if a controlled period is in progress.
    pub fn position(&self) -> Option<Point> {
        self.tracker.as_ref().map(PointerTracker::position)
    }

    /// Replays one event through the sink.
    ///
    /// # Errors
    ///
    /// Returns [`InjectionError::NotInitialized`] for pointer moves outside a
    /// controlled period, or whatever the sink reports.
    pub fn apply(&mut self, event: &InputEvent) -> Result<(), InjectionError> {
        match event {
            InputEvent::MouseMove(m) => {
                let tracker = self.tracker.as_mut().ok_or(InjectionError::NotInitialized)?;
                let position = tracker.apply(m.delta());
                self.inject_move(position)
            }
            InputEvent::MouseDown(m) => self.sink.button_down(m.button),
            InputEvent::MouseUp(m) => self.sink.button_up(m.button),
            InputEvent::MouseWheel(m) => self.sink.scroll(m.dx, m.dy),
            InputEvent::KeyDown(k) => self.sink.key_down(k.raw_code),
            InputEvent::KeyUp(k) => self.sink.key_up(k.raw_code),
        }
    }

    /// Injects `position` unless it equals the last injected position
    /// (a pointer pinned against the display edge).
    fn inject_move(&mut self, position: Point) -> Result<(), InjectionError> {
        if self.last_sent == Some(position) {
            return Ok(());
        }
        self.sink.move_to(position.x, position.y)?;
        self.last_sent = Some(position);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
