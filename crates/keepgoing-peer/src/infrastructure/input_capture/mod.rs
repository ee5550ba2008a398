//! Input capture infrastructure.
//!
//! While this machine drives the peer, every local keyboard and mouse event
//! must be intercepted before the OS delivers it, and forwarded to the
//! handoff controller instead.  Platform hooks (a low-level hook thread on
//! Windows, an event tap on macOS, an XInput grab on Linux) run on their own
//! thread, so events are pushed into an unbounded Tokio channel whose
//! `send` never blocks the hook callback.
//!
//! # Testability
//!
//! The [`InputSource`] trait allows unit tests to inject synthetic events
//! without OS hooks; see [`mock::MockInputSource`].

use keepgoing_core::MouseButton;
use tokio::sync::mpsc::UnboundedSender;

pub mod mock;

/// A raw input event produced by the input capture infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawInputEvent {
    /// The pointer moved to an absolute position in virtual screen coordinates.
    MouseMove { x: i32, y: i32 },
    /// A mouse button was pressed at (x, y).
    MouseButtonDown { button: MouseButton, x: i32, y: i32 },
    /// A mouse button was released at (x, y).
    MouseButtonUp { button: MouseButton, x: i32, y: i32 },
    /// The wheel was scrolled; positive `dy` is away from the user.
    MouseWheel { dx: i16, dy: i16 },
    /// A key was pressed; `raw_code` is the platform key code.
    KeyDown { raw_code: u16 },
    /// A key was released.
    KeyUp { raw_code: u16 },
}

/// Error type for input capture operations.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to install input hook: {0}")]
    HookInstallFailed(String),
    #[error("input hook is already installed")]
    AlreadyInstalled,
}

/// Trait abstracting a process-wide input listener.
///
/// While installed, captured events are delivered to `events` and are *not*
/// delivered to local applications.
pub trait InputSource: Send + Sync {
    /// Installs the listener; captured events are sent to `events`.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureError`] if the hook cannot be installed.
    fn install(&self, events: UnboundedSender<RawInputEvent>) -> Result<(), CaptureError>;

    /// Removes the listener and releases all OS resources.  Idempotent.
    fn uninstall(&self);
}
