//! All KeepGoing wire message types.
//!
//! Every frame carries one [`PeerMessage`].  Control tokens, settings and
//! display snapshots share the same framing as input events, so the receiver
//! never has to guess what a chunk of bytes is.

use serde::{Deserialize, Serialize};

use crate::domain::geometry::{Delta, Display};
use crate::domain::settings::Settings;

// ── Protocol constants ────────────────────────────────────────────────────────

/// Current protocol version byte.
pub const PROTOCOL_VERSION: u8 = 0x01;

/// Size of the frame header in bytes.
pub const HEADER_SIZE: usize = 8;

/// Largest payload a well-formed peer ever sends.
///
/// A header declaring more than this means the stream is out of sync.
pub const MAX_PAYLOAD_LEN: usize = 1024;

// ── Message type codes ────────────────────────────────────────────────────────

/// Frame kind byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum MessageType {
    // Session control (0x01–0x0F)
    Control = 0x01,
    Settings = 0x02,
    DisplayInfo = 0x03,
    // Input events (0x10–0x1F)
    MouseMove = 0x10,
    MouseDown = 0x11,
    MouseUp = 0x12,
    MouseWheel = 0x13,
    KeyDown = 0x14,
    KeyUp = 0x15,
}

impl TryFrom<u8> for MessageType {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MessageType::Control),
            0x02 => Ok(MessageType::Settings),
            0x03 => Ok(MessageType::DisplayInfo),
            0x10 => Ok(MessageType::MouseMove),
            0x11 => Ok(MessageType::MouseDown),
            0x12 => Ok(MessageType::MouseUp),
            0x13 => Ok(MessageType::MouseWheel),
            0x14 => Ok(MessageType::KeyDown),
            0x15 => Ok(MessageType::KeyUp),
            _ => Err(()),
        }
    }
}

// ── Control tokens ────────────────────────────────────────────────────────────

/// Payload of a [`MessageType::Control`] frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControlToken {
    /// "I detected a crossing and want to hand control to you."
    Ready = 0x01,
    /// "I accept; my display snapshot follows."
    ReadyAck = 0x02,
    /// "Give control back to your own input devices."
    ReturnControl = 0x03,
}

impl TryFrom<u8> for ControlToken {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(ControlToken::Ready),
            0x02 => Ok(ControlToken::ReadyAck),
            0x03 => Ok(ControlToken::ReturnControl),
            _ => Err(()),
        }
    }
}

// ── Input payloads ────────────────────────────────────────────────────────────

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0x01,
    Right = 0x02,
    Middle = 0x03,
}

impl TryFrom<u8> for MouseButton {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, ()> {
        match value {
            0x01 => Ok(MouseButton::Left),
            0x02 => Ok(MouseButton::Right),
            0x03 => Ok(MouseButton::Middle),
            _ => Err(()),
        }
    }
}

/// Coalesced relative pointer movement, already scaled to the receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseMoveMessage {
    pub dx: i16,
    pub dy: i16,
}

impl MouseMoveMessage {
    /// Builds a move from a wide delta, saturating each axis to `i16`.
    pub fn from_delta(delta: Delta) -> Self {
        Self {
            dx: saturate_i16(delta.dx),
            dy: saturate_i16(delta.dy),
        }
    }

    pub fn delta(&self) -> Delta {
        Delta::new(i32::from(self.dx), i32::from(self.dy))
    }
}

/// Button press or release.  `x`/`y` are the sender's pointer position at
/// the time of the click and are informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseButtonMessage {
    pub button: MouseButton,
    pub x: i16,
    pub y: i16,
}

/// Wheel rotation; positive `dy` scrolls away from the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MouseWheelMessage {
    pub dx: i16,
    pub dy: i16,
}

/// Key press or release carrying the sender's raw key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyMessage {
    pub raw_code: u16,
}

/// One relayed input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    MouseMove(MouseMoveMessage),
    MouseDown(MouseButtonMessage),
    MouseUp(MouseButtonMessage),
    MouseWheel(MouseWheelMessage),
    KeyDown(KeyMessage),
    KeyUp(KeyMessage),
}

impl InputEvent {
    /// Returns the [`MessageType`] discriminant for this event.
    pub fn message_type(&self) -> MessageType {
        match self {
            InputEvent::MouseMove(_) => MessageType::MouseMove,
            InputEvent::MouseDown(_) => MessageType::MouseDown,
            InputEvent::MouseUp(_) => MessageType::MouseUp,
            InputEvent::MouseWheel(_) => MessageType::MouseWheel,
            InputEvent::KeyDown(_) => MessageType::KeyDown,
            InputEvent::KeyUp(_) => MessageType::KeyUp,
        }
    }

    /// Buttons, wheel and keys are discrete; only pointer moves are batched.
    pub fn is_discrete(&self) -> bool {
        !matches!(self, InputEvent::MouseMove(_))
    }
}

// ── Top-level message enum ────────────────────────────────────────────────────

/// All valid KeepGoing messages, discriminated by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeerMessage {
    Control(ControlToken),
    Settings(Settings),
    /// The sender's primary display.
    DisplayInfo(Display),
    Input(InputEvent),
}

impl PeerMessage {
    /// Returns the [`MessageType`] discriminant for this message.
    pub fn message_type(&self) -> MessageType {
        match self {
            PeerMessage::Control(_) => MessageType::Control,
            PeerMessage::Settings(_) => MessageType::Settings,
            PeerMessage::DisplayInfo(_) => MessageType::DisplayInfo,
            PeerMessage::Input(event) => event.message_type(),
        }
    }
}

impl From<InputEvent> for PeerMessage {
    fn from(event: InputEvent) -> Self {
        PeerMessage::Input(event)
    }
}

impl From<ControlToken> for PeerMessage {
    fn from(token: ControlToken) -> Self {
        PeerMessage::Control(token)
    }
}

/// Clamps a wide coordinate to the `i16` range used on the wire.
pub fn saturate_i16(value: i32) -> i16 {
    value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_try_from_round_trips_every_variant() {
        for t in [
            MessageType::Control,
            MessageType::Settings,
            MessageType::DisplayInfo,
            MessageType::MouseMove,
            MessageType::MouseDown,
            MessageType::MouseUp,
            MessageType::MouseWheel,
            MessageType::KeyDown,
            MessageType::KeyUp,
        ] {
            assert_eq!(MessageType::try_from(t as u8), Ok(t));
        }
        assert!(MessageType::try_from(0x00).is_err());
        assert!(MessageType::try_from(0x16).is_err());
    }

    #[test]
    fn test_mouse_move_from_delta_saturates() {
        let m = MouseMoveMessage::from_delta(Delta::new(40_000, -40_000));
        assert_eq!(m, MouseMoveMessage { dx: i16::MAX, dy: i16::MIN });
    }

    #[test]
    fn test_only_mouse_move_is_not_discrete() {
        let mv = InputEvent::MouseMove(MouseMoveMessage { dx: 1, dy: 1 });
        let key = InputEvent::KeyDown(KeyMessage { raw_code: 30 });
        assert!(!mv.is_discrete());
        assert!(key.is_discrete());
    }

    #[test]
    fn test_peer_message_type_delegates_to_input_event() {
        let msg = PeerMessage::from(InputEvent::MouseWheel(MouseWheelMessage { dx: 0, dy: 1 }));
        assert_eq!(msg.message_type(), MessageType::MouseWheel);
        assert_eq!(
            PeerMessage::from(ControlToken::Ready).message_type(),
            MessageType::Control
        );
    }
}
