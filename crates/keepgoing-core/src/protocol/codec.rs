//! Binary codec for KeepGoing frames.
//!
//! Wire format:
//! ```text
//! [version:1][msg_type:1][reserved:2][payload_len:4][payload:N]
//! ```
//! Total header size: 8 bytes. All multi-byte integers are big-endian.
//!
//! Payloads:
//!
//! | Type        | Layout                                                  |
//! |-------------|---------------------------------------------------------|
//! | Control     | `token:u8`                                              |
//! | Settings    | `mode:u8` `direction:u8`                                |
//! | DisplayInfo | `id:u32` `x:i32` `y:i32` `width:u32` `height:u32`       |
//! | MouseMove   | `dx:i16` `dy:i16`                                       |
//! | MouseDown/Up| `kind:u8` `x:i16` `y:i16` `button:u8`                   |
//! | MouseWheel  | `kind:u8` `dx:i16` `dy:i16` `button:u8` (always 0)      |
//! | KeyDown/Up  | `kind:u8` `raw_code:u16`                                |
//!
//! The `kind` byte inside button, wheel and key payloads repeats the header's
//! message type and must agree with it.

use thiserror::Error;
use tracing::trace;

use crate::domain::geometry::{Direction, Display};
use crate::domain::settings::{Mode, Settings};
use crate::protocol::messages::{
    ControlToken, InputEvent, KeyMessage, MessageType, MouseButton, MouseButtonMessage,
    MouseMoveMessage, MouseWheelMessage, PeerMessage, HEADER_SIZE, MAX_PAYLOAD_LEN,
    PROTOCOL_VERSION,
};

/// Errors that can occur during message encoding or decoding.
#[derive(Debug, Error, PartialEq)]
pub enum ProtocolError {
    /// The byte slice is shorter than the minimum required length.
    #[error("insufficient data: need at least {needed} bytes, got {available}")]
    InsufficientData { needed: usize, available: usize },

    /// The message type byte in the header is not a recognized value.
    #[error("unknown message type: 0x{0:02X}")]
    UnknownMessageType(u8),

    /// The protocol version in the header is not supported.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u8),

    /// The payload could not be parsed (field value out of range, kind mismatch, etc.).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The encoded payload length field does not match the actual data available.
    #[error("payload length mismatch: header says {declared}, available is {available}")]
    PayloadLengthMismatch { declared: usize, available: usize },

    /// The header declares a payload no valid message can have.
    #[error("frame too large: header says {declared} bytes, limit is {limit}")]
    FrameTooLarge { declared: usize, limit: usize },
}

impl ProtocolError {
    /// `true` when the stream can no longer be split into frames reliably.
    pub fn is_desync(&self) -> bool {
        matches!(self, ProtocolError::FrameTooLarge { .. })
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Encodes a [`PeerMessage`] into a byte vector including the 8-byte header.
///
/// # Examples
///
/// ```rust
/// use keepgoing_core::protocol::{decode_message, encode_message};
/// use keepgoing_core::protocol::messages::{ControlToken, PeerMessage};
///
/// let msg = PeerMessage::Control(ControlToken::Ready);
/// let bytes = encode_message(&msg);
/// let (decoded, consumed) = decode_message(&bytes).unwrap();
/// assert_eq!(decoded, msg);
/// assert_eq!(consumed, bytes.len());
/// ```
pub fn encode_message(msg: &PeerMessage) -> Vec<u8> {
    let payload = encode_payload(msg);
    let payload_len = payload.len() as u32;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());

    // Header: version (1) + msg_type (1) + reserved (2) + payload_len (4) = 8 bytes
    buf.push(PROTOCOL_VERSION);
    buf.push(msg.message_type() as u8);
    buf.push(0x00); // reserved
    buf.push(0x00); // reserved
    buf.extend_from_slice(&payload_len.to_be_bytes());

    buf.extend_from_slice(&payload);
    buf
}

/// Returns the total frame length (header + payload) declared by the header
/// at the start of `bytes`, or `None` if the header is not complete yet.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the declared payload exceeds
/// [`MAX_PAYLOAD_LEN`].
pub fn frame_len(bytes: &[u8]) -> Result<Option<usize>, ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Ok(None);
    }
    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::FrameTooLarge {
            declared: payload_len,
            limit: MAX_PAYLOAD_LEN,
        });
    }
    Ok(Some(HEADER_SIZE + payload_len))
}

/// Decodes one [`PeerMessage`] from the beginning of `bytes`.
///
/// Returns the decoded message and the total number of bytes consumed
/// (header + payload), so the caller can advance their read cursor.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the bytes are malformed or incomplete.
pub fn decode_message(bytes: &[u8]) -> Result<(PeerMessage, usize), ProtocolError> {
    if bytes.len() < HEADER_SIZE {
        return Err(ProtocolError::InsufficientData {
            needed: HEADER_SIZE,
            available: bytes.len(),
        });
    }

    let version = bytes[0];
    if version != PROTOCOL_VERSION {
        return Err(ProtocolError::UnsupportedVersion(version));
    }

    let msg_type_byte = bytes[1];
    let msg_type = MessageType::try_from(msg_type_byte)
        .map_err(|_| ProtocolError::UnknownMessageType(msg_type_byte))?;

    // bytes[2..4] are reserved – ignored on decode

    let payload_len = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    if payload_len > MAX_PAYLOAD_LEN {
        return Err(ProtocolError::FrameTooLarge {
            declared: payload_len,
            limit: MAX_PAYLOAD_LEN,
        });
    }

    let total_needed = HEADER_SIZE + payload_len;
    if bytes.len() < total_needed {
        return Err(ProtocolError::PayloadLengthMismatch {
            declared: payload_len,
            available: bytes.len() - HEADER_SIZE,
        });
    }

    let payload = &bytes[HEADER_SIZE..total_needed];
    let msg = decode_payload(msg_type, payload)?;
    Ok((msg, total_needed))
}

// ── Frame reassembly ──────────────────────────────────────────────────────────

/// Accumulates bytes from a stream and yields complete frames.
///
/// Socket reads may return half a header, several frames at once, or a frame
/// split across many reads.  Feed every chunk to [`extend`](Self::extend) and
/// drain with [`next_frame`](Self::next_frame) until it returns `None`.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Bytes received but not yet consumed as a complete frame.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Pops the next complete frame.
    ///
    /// - `None` – more bytes are needed.
    /// - `Some(Ok(msg))` – a frame was decoded and consumed.
    /// - `Some(Err(e))` – a frame was consumed but its contents were invalid;
    ///   the buffer stays aligned on the next frame, so the caller may log and
    ///   keep going.  If [`ProtocolError::is_desync`] holds, the buffer was
    ///   discarded because frame boundaries can no longer be trusted.
    pub fn next_frame(&mut self) -> Option<Result<PeerMessage, ProtocolError>> {
        let total = match frame_len(&self.buf) {
            Ok(Some(total)) if self.buf.len() >= total => total,
            Ok(_) => return None,
            Err(e) => {
                self.buf.clear();
                return Some(Err(e));
            }
        };
        let result = decode_message(&self.buf[..total]).map(|(msg, _)| msg);
        self.buf.drain(..total);
        trace!(consumed = total, remaining = self.buf.len(), "frame consumed");
        Some(result)
    }
}

// ── Payload encoding ──────────────────────────────────────────────────────────

fn encode_payload(msg: &PeerMessage) -> Vec<u8> {
    let mut buf = Vec::new();
    match msg {
        PeerMessage::Control(token) => buf.push(*token as u8),
        PeerMessage::Settings(s) => encode_settings(&mut buf, s),
        PeerMessage::DisplayInfo(d) => encode_display(&mut buf, d),
        PeerMessage::Input(event) => encode_input(&mut buf, event),
    }
    buf
}

fn encode_settings(buf: &mut Vec<u8>, s: &Settings) {
    buf.push(mode_to_wire(s.mode));
    buf.push(direction_to_wire(s.direction));
}

fn encode_display(buf: &mut Vec<u8>, d: &Display) {
    buf.extend_from_slice(&d.id.to_be_bytes());
    buf.extend_from_slice(&d.x.to_be_bytes());
    buf.extend_from_slice(&d.y.to_be_bytes());
    buf.extend_from_slice(&d.width.to_be_bytes());
    buf.extend_from_slice(&d.height.to_be_bytes());
}

fn encode_input(buf: &mut Vec<u8>, event: &InputEvent) {
    let kind = event.message_type() as u8;
    match event {
        InputEvent::MouseMove(m) => {
            buf.extend_from_slice(&m.dx.to_be_bytes());
            buf.extend_from_slice(&m.dy.to_be_bytes());
        }
        InputEvent::MouseDown(m) | InputEvent::MouseUp(m) => {
            buf.push(kind);
            buf.extend_from_slice(&m.x.to_be_bytes());
            buf.extend_from_slice(&m.y.to_be_bytes());
            buf.push(m.button as u8);
        }
        InputEvent::MouseWheel(m) => {
            buf.push(kind);
            buf.extend_from_slice(&m.dx.to_be_bytes());
            buf.extend_from_slice(&m.dy.to_be_bytes());
            buf.push(0x00); // no button
        }
        InputEvent::KeyDown(m) | InputEvent::KeyUp(m) => {
            buf.push(kind);
            buf.extend_from_slice(&m.raw_code.to_be_bytes());
        }
    }
}

// ── Payload decoding ──────────────────────────────────────────────────────────

fn decode_payload(msg_type: MessageType, p: &[u8]) -> Result<PeerMessage, ProtocolError> {
    match msg_type {
        MessageType::Control => {
            require_len(p, 1, "Control")?;
            let token = ControlToken::try_from(p[0]).map_err(|_| {
                ProtocolError::MalformedPayload(format!("unknown control token: {}", p[0]))
            })?;
            Ok(PeerMessage::Control(token))
        }
        MessageType::Settings => decode_settings(p).map(PeerMessage::Settings),
        MessageType::DisplayInfo => decode_display(p).map(PeerMessage::DisplayInfo),
        MessageType::MouseMove => {
            // 2+2 = 4
            require_len(p, 4, "MouseMove")?;
            let dx = read_i16(p, 0);
            let dy = read_i16(p, 2);
            Ok(InputEvent::MouseMove(MouseMoveMessage { dx, dy }).into())
        }
        MessageType::MouseDown => {
            decode_mouse_button(p, msg_type).map(|m| InputEvent::MouseDown(m).into())
        }
        MessageType::MouseUp => {
            decode_mouse_button(p, msg_type).map(|m| InputEvent::MouseUp(m).into())
        }
        MessageType::MouseWheel => {
            // 1+2+2+1 = 6
            require_len(p, 6, "MouseWheel")?;
            require_kind(p, msg_type)?;
            let dx = read_i16(p, 1);
            let dy = read_i16(p, 3);
            Ok(InputEvent::MouseWheel(MouseWheelMessage { dx, dy }).into())
        }
        MessageType::KeyDown => decode_key(p, msg_type).map(|m| InputEvent::KeyDown(m).into()),
        MessageType::KeyUp => decode_key(p, msg_type).map(|m| InputEvent::KeyUp(m).into()),
    }
}

fn decode_settings(p: &[u8]) -> Result<Settings, ProtocolError> {
    require_len(p, 2, "Settings")?;
    let mode = mode_from_wire(p[0])
        .ok_or_else(|| ProtocolError::MalformedPayload(format!("unknown mode: {}", p[0])))?;
    let direction = direction_from_wire(p[1])
        .ok_or_else(|| ProtocolError::MalformedPayload(format!("unknown direction: {}", p[1])))?;
    Ok(Settings { mode, direction })
}

fn decode_display(p: &[u8]) -> Result<Display, ProtocolError> {
    // 4+4+4+4+4 = 20
    require_len(p, 20, "DisplayInfo")?;
    Ok(Display {
        id: read_u32(p, 0),
        x: read_u32(p, 4) as i32,
        y: read_u32(p, 8) as i32,
        width: read_u32(p, 12),
        height: read_u32(p, 16),
    })
}

fn decode_mouse_button(
    p: &[u8],
    msg_type: MessageType,
) -> Result<MouseButtonMessage, ProtocolError> {
    // 1+2+2+1 = 6
    require_len(p, 6, "MouseButton")?;
    require_kind(p, msg_type)?;
    let x = read_i16(p, 1);
    let y = read_i16(p, 3);
    let button = MouseButton::try_from(p[5]).map_err(|_| {
        ProtocolError::MalformedPayload(format!("unknown mouse button: {}", p[5]))
    })?;
    Ok(MouseButtonMessage { button, x, y })
}

fn decode_key(p: &[u8], msg_type: MessageType) -> Result<KeyMessage, ProtocolError> {
    // 1+2 = 3
    require_len(p, 3, "Key")?;
    require_kind(p, msg_type)?;
    Ok(KeyMessage {
        raw_code: u16::from_be_bytes([p[1], p[2]]),
    })
}

// ── Enum wire codes ───────────────────────────────────────────────────────────

fn mode_to_wire(mode: Mode) -> u8 {
    match mode {
        Mode::Host => 0x01,
        Mode::Peer => 0x02,
    }
}

fn mode_from_wire(b: u8) -> Option<Mode> {
    match b {
        0x01 => Some(Mode::Host),
        0x02 => Some(Mode::Peer),
        _ => None,
    }
}

fn direction_to_wire(direction: Direction) -> u8 {
    match direction {
        Direction::Left => 0x01,
        Direction::Right => 0x02,
        Direction::Top => 0x03,
        Direction::Bottom => 0x04,
    }
}

fn direction_from_wire(b: u8) -> Option<Direction> {
    match b {
        0x01 => Some(Direction::Left),
        0x02 => Some(Direction::Right),
        0x03 => Some(Direction::Top),
        0x04 => Some(Direction::Bottom),
        _ => None,
    }
}

// ── Utility helpers ───────────────────────────────────────────────────────────

fn require_len(buf: &[u8], needed: usize, context: &str) -> Result<(), ProtocolError> {
    if buf.len() < needed {
        Err(ProtocolError::MalformedPayload(format!(
            "{context}: need {needed} bytes, got {}",
            buf.len()
        )))
    } else {
        Ok(())
    }
}

fn require_kind(p: &[u8], msg_type: MessageType) -> Result<(), ProtocolError> {
    if p[0] != msg_type as u8 {
        return Err(ProtocolError::MalformedPayload(format!(
            "event kind 0x{:02X} does not match frame type {msg_type:?}",
            p[0]
        )));
    }
    Ok(())
}

/// Callers must have checked the length with [`require_len`].
fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// Callers must have checked the length with [`require_len`].
fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn round_trip(msg: &PeerMessage) -> PeerMessage {
        let bytes = encode_message(msg);
        let (decoded, consumed) = decode_message(&bytes).expect("decode failed");
        assert_eq!(consumed, bytes.len());
        decoded
    }

    // ── Control / session messages ────────────────────────────────────────────

    #[test]
    fn test_control_tokens_round_trip() {
        for token in [
            ControlToken::Ready,
            ControlToken::ReadyAck,
            ControlToken::ReturnControl,
        ] {
            let msg = PeerMessage::Control(token);
            assert_eq!(round_trip(&msg), msg);
        }
    }

    #[test]
    fn test_settings_round_trip_all_directions() {
        for direction in [
            Direction::Left,
            Direction::Right,
            Direction::Top,
            Direction::Bottom,
        ] {
            let msg = PeerMessage::Settings(Settings::new(Mode::Host, direction));
            assert_eq!(round_trip(&msg), msg);
        }
    }

    #[test]
    fn test_display_info_negative_origin_round_trip() {
        let msg = PeerMessage::DisplayInfo(Display::new(2, -2560, -200, 2560, 1440));
        assert_eq!(round_trip(&msg), msg);
    }

    // ── Input events ──────────────────────────────────────────────────────────

    #[test]
    fn test_mouse_move_payload_is_two_big_endian_i16() {
        // Arrange
        let msg: PeerMessage = InputEvent::MouseMove(MouseMoveMessage { dx: -2, dy: 300 }).into();

        // Act
        let bytes = encode_message(&msg);

        // Assert
        assert_eq!(bytes.len(), HEADER_SIZE + 4);
        assert_eq!(&bytes[HEADER_SIZE..], &[0xFF, 0xFE, 0x01, 0x2C]);
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_mouse_button_payload_layout() {
        // Arrange
        let msg: PeerMessage = InputEvent::MouseDown(MouseButtonMessage {
            button: MouseButton::Right,
            x: 10,
            y: -1,
        })
        .into();

        // Act
        let bytes = encode_message(&msg);

        // Assert
        assert_eq!(
            &bytes[HEADER_SIZE..],
            &[0x11, 0x00, 0x0A, 0xFF, 0xFF, 0x02]
        );
        assert_eq!(round_trip(&msg), msg);
    }

    #[test]
    fn test_mouse_up_and_wheel_round_trip() {
        let up: PeerMessage = InputEvent::MouseUp(MouseButtonMessage {
            button: MouseButton::Middle,
            x: 0,
            y: 0,
        })
        .into();
        let wheel: PeerMessage = InputEvent::MouseWheel(MouseWheelMessage { dx: -1, dy: 3 }).into();
        assert_eq!(round_trip(&up), up);
        assert_eq!(round_trip(&wheel), wheel);
    }

    #[test]
    fn test_key_payload_layout() {
        let msg: PeerMessage = InputEvent::KeyUp(KeyMessage { raw_code: 0x1234 }).into();
        let bytes = encode_message(&msg);
        assert_eq!(&bytes[HEADER_SIZE..], &[0x15, 0x12, 0x34]);
        assert_eq!(round_trip(&msg), msg);
    }

    // ── Error conditions ──────────────────────────────────────────────────────

    #[test]
    fn test_decode_empty_bytes_returns_insufficient_data() {
        let result = decode_message(&[]);
        assert!(matches!(result, Err(ProtocolError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_truncated_header_returns_insufficient_data() {
        let result = decode_message(&[0x01, 0x10]);
        assert!(matches!(result, Err(ProtocolError::InsufficientData { .. })));
    }

    #[test]
    fn test_decode_unknown_message_type_returns_error() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0] = PROTOCOL_VERSION;
        bytes[1] = 0xFF;
        let result = decode_message(&bytes);
        assert!(matches!(result, Err(ProtocolError::UnknownMessageType(0xFF))));
    }

    #[test]
    fn test_decode_wrong_version_returns_error() {
        let mut bytes = encode_message(&PeerMessage::Control(ControlToken::Ready));
        bytes[0] = 0x99;
        let result = decode_message(&bytes);
        assert!(matches!(result, Err(ProtocolError::UnsupportedVersion(0x99))));
    }

    #[test]
    fn test_decode_payload_length_exceeds_available_returns_error() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0] = PROTOCOL_VERSION;
        bytes[1] = MessageType::DisplayInfo as u8;
        bytes[4..8].copy_from_slice(&20u32.to_be_bytes());
        let result = decode_message(&bytes);
        assert!(matches!(
            result,
            Err(ProtocolError::PayloadLengthMismatch { declared: 20, available: 0 })
        ));
    }

    #[test]
    fn test_decode_oversized_length_is_desync() {
        let mut bytes = vec![0u8; HEADER_SIZE];
        bytes[0] = PROTOCOL_VERSION;
        bytes[1] = MessageType::MouseMove as u8;
        bytes[4..8].copy_from_slice(&u32::MAX.to_be_bytes());
        let err = decode_message(&bytes).unwrap_err();
        assert!(err.is_desync());
    }

    #[test]
    fn test_decode_unknown_control_token_is_malformed() {
        let mut bytes = encode_message(&PeerMessage::Control(ControlToken::Ready));
        bytes[HEADER_SIZE] = 0x7F;
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_decode_kind_byte_mismatch_is_malformed() {
        // Arrange – a KeyDown frame whose inner kind byte claims KeyUp
        let mut bytes = encode_message(&InputEvent::KeyDown(KeyMessage { raw_code: 4 }).into());
        bytes[HEADER_SIZE] = MessageType::KeyUp as u8;

        // Act
        let result = decode_message(&bytes);

        // Assert
        assert!(matches!(result, Err(ProtocolError::MalformedPayload(_))));
    }

    #[test]
    fn test_decode_short_payload_is_malformed() {
        let mut bytes = vec![PROTOCOL_VERSION, MessageType::MouseMove as u8, 0, 0];
        bytes.extend_from_slice(&2u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x01]);
        assert!(matches!(
            decode_message(&bytes),
            Err(ProtocolError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_header_layout() {
        let bytes = encode_message(&PeerMessage::Control(ControlToken::ReturnControl));
        assert_eq!(bytes[0], PROTOCOL_VERSION);
        assert_eq!(bytes[1], MessageType::Control as u8);
        assert_eq!(&bytes[2..4], &[0, 0]);
        assert_eq!(u32::from_be_bytes(bytes[4..8].try_into().unwrap()), 1);
    }

    // ── FrameBuffer ───────────────────────────────────────────────────────────

    #[test]
    fn test_frame_buffer_waits_for_complete_frame() {
        // Arrange
        let bytes = encode_message(&PeerMessage::DisplayInfo(Display::new(0, 0, 0, 1920, 1080)));
        let mut frames = FrameBuffer::new();

        // Act / Assert – byte by byte, nothing until the last byte
        for (i, b) in bytes.iter().enumerate() {
            frames.extend(std::slice::from_ref(b));
            let next = frames.next_frame();
            if i + 1 < bytes.len() {
                assert!(next.is_none(), "frame yielded early at byte {i}");
            } else {
                assert!(matches!(next, Some(Ok(PeerMessage::DisplayInfo(_)))));
            }
        }
        assert_eq!(frames.buffered(), 0);
    }

    #[test]
    fn test_frame_buffer_yields_multiple_frames_from_one_chunk() {
        // Arrange
        let a = PeerMessage::Control(ControlToken::Ready);
        let b: PeerMessage = InputEvent::KeyDown(KeyMessage { raw_code: 1 }).into();
        let mut chunk = encode_message(&a);
        chunk.extend(encode_message(&b));
        chunk.extend(&encode_message(&a)[..3]);
        let mut frames = FrameBuffer::new();

        // Act
        frames.extend(&chunk);

        // Assert
        assert_eq!(frames.next_frame(), Some(Ok(a)));
        assert_eq!(frames.next_frame(), Some(Ok(b)));
        assert_eq!(frames.next_frame(), None);
        assert_eq!(frames.buffered(), 3);
    }

    #[test]
    fn test_frame_buffer_skips_malformed_frame_and_stays_aligned() {
        // Arrange
        let mut bad = encode_message(&PeerMessage::Control(ControlToken::Ready));
        bad[1] = 0xEE; // unknown type, length still valid
        let good = PeerMessage::Control(ControlToken::ReadyAck);
        let mut frames = FrameBuffer::new();
        frames.extend(&bad);
        frames.extend(&encode_message(&good));

        // Act
        let first = frames.next_frame();
        let second = frames.next_frame();

        // Assert
        assert_eq!(first, Some(Err(ProtocolError::UnknownMessageType(0xEE))));
        assert_eq!(second, Some(Ok(good)));
    }

    #[test]
    fn test_frame_buffer_discards_everything_on_desync() {
        let mut frames = FrameBuffer::new();
        frames.extend(&[PROTOCOL_VERSION, 0x10, 0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 1, 2, 3]);
        let result = frames.next_frame();
        assert!(matches!(result, Some(Err(ref e)) if e.is_desync()));
        assert_eq!(frames.buffered(), 0);
    }
}
