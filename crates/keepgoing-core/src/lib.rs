//! # keepgoing-core
//!
//! Shared library for KeepGoing containing the screen geometry, the
//! edge-crossing predicate, coordinate mapping, the move accumulator, and the
//! wire codec.
//!
//! This crate is used by the peer application.  It has zero dependencies on
//! OS APIs, async runtimes, or network sockets.
//!
//! # Architecture overview (for beginners)
//!
//! KeepGoing shares one keyboard and mouse between two machines.  When the
//! pointer is pushed against the screen edge that borders the other machine,
//! input control is handed over: local events are captured, scaled to the
//! other machine's display, batched, and sent across a TCP connection where
//! they are replayed.  Pushing back across the shared edge returns control.
//!
//! - **`domain`** – Pure logic: displays, directions, the crossing predicate,
//!   delta scaling and clamping, and the pending-delta accumulator.
//!
//! - **`protocol`** – How bytes travel over the network.  Every message is a
//!   length-prefixed frame (8-byte header + payload), decoded back into a
//!   typed [`PeerMessage`] on the other end.

pub mod domain;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `keepgoing_core::Display` instead of `keepgoing_core::domain::geometry::Display`.
pub use domain::batch::PendingDelta;
pub use domain::edge::{detect, EdgeMonitor};
pub use domain::geometry::{
    edge_display, primary_display, virtual_extent, work_display, Delta, Direction, Display,
    Point, Size,
};
pub use domain::mapping::{map_delta, PointerTracker};
pub use domain::settings::{Mode, Settings};
pub use protocol::codec::{decode_message, encode_message, FrameBuffer, ProtocolError};
pub use protocol::messages::{ControlToken, InputEvent, MouseButton, PeerMessage};
