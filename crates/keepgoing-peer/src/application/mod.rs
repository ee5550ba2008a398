//! Application layer use cases for the peer.
//!
//! - **`handoff`** – The handoff state machine: edge polling, the
//!   Ready/ReadyAck/DisplayInfo handshake, capture and re-centring while
//!   Active, and replay while Controlled.
//!
//! - **`coalescer`** – Batches pointer deltas into fixed windows and defines
//!   the [`Transmitter`](coalescer::Transmitter) seam to the outbound queue.
//!
//! - **`apply_input`** – Replays events received from the peer through an
//!   [`InputSink`](apply_input::InputSink).
//!
//! - **`session`** – Settings negotiation and the per-connection event loop.

pub mod apply_input;
pub mod coalescer;
pub mod handoff;
pub mod session;
