//! keepgoing-peer library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does a peer do? (for beginners)
//!
//! Two machines each run one `keepgoing` peer, one configured as Host and
//! one as Peer.  The Host listens for the Peer's TCP connection and tells it
//! which screen edge they share.  From then on the two are symmetric:
//!
//! 1. Each samples its own pointer and watches the shared edge.
//! 2. When the pointer is pushed across it, that side asks the other for a
//!    handoff (`Ready`), and they exchange primary display sizes.
//! 3. The initiating side captures its keyboard and mouse, scales pointer
//!    movement to the other display, batches it, and relays everything.
//! 4. The other side replays the events until its pointer is pushed back
//!    across the edge, which returns control (`ReturnControl`).

/// Application layer: handoff controller, coalescer, input replay, session.
pub mod application;

/// Infrastructure layer: input capability adapters, network, storage.
pub mod infrastructure;
