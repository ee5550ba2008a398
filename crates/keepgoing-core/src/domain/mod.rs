//! Domain entities for KeepGoing.
//!
//! Pure logic with no OS, socket, or runtime dependencies.  Everything here
//! can be unit-tested on any platform without a desktop session.
//!
//! - **`geometry`** – points, deltas, displays, and the four handoff directions.
//! - **`edge`** – the boundary-crossing predicate and the small monitor that
//!   remembers the previous pointer sample between polls.
//! - **`mapping`** – delta scaling between two displays of different size and
//!   the receive-side pointer tracker that clamps to the local display.
//! - **`batch`** – the pending-delta accumulator used by the event coalescer.
//! - **`settings`** – host/peer mode and the direction negotiation rule.

pub mod batch;
pub mod edge;
pub mod geometry;
pub mod mapping;
pub mod settings;
