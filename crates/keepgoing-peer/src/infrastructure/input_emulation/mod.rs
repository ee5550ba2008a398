//! Input injection back-ends.
//!
//! Implementations of [`InputSink`](crate::application::apply_input::InputSink)
//! and [`CursorController`](crate::application::handoff::CursorController).
//! The in-memory [`mock`] pair is always compiled and is what the headless
//! binary runs with.

pub mod mock;
