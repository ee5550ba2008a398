//! Move accumulator for time-sliced pointer batching.
//!
//! [`PendingDelta`] is plain data with no timer and no lock.  Exactly one
//! owner (the coalescer task) mutates it; the owner decides when a window
//! expires and calls [`PendingDelta::take`].

use super::geometry::Delta;

/// Sum of pointer deltas collected during the current window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDelta {
    sum: Delta,
    window_open: bool,
}

impl PendingDelta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `delta` to the running sum.
    ///
    /// Returns `true` if this call opened a new window, i.e. the caller must
    /// arm its timer.  Later deltas in the same window return `false`; the
    /// window is anchored to its first delta and never extended.
    pub fn add(&mut self, delta: Delta) -> bool {
        self.sum.dx = self.sum.dx.saturating_add(delta.dx);
        self.sum.dy = self.sum.dy.saturating_add(delta.dy);
        let opened = !self.window_open;
        self.window_open = true;
        opened
    }

    /// `true` between the first [`add`](Self::add) and the next [`take`](Self::take).
    pub fn is_window_open(&self) -> bool {
        self.window_open
    }

    /// Closes the window and returns the accumulated delta, or `None` when the
    /// batch nets out to zero.
    pub fn take(&mut self) -> Option<Delta> {
        let sum = std::mem::take(&mut self.sum);
        self.window_open = false;
        (!sum.is_zero()).then_some(sum)
    }
}
