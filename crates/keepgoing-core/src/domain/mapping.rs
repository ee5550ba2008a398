//! Cross-display coordinate mapping.
//!
//! Deltas are scaled once, on the sending side, by the ratio between the
//! peer's and the local primary display.  The receiving side never rescales;
//! it only accumulates deltas onto its tracked pointer and clamps the result
//! to its own display.

use super::geometry::{Delta, Display, Point};

/// Returns `numerator / denominator`, or `1.0` when either side is zero.
fn ratio(numerator: u32, denominator: u32) -> f64 {
    if numerator == 0 || denominator == 0 {
        1.0
    } else {
        f64::from(numerator) / f64::from(denominator)
    }
}

/// Returns the (x, y) scale factors from `local` to `peer`.
pub fn scale_factors(local: &Display, peer: &Display) -> (f64, f64) {
    (ratio(peer.width, local.width), ratio(peer.height, local.height))
}

/// Maps a pointer delta from `local` display space into `peer` display space.
///
/// `round(dx * peer.W / local.W), round(dy * peer.H / local.H)`, with a
/// degenerate (zero-sized) display falling back to a scale of 1.0.
///
/// # Examples
///
/// ```rust
/// use keepgoing_core::domain::geometry::{Delta, Display};
/// use keepgoing_core::domain::mapping::map_delta;
///
/// let local = Display::new(0, 0, 0, 1920, 1080);
/// let peer = Display::new(0, 0, 0, 2560, 1440);
/// assert_eq!(map_delta(Delta::new(48, 0), &local, &peer), Delta::new(64, 0));
/// ```
pub fn map_delta(delta: Delta, local: &Display, peer: &Display) -> Delta {
    let (sx, sy) = scale_factors(local, peer);
    Delta::new(scale_axis(delta.dx, sx), scale_axis(delta.dy, sy))
}

fn scale_axis(value: i32, scale: f64) -> i32 {
    // `as` saturates on overflow and maps NaN to 0.
    (f64::from(value) * scale).round() as i32
}

/// Receive-side pointer state: applies inbound deltas and keeps the result
/// on the target display.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    display: Display,
    position: Point,
}

impl PointerTracker {
    /// Starts tracking at `start`, clamped onto `display`.
    pub fn new(display: Display, start: Point) -> Self {
        Self {
            display,
            position: display.clamp(start),
        }
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Applies `delta` and returns the clamped absolute position.
    pub fn apply(&mut self, delta: Delta) -> Point {
        self.position = self.display.clamp(self.position.offset(delta));
        self.position
    }

    /// Moves the tracked pointer to `point` (clamped), e.g. on handoff entry.
    pub fn reset(&mut self, point: Point) {
        self.position = self.display.clamp(point);
    }

    /// Replaces the target display, re-clamping the current position.
    pub fn set_display(&mut self, display: Display) {
        self.display = display;
        self.position = display.clamp(self.position);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn fhd() -> Display {
        Display::new(0, 0, 0, 1920, 1080)
    }

    fn qhd() -> Display {
        Display::new(0, 0, 0, 2560, 1440)
    }

    #[test]
    fn test_map_delta_scales_1080p_to_1440p() {
        assert_eq!(map_delta(Delta::new(48, 0), &fhd(), &qhd()), Delta::new(64, 0));
        assert_eq!(map_delta(Delta::new(10, 0), &fhd(), &qhd()), Delta::new(13, 0));
    }

    #[test]
    fn test_map_delta_scales_both_axes_and_keeps_sign() {
        assert_eq!(map_delta(Delta::new(-30, 27), &fhd(), &qhd()), Delta::new(-40, 36));
    }

    #[test]
    fn test_map_delta_downscales() {
        assert_eq!(map_delta(Delta::new(64, -36), &qhd(), &fhd()), Delta::new(48, -27));
    }

    #[test]
    fn test_map_delta_identity_for_equal_displays() {
        let d = Delta::new(-7, 123);
        assert_eq!(map_delta(d, &fhd(), &fhd()), d);
    }

    #[test]
    fn test_map_delta_zero_sized_local_display_falls_back_to_unit_scale() {
        // Arrange
        let degenerate = Display::new(0, 0, 0, 0, 0);

        // Act
        let mapped = map_delta(Delta::new(10, -4), &degenerate, &qhd());

        // Assert
        assert_eq!(mapped, Delta::new(10, -4));
    }

    #[test]
    fn test_map_delta_zero_sized_peer_display_falls_back_to_unit_scale() {
        let degenerate = Display::new(0, 0, 0, 0, 1440);
        let mapped = map_delta(Delta::new(10, 9), &fhd(), &degenerate);
        assert_eq!(mapped, Delta::new(10, 12));
    }

    #[test]
    fn test_tracker_clamps_large_delta_to_far_edge() {
        // Arrange
        let mut tracker = PointerTracker::new(fhd(), Point::new(1900, 500));

        // Act
        let pos = tracker.apply(Delta::new(100, 0));

        // Assert
        assert_eq!(pos, Point::new(1920, 500));
    }

    #[test]
    fn test_tracker_never_leaves_display_for_any_delta() {
        let display = Display::new(0, 100, 50, 800, 600);
        let mut tracker = PointerTracker::new(display, display.center());
        for delta in [
            Delta::new(i32::MAX, 0),
            Delta::new(i32::MIN, i32::MIN),
            Delta::new(5000, -5000),
            Delta::new(-1, 1),
        ] {
            let p = tracker.apply(delta);
            assert!(display.contains(p), "{p:?} escaped {display:?}");
        }
    }

    #[test]
    fn test_tracker_replay_is_deterministic() {
        // Arrange
        let deltas = [
            Delta::new(30, 4),
            Delta::new(-800, 2),
            Delta::new(3000, -3000),
            Delta::new(-12, 700),
        ];
        let run = || {
            let mut tracker = PointerTracker::new(fhd(), Point::new(960, 540));
            for d in deltas {
                tracker.apply(d);
            }
            tracker.position()
        };

        // Act
        let first = run();
        let second = run();

        // Assert
        assert_eq!(first, second);
        assert_eq!(first, Point::new(1908, 700));
    }

    #[test]
    fn test_tracker_set_display_reclamps_position() {
        let mut tracker = PointerTracker::new(qhd(), Point::new(2500, 1400));
        tracker.set_display(fhd());
        assert_eq!(tracker.position(), Point::new(1920, 1080));
    }
}
