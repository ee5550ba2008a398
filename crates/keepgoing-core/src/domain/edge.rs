//! Edge-crossing detection.
//!
//! A crossing fires when the pointer lands exactly on the peer-facing
//! boundary *and* the previous sample was strictly on the approaching side.
//! The second condition keeps a pointer that is pinned against the edge from
//! re-triggering on every poll.
//!
//! Boundaries per direction:
//!
//! | Direction | Axis | Boundary                      | Previous sample |
//! |-----------|------|-------------------------------|-----------------|
//! | Left      | X    | `0`                           | `> 0`           |
//! | Right     | X    | `total_extent - 1`            | `< boundary`    |
//! | Top       | Y    | `0`                           | `> 0`           |
//! | Bottom    | Y    | work display `height - 1`     | `< boundary`    |

use super::geometry::{virtual_extent, work_display, Direction, Display, Point, Size};

/// Returns `true` if the move from `previous` to `current` crosses the
/// boundary facing `direction`.
///
/// `display_size` is the size of the display the pointer is on; only its
/// height is consulted (for [`Direction::Bottom`]).  `total_extent` is the
/// summed width of all local displays (see [`virtual_extent`]); only
/// [`Direction::Right`] consults it.
pub fn detect(
    current: Point,
    previous: Point,
    direction: Direction,
    display_size: Size,
    total_extent: i32,
) -> bool {
    match direction {
        Direction::Left => current.x == 0 && previous.x > current.x,
        Direction::Right => {
            let boundary = total_extent - 1;
            current.x == boundary && previous.x < current.x
        }
        Direction::Top => current.y == 0 && previous.y > current.y,
        Direction::Bottom => {
            let boundary = display_size.height as i32 - 1;
            current.y == boundary && previous.y < current.y
        }
    }
}

/// Holds the previous pointer sample between polls.
#[derive(Debug, Clone)]
pub struct EdgeMonitor {
    direction: Direction,
    previous: Option<Point>,
}

impl EdgeMonitor {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            previous: None,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Records `point` and returns whether it completes a crossing.
    ///
    /// The first sample after construction or [`reset`](Self::reset) with no
    /// seed never fires, since there is no approach to compare against.
    pub fn sample(&mut self, point: Point, displays: &[Display]) -> bool {
        let previous = self.previous.replace(point);
        let Some(previous) = previous else {
            return false;
        };
        let Some(display) = work_display(displays, point) else {
            return false;
        };
        detect(
            point,
            previous,
            self.direction,
            display.size(),
            virtual_extent(displays, self.direction),
        )
    }

    /// Re-seeds the previous sample, e.g. after the pointer was warped.
    pub fn reset(&mut self, point: Point) {
        self.previous = Some(point);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const FHD: Size = Size {
        width: 1920,
        height: 1080,
    };

    fn single() -> Vec<Display> {
        vec![Display::new(0, 0, 0, 1920, 1080)]
    }

    #[test]
    fn test_right_edge_fires_when_approaching_last_column() {
        let fired = detect(
            Point::new(1919, 540),
            Point::new(1918, 540),
            Direction::Right,
            FHD,
            1920,
        );
        assert!(fired);
    }

    #[test]
    fn test_right_edge_does_not_fire_when_pinned_at_boundary() {
        let fired = detect(
            Point::new(1919, 540),
            Point::new(1919, 300),
            Direction::Right,
            FHD,
            1920,
        );
        assert!(!fired);
    }

    #[test]
    fn test_right_edge_does_not_fire_short_of_boundary() {
        assert!(!detect(
            Point::new(1918, 540),
            Point::new(1000, 540),
            Direction::Right,
            FHD,
            1920
        ));
    }

    #[test]
    fn test_right_edge_uses_total_extent_across_displays() {
        // The inner seam at x=1919 of a dual setup is not the boundary.
        assert!(!detect(
            Point::new(1919, 10),
            Point::new(1900, 10),
            Direction::Right,
            FHD,
            3840
        ));
        assert!(detect(
            Point::new(3839, 10),
            Point::new(3800, 10),
            Direction::Right,
            FHD,
            3840
        ));
    }

    #[test]
    fn test_left_edge_requires_previous_strictly_greater() {
        assert!(detect(Point::new(0, 5), Point::new(3, 5), Direction::Left, FHD, 1920));
        assert!(!detect(Point::new(0, 5), Point::new(0, 9), Direction::Left, FHD, 1920));
        assert!(!detect(Point::new(1, 5), Point::new(9, 5), Direction::Left, FHD, 1920));
    }

    #[test]
    fn test_top_edge_requires_previous_strictly_greater() {
        assert!(detect(Point::new(5, 0), Point::new(5, 1), Direction::Top, FHD, 1920));
        assert!(!detect(Point::new(5, 0), Point::new(6, 0), Direction::Top, FHD, 1920));
    }

    #[test]
    fn test_bottom_edge_uses_display_height() {
        assert!(detect(
            Point::new(5, 1079),
            Point::new(5, 1070),
            Direction::Bottom,
            FHD,
            1920
        ));
        assert!(!detect(
            Point::new(5, 1079),
            Point::new(5, 1079),
            Direction::Bottom,
            FHD,
            1920
        ));
    }

    #[test]
    fn test_detect_fires_iff_on_boundary_and_approaching() {
        // Exhaustive sweep around the right boundary of a 100-wide extent.
        let size = Size {
            width: 100,
            height: 100,
        };
        for current in 95..=100 {
            for previous in 95..=100 {
                let expected = current == 99 && previous < 99;
                let got = detect(
                    Point::new(current, 0),
                    Point::new(previous, 0),
                    Direction::Right,
                    size,
                    100,
                );
                assert_eq!(got, expected, "current={current} previous={previous}");
            }
        }
    }

    #[test]
    fn test_monitor_first_sample_never_fires() {
        // Arrange
        let mut monitor = EdgeMonitor::new(Direction::Right);

        // Act
        let fired = monitor.sample(Point::new(1919, 540), &single());

        // Assert
        assert!(!fired);
    }

    #[test]
    fn test_monitor_fires_once_then_stays_quiet_while_pinned() {
        // Arrange
        let displays = single();
        let mut monitor = EdgeMonitor::new(Direction::Right);
        monitor.sample(Point::new(1900, 540), &displays);

        // Act
        let first = monitor.sample(Point::new(1919, 540), &displays);
        let second = monitor.sample(Point::new(1919, 541), &displays);

        // Assert
        assert!(first);
        assert!(!second);
    }

    #[test]
    fn test_monitor_reset_seeds_previous_sample() {
        // Arrange
        let displays = single();
        let mut monitor = EdgeMonitor::new(Direction::Right);

        // Act
        monitor.reset(Point::new(1918, 540));
        let fired = monitor.sample(Point::new(1919, 540), &displays);

        // Assert
        assert!(fired);
    }
}
