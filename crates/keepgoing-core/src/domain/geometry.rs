//! Screen geometry: points, deltas, displays, and handoff directions.
//!
//! All coordinates live in the local virtual screen space reported by the
//! operating system.  The primary display is conventionally the first entry
//! of an enumerated display list and is anchored at (0, 0).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An absolute pointer position in virtual screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns the relative movement from `previous` to `self`.
    pub fn delta_from(self, previous: Point) -> Delta {
        Delta::new(self.x - previous.x, self.y - previous.y)
    }

    /// Returns this point moved by `delta`, saturating at the `i32` range.
    pub fn offset(self, delta: Delta) -> Point {
        Point::new(self.x.saturating_add(delta.dx), self.y.saturating_add(delta.dy))
    }
}

/// A relative pointer movement in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Delta {
    pub dx: i32,
    pub dy: i32,
}

impl Delta {
    pub const ZERO: Delta = Delta { dx: 0, dy: 0 };

    pub const fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }

    pub fn is_zero(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Pixel dimensions of a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

/// One physical display as reported by the display enumerator.
///
/// Snapshots are immutable: a re-enumeration replaces the whole list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Display {
    /// OS-assigned display index.
    pub id: u32,
    /// X coordinate of the top-left corner in virtual space.
    pub x: i32,
    /// Y coordinate of the top-left corner in virtual space.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Display {
    pub const fn new(id: u32, x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            id,
            x,
            y,
            width,
            height,
        }
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Returns the X coordinate one past the right edge.
    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width as i32)
    }

    /// Returns the Y coordinate one past the bottom edge.
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height as i32)
    }

    /// Returns `true` if `point` lies within `[min, min + dimension]` on both axes.
    pub fn contains(&self, point: Point) -> bool {
        (self.x..=self.right()).contains(&point.x) && (self.y..=self.bottom()).contains(&point.y)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x + (self.width / 2) as i32,
            self.y + (self.height / 2) as i32,
        )
    }

    /// Clamps `point` into `[min, min + dimension]` per axis.
    ///
    /// The upper bound is inclusive of the far edge, so a pointer driven hard
    /// to the right of a 1920-wide display at x=0 settles on x=1920.
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(self.x, self.right()),
            point.y.clamp(self.y, self.bottom()),
        )
    }

    /// Returns the point one pixel inside the edge of this display that
    /// faces `direction`, centred along the other axis.
    ///
    /// Used to park the pointer after a handoff so the next sample does not
    /// immediately sit on the boundary.
    pub fn entry_point(&self, direction: Direction) -> Point {
        let center = self.center();
        match direction {
            Direction::Left => Point::new(self.x + 1, center.y),
            Direction::Right => Point::new(self.right() - 2, center.y),
            Direction::Top => Point::new(center.x, self.y + 1),
            Direction::Bottom => Point::new(center.x, self.bottom() - 2),
        }
    }
}

/// Which edge of the local virtual screen borders the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Left,
    Right,
    Top,
    Bottom,
}

impl Direction {
    /// Returns the edge the peer sees when this side uses `self`.
    pub fn mirrored(self) -> Direction {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
            Direction::Top => Direction::Bottom,
            Direction::Bottom => Direction::Top,
        }
    }

    /// `true` for Left/Right, whose extent is measured along the X axis.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Direction::Left | Direction::Right)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Top => "top",
            Direction::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing a [`Direction`] from text fails.
#[derive(Debug, Error, PartialEq)]
#[error("unknown direction {0:?}; expected left, right, top or bottom")]
pub struct ParseDirectionError(pub String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            "top" => Ok(Direction::Top),
            "bottom" => Ok(Direction::Bottom),
            _ => Err(ParseDirectionError(s.to_string())),
        }
    }
}

// ── Display list helpers ──────────────────────────────────────────────────────

/// Sums display widths (Left/Right) or heights (Top/Bottom).
pub fn virtual_extent(displays: &[Display], direction: Direction) -> i32 {
    let total: u64 = if direction.is_horizontal() {
        displays.iter().map(|d| u64::from(d.width)).sum()
    } else {
        displays.iter().map(|d| u64::from(d.height)).sum()
    };
    i32::try_from(total).unwrap_or(i32::MAX)
}

/// Returns the primary display, which is always the first enumerated entry.
pub fn primary_display(displays: &[Display]) -> Option<&Display> {
    displays.first()
}

/// Returns the display whose outer edge forms the boundary facing `direction`.
///
/// Bottom crossings are measured against the primary display's height, so the
/// primary is returned for [`Direction::Bottom`].
pub fn edge_display(displays: &[Display], direction: Direction) -> Option<&Display> {
    match direction {
        Direction::Left => displays.iter().min_by_key(|d| d.x),
        Direction::Right => displays.iter().max_by_key(|d| d.right()),
        Direction::Top => displays.iter().min_by_key(|d| d.y),
        Direction::Bottom => primary_display(displays),
    }
}

/// Returns the display containing `point`, falling back to the primary.
pub fn work_display(displays: &[Display], point: Point) -> Option<&Display> {
    displays
        .iter()
        .find(|d| d.contains(point))
        .or_else(|| primary_display(displays))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
