//! In-memory input sink and cursor for unit tests and headless runs.
//!
//! # Why a mock sink?
//!
//! Real injection back-ends move the actual cursor and press real keys on
//! the machine running the tests.  [`MockInputSink`] replaces every OS call
//! with in-memory recording so assertions can inspect exactly what was
//! injected and in what order.
//!
//! [`SimulatedCursor`] stands in for the OS pointer.  Like a real desktop it
//! never lets the pointer leave the visible area, which is what makes a
//! pointer pushed against the outer edge stay pinned there.  A sink created
//! with [`MockInputSink::driving`] forwards its absolute moves to a cursor,
//! so a peer replaying remote input sees its own pointer move.
//!
//! # `should_fail` flag
//!
//! Set `should_fail = true` (or use [`MockInputSink::failing`]) to make every
//! call return [`InjectionError::Platform`].

use std::sync::{Arc, Mutex};

use keepgoing_core::{protocol::messages::MouseButton, Display, Point};

use crate::application::apply_input::{InjectionError, InputSink};
use crate::application::handoff::CursorController;

/// One call recorded by [`MockInputSink`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectedEvent {
    MoveTo(i32, i32),
    ButtonDown(MouseButton),
    ButtonUp(MouseButton),
    Scroll(i16, i16),
    KeyDown(u16),
    KeyUp(u16),
}

/// A sink that records calls without performing OS API calls.
#[derive(Default)]
pub struct MockInputSink {
    events: Mutex<Vec<InjectedEvent>>,
    cursor: Option<Arc<SimulatedCursor>>,
    /// When `true`, every method returns an `InjectionError::Platform`.
    pub should_fail: bool,
}

impl MockInputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::default()
        }
    }

    /// Creates a sink whose `move_to` calls also move `cursor`.
    pub fn driving(cursor: Arc<SimulatedCursor>) -> Self {
        Self {
            cursor: Some(cursor),
            ..Self::default()
        }
    }

    /// Returns a snapshot of every recorded call.
    pub fn events(&self) -> Vec<InjectedEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Returns only the recorded absolute moves.
    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                InjectedEvent::MoveTo(x, y) => Some((x, y)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: InjectedEvent) -> Result<(), InjectionError> {
        if self.should_fail {
            return Err(InjectionError::Platform("mock failure".into()));
        }
        self.events.lock().expect("lock poisoned").push(event);
        Ok(())
    }
}

impl InputSink for MockInputSink {
    fn move_to(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        self.record(InjectedEvent::MoveTo(x, y))?;
        if let Some(cursor) = &self.cursor {
            cursor.teleport_cursor(x, y)?;
        }
        Ok(())
    }

    fn button_down(&self, button: MouseButton) -> Result<(), InjectionError> {
        self.record(InjectedEvent::ButtonDown(button))
    }

    fn button_up(&self, button: MouseButton) -> Result<(), InjectionError> {
        self.record(InjectedEvent::ButtonUp(button))
    }

    fn scroll(&self, dx: i16, dy: i16) -> Result<(), InjectionError> {
        self.record(InjectedEvent::Scroll(dx, dy))
    }

    fn key_down(&self, raw_code: u16) -> Result<(), InjectionError> {
        self.record(InjectedEvent::KeyDown(raw_code))
    }

    fn key_up(&self, raw_code: u16) -> Result<(), InjectionError> {
        self.record(InjectedEvent::KeyUp(raw_code))
    }
}

// ── SimulatedCursor ───────────────────────────────────────────────────────────

/// An in-memory pointer confined to a display layout.
pub struct SimulatedCursor {
    displays: Vec<Display>,
    position: Mutex<Point>,
    teleports: Mutex<Vec<Point>>,
}

impl SimulatedCursor {
    /// Creates a cursor at the centre of the first display.
    pub fn new(displays: Vec<Display>) -> Self {
        let start = displays.first().map(Display::center).unwrap_or_default();
        Self {
            displays,
            position: Mutex::new(start),
            teleports: Mutex::new(Vec::new()),
        }
    }

    /// Moves the pointer as a user would, subject to the same confinement
    /// as a teleport but without being recorded as one.
    pub fn set_position(&self, point: Point) {
        *self.position.lock().expect("lock poisoned") = self.confine(point);
    }

    /// Returns every position passed to `teleport_cursor`, after confinement.
    pub fn teleports(&self) -> Vec<Point> {
        self.teleports.lock().expect("lock poisoned").clone()
    }

    /// Keeps `point` on a visible pixel: inside some display, or clamped to
    /// the bounding box of all displays.
    fn confine(&self, point: Point) -> Point {
        let visible = |d: &Display| {
            (d.x..d.right()).contains(&point.x) && (d.y..d.bottom()).contains(&point.y)
        };
        if self.displays.is_empty() || self.displays.iter().any(visible) {
            return point;
        }
        let min_x = self.displays.iter().map(|d| d.x).min().unwrap_or(0);
        let min_y = self.displays.iter().map(|d| d.y).min().unwrap_or(0);
        let max_x = self.displays.iter().map(|d| d.right() - 1).max().unwrap_or(0);
        let max_y = self.displays.iter().map(|d| d.bottom() - 1).max().unwrap_or(0);
        Point::new(point.x.clamp(min_x, max_x), point.y.clamp(min_y, max_y))
    }
}

impl CursorController for SimulatedCursor {
    fn teleport_cursor(&self, x: i32, y: i32) -> Result<(), InjectionError> {
        let confined = self.confine(Point::new(x, y));
        *self.position.lock().expect("lock poisoned") = confined;
        self.teleports.lock().expect("lock poisoned").push(confined);
        Ok(())
    }

    fn cursor_position(&self) -> Result<Point, InjectionError> {
        Ok(*self.position.lock().expect("lock poisoned"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fhd() -> Vec<Display> {
        vec![Display::new(0, 0, 0, 1920, 1080)]
    }

    #[test]
    fn test_simulated_cursor_starts_at_primary_center() {
        let cursor = SimulatedCursor::new(fhd());
        assert_eq!(cursor.cursor_position().unwrap(), Point::new(960, 540));
    }

    #[test]
    fn test_simulated_cursor_pins_to_last_visible_pixel() {
        // Arrange
        let cursor = SimulatedCursor::new(fhd());

        // Act
        cursor.set_position(Point::new(5000, -20));

        // Assert
        assert_eq!(cursor.cursor_position().unwrap(), Point::new(1919, 0));
    }

    #[test]
    fn test_simulated_cursor_records_teleports() {
        let cursor = SimulatedCursor::new(fhd());
        cursor.teleport_cursor(10, 20).unwrap();
        cursor.set_position(Point::new(30, 40));
        assert_eq!(cursor.teleports(), vec![Point::new(10, 20)]);
        assert_eq!(cursor.cursor_position().unwrap(), Point::new(30, 40));
    }

    #[test]
    fn test_driving_sink_moves_cursor() {
        // Arrange
        let cursor = Arc::new(SimulatedCursor::new(fhd()));
        let sink = MockInputSink::driving(Arc::clone(&cursor));

        // Act
        sink.move_to(1920, 700).unwrap();

        // Assert – the OS-style confinement keeps it on screen
        assert_eq!(sink.moves(), vec![(1920, 700)]);
        assert_eq!(cursor.cursor_position().unwrap(), Point::new(1919, 700));
    }

    #[test]
    fn test_failing_sink_records_nothing() {
        let sink = MockInputSink::failing();
        assert!(sink.key_down(4).is_err());
        assert!(sink.events().is_empty());
    }
}
