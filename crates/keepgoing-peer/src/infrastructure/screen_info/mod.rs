//! Display enumeration.
//!
//! The handoff controller needs the local display list for two things: edge
//! detection (the work display's size and the summed extent along the
//! configured direction) and coordinate mapping (the primary display's size
//! is sent to the peer in a `DisplayInfo` message).
//!
//! # Ordering contract
//!
//! Every [`DisplayEnumerator`] returns the primary display first.  The rest
//! of the crate relies on this: `primary_display` is simply the first entry.
//!
//! # Mock implementation
//!
//! [`MockDisplayEnumerator`] is always compiled (not guarded by `#[cfg]`) so
//! tests and headless runs can use it without a physical display.

use keepgoing_core::Display;
use thiserror::Error;

/// Error type for display enumeration.
#[derive(Debug, Error)]
pub enum DisplayError {
    /// The platform reported zero displays.
    #[error("no displays found")]
    NoDisplays,
}

/// Trait for enumerating the displays attached to this machine.
pub trait DisplayEnumerator: Send + Sync {
    /// Returns the connected displays, primary first.
    ///
    /// # Errors
    ///
    /// Returns [`DisplayError`] if the OS query fails or finds nothing.
    fn list_displays(&self) -> Result<Vec<Display>, DisplayError>;
}

/// A mock enumerator that returns a fixed list of displays.
pub struct MockDisplayEnumerator {
    /// The fixed list this enumerator always returns.
    pub displays: Vec<Display>,
}

impl MockDisplayEnumerator {
    /// A single 1920×1080 primary display.
    pub fn single_1080p() -> Self {
        Self::with(vec![Display::new(0, 0, 0, 1920, 1080)])
    }

    /// Two 2560×1440 displays side by side, primary on the left.
    pub fn dual_1440p() -> Self {
        Self::with(vec![
            Display::new(0, 0, 0, 2560, 1440),
            Display::new(1, 2560, 0, 2560, 1440),
        ])
    }

    pub fn with(displays: Vec<Display>) -> Self {
        Self { displays }
    }
}

impl DisplayEnumerator for MockDisplayEnumerator {
    fn list_displays(&self) -> Result<Vec<Display>, DisplayError> {
        if self.displays.is_empty() {
            return Err(DisplayError::NoDisplays);
        }
        Ok(self.displays.clone())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_enumerator_single_1080p_returns_one_display() {
        // Arrange
        let enumerator = MockDisplayEnumerator::single_1080p();

        // Act
        let displays = enumerator.list_displays().expect("enumerate");

        // Assert
        assert_eq!(displays.len(), 1);
        assert_eq!(displays[0].width, 1920);
        assert_eq!(displays[0].height, 1080);
    }

    #[test]
    fn test_mock_enumerator_dual_1440p_puts_primary_first() {
        // Arrange
        let enumerator = MockDisplayEnumerator::dual_1440p();

        // Act
        let displays = enumerator.list_displays().expect("enumerate");

        // Assert
        assert_eq!(displays.len(), 2);
        assert_eq!((displays[0].x, displays[0].y), (0, 0));
        assert_eq!(displays[1].x, 2560);
    }

    #[test]
    fn test_empty_enumerator_reports_no_displays() {
        let enumerator = MockDisplayEnumerator::with(Vec::new());
        assert!(matches!(
            enumerator.list_displays(),
            Err(DisplayError::NoDisplays)
        ));
    }
}
