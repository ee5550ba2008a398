//! Mock input source for unit testing and headless runs.
//!
//! Allows tests to inject synthetic [`RawInputEvent`]s without requiring
//! OS hooks or a desktop session.

use std::sync::Mutex;

use tokio::sync::mpsc::UnboundedSender;

use super::{CaptureError, InputSource, RawInputEvent};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Default)]
pub struct MockInputSource {
    sender: Mutex<Option<UnboundedSender<RawInputEvent>>>,
    install_count: Mutex<u32>,
    /// When `true`, `install` fails with [`CaptureError::HookInstallFailed`].
    pub fail_install: bool,
}

impl MockInputSource {
    /// Creates a new mock input source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source whose `install` always fails.
    pub fn failing() -> Self {
        Self {
            fail_install: true,
            ..Self::default()
        }
    }

    /// Injects a synthetic event, as if captured from hardware.
    ///
    /// Returns `false` if the source is not installed; the event is dropped,
    /// just as a real hook would not see it.
    pub fn inject_event(&self, event: RawInputEvent) -> bool {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender.send(event).is_ok(),
            None => false,
        }
    }

    pub fn is_installed(&self) -> bool {
        self.sender.lock().expect("lock poisoned").is_some()
    }

    /// Returns how many times `install` succeeded.
    pub fn install_count(&self) -> u32 {
        *self.install_count.lock().expect("lock poisoned")
    }
}

impl InputSource for MockInputSource {
    fn install(&self, events: UnboundedSender<RawInputEvent>) -> Result<(), CaptureError> {
        if self.fail_install {
            return Err(CaptureError::HookInstallFailed("mock failure".into()));
        }
        let mut guard = self.sender.lock().expect("lock poisoned");
        if guard.is_some() {
            return Err(CaptureError::AlreadyInstalled);
        }
        *guard = Some(events);
        *self.install_count.lock().expect("lock poisoned") += 1;
        Ok(())
    }

    fn uninstall(&self) {
        *self.sender.lock().expect("lock poisoned") = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keepgoing_core::MouseButton;
    use tokio::sync::mpsc;

    #[test]
    fn test_mock_input_source_delivers_events_while_installed() {
        // Arrange
        let source = MockInputSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        source.install(tx).expect("install should succeed");

        // Act
        let delivered = source.inject_event(RawInputEvent::MouseButtonDown {
            button: MouseButton::Left,
            x: 1,
            y: 2,
        });

        // Assert
        assert!(delivered);
        assert!(matches!(
            rx.try_recv(),
            Ok(RawInputEvent::MouseButtonDown { button: MouseButton::Left, .. })
        ));
    }

    #[test]
    fn test_mock_input_source_drops_events_after_uninstall() {
        // Arrange
        let source = MockInputSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        source.install(tx).expect("install should succeed");

        // Act
        source.uninstall();
        let delivered = source.inject_event(RawInputEvent::KeyDown { raw_code: 30 });

        // Assert
        assert!(!delivered);
        assert!(!source.is_installed());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_mock_input_source_rejects_double_install() {
        let source = MockInputSource::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        source.install(tx.clone()).expect("first install");
        assert!(matches!(source.install(tx), Err(CaptureError::AlreadyInstalled)));
        assert_eq!(source.install_count(), 1);
    }

    #[test]
    fn test_failing_source_reports_install_error() {
        let source = MockInputSource::failing();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(matches!(
            source.install(tx),
            Err(CaptureError::HookInstallFailed(_))
        ));
        assert!(!source.is_installed());
    }
}
