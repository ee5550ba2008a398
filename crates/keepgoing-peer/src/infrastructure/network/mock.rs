//! Recording transmitter for unit tests.
//!
//! Stands in for the TCP outbound queue so tests can assert on exactly what
//! the controller and coalescer sent, in order.

use std::sync::Mutex;

use async_trait::async_trait;
use keepgoing_core::PeerMessage;

use crate::application::coalescer::{TransmitError, Transmitter};

/// A [`Transmitter`] that records every accepted message.
#[derive(Default)]
pub struct RecordingTransmitter {
    sent: Mutex<Vec<PeerMessage>>,
    attempts: Mutex<usize>,
    /// When set, every `send` fails with this error and nothing is recorded.
    pub reject_with: Option<TransmitError>,
}

impl RecordingTransmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejecting(error: TransmitError) -> Self {
        Self {
            reject_with: Some(error),
            ..Self::default()
        }
    }

    /// Returns a snapshot of every accepted message.
    pub fn sent(&self) -> Vec<PeerMessage> {
        self.sent.lock().expect("lock poisoned").clone()
    }

    /// Number of `send` calls, accepted or not.
    pub fn attempts(&self) -> usize {
        *self.attempts.lock().expect("lock poisoned")
    }

    pub fn clear(&self) {
        self.sent.lock().expect("lock poisoned").clear();
    }
}

#[async_trait]
impl Transmitter for RecordingTransmitter {
    async fn send(&self, message: PeerMessage) -> Result<(), TransmitError> {
        *self.attempts.lock().expect("lock poisoned") += 1;
        if let Some(error) = self.reject_with {
            return Err(error);
        }
        self.sent.lock().expect("lock poisoned").push(message);
        Ok(())
    }
}
