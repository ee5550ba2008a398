//! Transport relay: moves frames between a byte stream and the session.
//!
//! A connected stream is split into halves, each driven by its own task:
//!
//! - The **reader** accumulates socket reads in a [`FrameBuffer`] and
//!   forwards each decoded message as a [`LinkEvent`].  A frame whose payload
//!   is malformed is logged and skipped; EOF, I/O errors and an oversized
//!   length header end the link.
//! - The **writer** drains the bounded outbound queue in FIFO order and
//!   writes one frame per message.
//!
//! The session sends through an [`OutboundQueue`].  When the queue stays
//! full for the enqueue timeout the message is dropped with a warning rather
//! than stalling the caller.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keepgoing_core::{encode_message, FrameBuffer, PeerMessage};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    sync::mpsc::{self, error::SendTimeoutError},
    task::JoinHandle,
};
use tracing::{debug, error, trace, warn};

use super::RelayError;
use crate::application::coalescer::{TransmitError, Transmitter};
use crate::application::session::{Link, LinkEvent};

/// Size of a single socket read.
const READ_CHUNK: usize = 4096;

/// Capacity of the inbound event channel.
const EVENT_CHANNEL_CAPACITY: usize = 128;

/// Relay tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    /// Maximum number of messages waiting for the writer.
    pub queue_capacity: usize,
    /// How long a sender waits for queue space before dropping the message.
    pub enqueue_timeout: Duration,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            enqueue_timeout: Duration::from_millis(250),
        }
    }
}

/// The sending end of the bounded outbound queue.
pub struct OutboundQueue {
    sender: mpsc::Sender<PeerMessage>,
    enqueue_timeout: Duration,
}

impl OutboundQueue {
    pub fn new(sender: mpsc::Sender<PeerMessage>, enqueue_timeout: Duration) -> Self {
        Self {
            sender,
            enqueue_timeout,
        }
    }
}

#[async_trait]
impl Transmitter for OutboundQueue {
    async fn send(&self, message: PeerMessage) -> Result<(), TransmitError> {
        match self.sender.send_timeout(message, self.enqueue_timeout).await {
            Ok(()) => Ok(()),
            Err(SendTimeoutError::Timeout(dropped)) => {
                warn!(
                    kind = ?dropped.message_type(),
                    timeout_ms = self.enqueue_timeout.as_millis() as u64,
                    "outbound queue full; dropping message"
                );
                Err(TransmitError::QueueFull)
            }
            Err(SendTimeoutError::Closed(_)) => Err(TransmitError::Closed),
        }
    }
}

/// Handles to the reader and writer tasks of one link.
pub struct RelayTasks {
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl RelayTasks {
    /// Stops both tasks immediately; queued messages are discarded.
    pub fn abort(&self) {
        self.reader.abort();
        self.writer.abort();
    }

    /// Waits for both tasks to finish.
    pub async fn join(self) {
        let _ = self.reader.await;
        let _ = self.writer.await;
    }
}

/// Splits `stream` and starts the reader and writer tasks.
///
/// The writer shuts the stream down once every clone of the returned
/// transmitter is dropped.
pub fn spawn_relay<S>(stream: S, config: RelayConfig) -> (Link, RelayTasks)
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (read_half, write_half) = tokio::io::split(stream);
    let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
    let (outbound_tx, outbound_rx) = mpsc::channel(config.queue_capacity.max(1));

    let reader = tokio::spawn(read_loop(read_half, event_tx.clone()));
    let writer = tokio::spawn(write_loop(write_half, outbound_rx, event_tx));

    let link = Link {
        transmitter: Arc::new(OutboundQueue::new(outbound_tx, config.enqueue_timeout)),
        events: event_rx,
    };
    (link, RelayTasks { reader, writer })
}

async fn read_loop<R>(mut reader: R, events: mpsc::Sender<LinkEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut frames = FrameBuffer::new();
    let mut chunk = vec![0u8; READ_CHUNK];

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => {
                debug!("peer closed the connection");
                let _ = events.send(LinkEvent::Closed).await;
                return;
            }
            Ok(n) => n,
            Err(e) => {
                error!("read error on link: {e}");
                let _ = events
                    .send(LinkEvent::Failed(RelayError::Io(e).to_string()))
                    .await;
                return;
            }
        };
        frames.extend(&chunk[..n]);

        while let Some(frame) = frames.next_frame() {
            match frame {
                Ok(message) => {
                    trace!(kind = ?message.message_type(), "frame received");
                    if events.send(LinkEvent::Message(message)).await.is_err() {
                        return;
                    }
                }
                Err(e) if e.is_desync() => {
                    error!("link desynchronised: {e}");
                    let _ = events
                        .send(LinkEvent::Failed(RelayError::Desync(e).to_string()))
                        .await;
                    return;
                }
                Err(e) => warn!("dropping malformed frame: {e}"),
            }
        }
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut outbound: mpsc::Receiver<PeerMessage>,
    events: mpsc::Sender<LinkEvent>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(message) = outbound.recv().await {
        let bytes = encode_message(&message);
        if let Err(e) = writer.write_all(&bytes).await {
            error!("write error on link: {e}");
            let _ = events
                .send(LinkEvent::Failed(RelayError::Io(e).to_string()))
                .await;
            return;
        }
        trace!(kind = ?message.message_type(), len = bytes.len(), "frame sent");
    }
    debug!("outbound queue closed; shutting down writer");
    let _ = writer.shutdown().await;
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use keepgoing_core::{
        protocol::messages::{InputEvent, KeyMessage, MouseMoveMessage},
        ControlToken, Direction, Display, Mode, Settings,
    };
    use tokio_test::io::Builder;

    fn ready() -> PeerMessage {
        PeerMessage::Control(ControlToken::Ready)
    }

    fn display() -> PeerMessage {
        PeerMessage::DisplayInfo(Display::new(0, 0, 0, 2560, 1440))
    }

    #[tokio::test]
    async fn test_reader_reassembles_frames_split_across_reads() {
        // Arrange
        let mut bytes = encode_message(&ready());
        bytes.extend(encode_message(&display()));
        let stream = Builder::new()
            .read(&bytes[..5])
            .read(&bytes[5..13])
            .read(&bytes[13..])
            .build();

        // Act
        let (mut link, _tasks) = spawn_relay(stream, RelayConfig::default());

        // Assert
        assert_eq!(link.events.recv().await, Some(LinkEvent::Message(ready())));
        assert_eq!(link.events.recv().await, Some(LinkEvent::Message(display())));
        assert_eq!(link.events.recv().await, Some(LinkEvent::Closed));
    }

    #[tokio::test]
    async fn test_reader_skips_malformed_frame_and_continues() {
        // Arrange – an unknown kind with an empty payload, then a valid frame
        let mut bytes = vec![0x01, 0x7F, 0, 0, 0, 0, 0, 0];
        bytes.extend(encode_message(&ready()));
        let stream = Builder::new().read(&bytes).build();

        // Act
        let (mut link, _tasks) = spawn_relay(stream, RelayConfig::default());

        // Assert
        assert_eq!(link.events.recv().await, Some(LinkEvent::Message(ready())));
        assert_eq!(link.events.recv().await, Some(LinkEvent::Closed));
    }

    #[tokio::test]
    async fn test_reader_fails_link_on_oversized_frame() {
        // Arrange
        let stream = Builder::new()
            .read(&[0x01, 0x10, 0, 0, 0x7F, 0xFF, 0xFF, 0xFF])
            .build();

        // Act
        let (mut link, _tasks) = spawn_relay(stream, RelayConfig::default());

        // Assert
        assert!(matches!(link.events.recv().await, Some(LinkEvent::Failed(_))));
    }

    #[tokio::test]
    async fn test_reader_reports_io_error_as_failure() {
        let stream = Builder::new()
            .read_error(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
            .build();
        let (mut link, _tasks) = spawn_relay(stream, RelayConfig::default());
        assert!(matches!(link.events.recv().await, Some(LinkEvent::Failed(_))));
    }

    #[tokio::test]
    async fn test_writer_sends_frames_in_fifo_order() {
        // Arrange
        let first = PeerMessage::Settings(Settings::new(Mode::Host, Direction::Right));
        let second: PeerMessage = InputEvent::MouseMove(MouseMoveMessage { dx: 3, dy: 2 }).into();
        let third: PeerMessage = InputEvent::KeyUp(KeyMessage { raw_code: 0x1E }).into();
        let stream = Builder::new()
            .write(&encode_message(&first))
            .write(&encode_message(&second))
            .write(&encode_message(&third))
            .build();
        let (link, tasks) = spawn_relay(stream, RelayConfig::default());

        // Act
        link.transmitter.send(first).await.expect("enqueue");
        link.transmitter.send(second).await.expect("enqueue");
        link.transmitter.send(third).await.expect("enqueue");
        drop(link);

        // Assert – the mock panics on any unexpected or missing write
        tasks.join().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_outbound_queue_drops_message_when_full() {
        // Arrange – nobody drains this queue
        let (tx, mut rx) = mpsc::channel(1);
        let queue = OutboundQueue::new(tx, Duration::from_millis(250));
        queue.send(ready()).await.expect("first enqueue");

        // Act
        let result = queue.send(display()).await;

        // Assert
        assert_eq!(result, Err(TransmitError::QueueFull));
        assert_eq!(rx.recv().await, Some(ready()));
    }

    #[tokio::test]
    async fn test_outbound_queue_reports_closed_writer() {
        let (tx, rx) = mpsc::channel(4);
        drop(rx);
        let queue = OutboundQueue::new(tx, Duration::from_millis(10));
        assert_eq!(queue.send(ready()).await, Err(TransmitError::Closed));
    }
}
