//! Event coalescer: batches pointer deltas into time-sliced windows.
//!
//! # How the window works (for beginners)
//!
//! A mouse reports hundreds of tiny movements per second.  Sending each one
//! as its own frame would waste bandwidth and make the remote pointer jitter,
//! so pointer deltas are summed for a fixed window (60 ms by default) and
//! sent as a single `MouseMove`.  The window starts with the first delta and
//! is never extended: a steady stream of movement still produces one frame
//! per window.
//!
//! Button, wheel and key events are *discrete*: they are never batched and
//! go out immediately.  With strict ordering (the default) the pending batch
//! is sent first, so a click always lands where the pointer was moved to.
//!
//! # Backpressure
//!
//! Each send may wait up to the enqueue timeout for room in the outbound
//! queue.  Once one times out, everything already queued behind it is shed:
//! deltas fold into the pending batch, discrete events are dropped, and
//! waiting flushes are answered.  A flush is therefore never stuck behind a
//! backlog the link cannot absorb.
//!
//! # Ownership
//!
//! The coalescer runs as its own task and exclusively owns the
//! [`PendingDelta`] and the window deadline.  Callers talk to it through a
//! cloneable [`CoalescerHandle`], which makes the accumulator impossible to
//! touch from two places at once.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keepgoing_core::{
    protocol::messages::{InputEvent, MouseMoveMessage},
    Delta, PeerMessage, PendingDelta,
};
use thiserror::Error;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, trace, warn};

/// Error returned when an outbound message cannot be handed to the link.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum TransmitError {
    /// The outbound queue stayed full for the whole enqueue timeout.
    #[error("outbound queue full; message dropped")]
    QueueFull,
    /// The link writer has stopped.
    #[error("link closed")]
    Closed,
}

/// Abstraction over the ordered outbound queue to the peer.
///
/// Everything the controller and the coalescer send goes through a single
/// `Transmitter`, so frames reach the wire in the order they were sent.
#[async_trait]
pub trait Transmitter: Send + Sync {
    /// Enqueues `message` for transmission.
    ///
    /// # Errors
    ///
    /// Returns [`TransmitError`] if the message was not enqueued.
    async fn send(&self, message: PeerMessage) -> Result<(), TransmitError>;
}

/// Coalescer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoalescerConfig {
    /// Length of a batching window, measured from its first delta.
    pub window: Duration,
    /// Send any pending batch before a discrete event.
    pub strict_ordering: bool,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(60),
            strict_ordering: true,
        }
    }
}

enum Command {
    Move(Delta),
    Discrete(InputEvent),
    Flush(oneshot::Sender<()>),
}

/// Cloneable handle to a running coalescer task.
#[derive(Clone)]
pub struct CoalescerHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl CoalescerHandle {
    /// Adds an already-mapped pointer delta to the current window.
    ///
    /// Returns `false` if the coalescer task has stopped.
    pub fn on_move(&self, delta: Delta) -> bool {
        self.commands.send(Command::Move(delta)).is_ok()
    }

    /// Forwards a button, wheel or key event without batching.
    ///
    /// Returns `false` if the coalescer task has stopped.
    pub fn on_discrete(&self, event: InputEvent) -> bool {
        self.commands.send(Command::Discrete(event)).is_ok()
    }

    /// Sends the pending batch now and cancels the window.
    ///
    /// Resolves once the batch has been handed to the transmitter, so a
    /// message sent afterwards is ordered after it.
    pub async fn flush(&self) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(Command::Flush(ack)).is_ok() {
            let _ = done.await;
        }
    }
}

/// Spawns a coalescer task sending through `transmitter`.
///
/// The task runs until every [`CoalescerHandle`] is dropped; the pending
/// batch is sent before it exits.
pub fn spawn_coalescer(
    config: CoalescerConfig,
    transmitter: Arc<dyn Transmitter>,
) -> (CoalescerHandle, JoinHandle<()>) {
    let (commands, rx) = mpsc::unbounded_channel();
    let coalescer = Coalescer {
        config,
        transmitter,
        pending: PendingDelta::new(),
        deadline: None,
        congested: false,
    };
    let task = tokio::spawn(coalescer.run(rx));
    (CoalescerHandle { commands }, task)
}

struct Coalescer {
    config: CoalescerConfig,
    transmitter: Arc<dyn Transmitter>,
    pending: PendingDelta,
    deadline: Option<Instant>,
    /// Set when an enqueue timed out; cleared once the backlog is shed.
    congested: bool,
}

impl Coalescer {
    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        loop {
            tokio::select! {
                biased;

                _ = until(self.deadline) => {
                    trace!("coalescing window expired");
                    self.emit_pending().await;
                }
                command = commands.recv() => match command {
                    Some(Command::Move(delta)) => self.add_move(delta),
                    Some(Command::Discrete(event)) => {
                        if self.config.strict_ordering {
                            self.emit_pending().await;
                        }
                        self.send(event.into()).await;
                    }
                    Some(Command::Flush(ack)) => {
                        self.emit_pending().await;
                        let _ = ack.send(());
                    }
                    None => {
                        self.emit_pending().await;
                        debug!("coalescer stopped");
                        return;
                    }
                },
            }

            if self.congested {
                self.shed_backlog(&mut commands).await;
            }
        }
    }

    fn add_move(&mut self, delta: Delta) {
        if self.pending.add(delta) {
            self.deadline = Some(Instant::now() + self.config.window);
        }
    }

    /// Drains commands queued behind a timed-out enqueue without sending.
    ///
    /// Queued deltas join the pending batch, queued discrete events are
    /// dropped, and queued flushes are answered after one emit attempt, so
    /// a flush never waits behind a backlog the link cannot absorb.
    async fn shed_backlog(&mut self, commands: &mut mpsc::UnboundedReceiver<Command>) {
        let mut dropped = 0usize;
        let mut acks = Vec::new();
        while let Ok(command) = commands.try_recv() {
            match command {
                Command::Move(delta) => self.add_move(delta),
                Command::Discrete(_) => dropped += 1,
                Command::Flush(ack) => acks.push(ack),
            }
        }
        if dropped > 0 {
            warn!(dropped, "outbound queue congested; shed queued input");
        }
        if !acks.is_empty() {
            self.emit_pending().await;
            for ack in acks {
                let _ = ack.send(());
            }
        }
        self.congested = false;
    }

    /// Sends the accumulated delta, if any, and closes the window.
    async fn emit_pending(&mut self) {
        self.deadline = None;
        if let Some(sum) = self.pending.take() {
            let message = InputEvent::MouseMove(MouseMoveMessage::from_delta(sum));
            self.send(message.into()).await;
        }
    }

    async fn send(&mut self, message: PeerMessage) {
        match self.transmitter.send(message).await {
            Ok(()) => {}
            Err(TransmitError::QueueFull) => {
                warn!(kind = ?message.message_type(), "outbound queue full; dropped input");
                self.congested = true;
            }
            Err(TransmitError::Closed) => {
                debug!(kind = ?message.message_type(), "link closed; dropped input");
            }
        }
    }
}

/// Sleeps until `deadline`, or forever when there is none.
pub(crate) async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => future::pending().await,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
