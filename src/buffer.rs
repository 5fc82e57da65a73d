//! Bounded buffer decoupling producers from the dispatch worker.
//!
//! Many producer tasks enqueue; exactly one worker drains. The enqueue
//! attempt is non-blocking and bounded: when the buffer is full the incoming
//! invocation is rejected, never an already-queued one. Older events win
//! over the newest arrival.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{BuildError, TransportError};
use crate::event::Event;
use crate::transport::Transport;
use crate::wire;

/// A pending unit of work held in the buffer.
///
/// The base kind delivers one event, but the queue carries any invocation —
/// pre-serialized payloads share it via [`DeliverPayload`].
#[async_trait]
pub trait Invocation: Send + 'static {
    /// Carries out the unit of work against the transport.
    async fn invoke(&self, transport: &dyn Transport) -> Result<(), TransportError>;

    /// Short label naming the invocation kind in failure logs.
    fn label(&self) -> &'static str;
}

/// Delivers one event as a JSON document to the event path.
#[derive(Debug)]
pub struct DeliverEvent {
    event: Event,
}

impl DeliverEvent {
    /// Wraps an event for delivery.
    pub fn new(event: Event) -> Self {
        Self { event }
    }
}

#[async_trait]
impl Invocation for DeliverEvent {
    async fn invoke(&self, transport: &dyn Transport) -> Result<(), TransportError> {
        transport.post(wire::EVENT_PATH, wire::json_for(&self.event)).await
    }

    fn label(&self) -> &'static str {
        "event"
    }
}

/// Delivers a pre-serialized body to an arbitrary path.
#[derive(Debug)]
pub struct DeliverPayload {
    path: String,
    body: String,
}

impl DeliverPayload {
    /// Wraps a serialized body for delivery to `path`.
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self { path: path.into(), body: body.into() }
    }
}

#[async_trait]
impl Invocation for DeliverPayload {
    async fn invoke(&self, transport: &dyn Transport) -> Result<(), TransportError> {
        transport.post(&self.path, self.body.clone()).await
    }

    fn label(&self) -> &'static str {
        "payload"
    }
}

/// Producer half of the buffer: non-blocking, drop-on-full enqueue.
#[derive(Debug, Clone)]
pub struct EventBuffer {
    tx: mpsc::Sender<Box<dyn Invocation>>,
    capacity: usize,
}

/// Consumer half of the buffer, held by the single dispatch worker.
#[derive(Debug)]
pub struct BufferConsumer {
    rx: mpsc::Receiver<Box<dyn Invocation>>,
}

impl EventBuffer {
    /// Creates a buffer holding at most `capacity` pending invocations.
    ///
    /// Capacity is fixed for the buffer's lifetime; zero is refused.
    pub fn bounded(capacity: usize) -> Result<(EventBuffer, BufferConsumer), BuildError> {
        if capacity == 0 {
            return Err(BuildError::InvalidCapacity { given: capacity });
        }
        let (tx, rx) = mpsc::channel(capacity);
        Ok((EventBuffer { tx, capacity }, BufferConsumer { rx }))
    }

    /// Attempts to enqueue without blocking.
    ///
    /// Returns `true` if the invocation was retained in FIFO position;
    /// `false` if the buffer was full (or closed) and the invocation was
    /// discarded. Existing entries are never evicted.
    pub fn try_enqueue(&self, invocation: Box<dyn Invocation>) -> bool {
        self.tx.try_send(invocation).is_ok()
    }

    /// The fixed capacity this buffer was created with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl BufferConsumer {
    /// Waits for the oldest pending invocation.
    ///
    /// Returns `None` once every producer handle has been dropped and the
    /// buffer is drained — the worker's signal to exit.
    pub async fn take_next(&mut self) -> Option<Box<dyn Invocation>> {
        self.rx.recv().await
    }
}
