//! The capability surface application code calls to report events.
//!
//! A [`Recorder`] owns one buffer and one dispatch worker. Its operations
//! never block beyond a bounded enqueue attempt, never propagate a failure,
//! and become complete no-ops when the recorder is disabled. Everything that
//! can go wrong goes wrong at [`RecorderBuilder::build`] time.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwapOption;

use crate::buffer::{DeliverEvent, EventBuffer};
use crate::clock::{Clock, WallClock};
use crate::config::{RecorderConfig, DEFAULT_BUFFER_CAPACITY};
use crate::dispatch::DispatchWorker;
use crate::error::BuildError;
use crate::event::Event;
use crate::gate::{RateGate, DEFAULT_GAG_PERIOD};
use crate::transport::{HttpTransport, Transport};

/// Records message-flow events and forwards them asynchronously.
///
/// One recorder should exist per logical source identity for the life of the
/// process (see [`RecorderRegistry`](crate::RecorderRegistry)). The worker's
/// lifetime is tied to the recorder's: dropping the recorder (or calling
/// [`close`](Recorder::close)) closes the buffer, and the worker exits after
/// draining whatever was already accepted. [`shutdown`](Recorder::shutdown)
/// additionally waits for that drain to finish.
///
/// # Example
///
/// ```rust,no_run
/// use trailpost::Recorder;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), trailpost::BuildError> {
/// let recorder = Recorder::builder("order-router")
///     .endpoint("http://collector.example.com:9090")
///     .capacity(512)
///     .build()?;
///
/// recorder.checkpoint("msg-42", "order accepted");
/// recorder.event(["msg-42"], ["msg-43", "msg-44"], "order split");
///
/// recorder.shutdown().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Recorder {
    source_id: String,
    enabled: bool,
    buffer: ArcSwapOption<EventBuffer>,
    overflow_gate: RateGate,
    clock: Arc<dyn Clock>,
    worker: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Recorder {
    /// Starts building a recorder for the given source identity.
    pub fn builder(source_id: impl Into<String>) -> RecorderBuilder {
        RecorderBuilder {
            source_id: source_id.into(),
            enabled: true,
            capacity: DEFAULT_BUFFER_CAPACITY,
            gag_period: DEFAULT_GAG_PERIOD,
            clock: Arc::new(WallClock),
            transport: None,
            endpoint: None,
        }
    }

    /// Builds a recorder from a loaded [`RecorderConfig`].
    pub fn from_config(
        source_id: impl Into<String>,
        config: &RecorderConfig,
    ) -> Result<Recorder, BuildError> {
        Recorder::builder(source_id)
            .enabled(config.enabled)
            .capacity(config.buffer_capacity)
            .gag_period(config.gag_period())
            .endpoint(&config.endpoint)
            .build()
    }

    /// Records a single message passing through a single point.
    ///
    /// Sugar for [`event`](Recorder::event) with `message_id` as both the
    /// sole input and the sole output.
    pub fn checkpoint(&self, message_id: &str, description: &str) {
        self.event([message_id], [message_id], description);
    }

    /// Records an event with arbitrary input and output message ids.
    ///
    /// The event carries this recorder's source id and the current time from
    /// the injected clock. Like every recording operation this never fails:
    /// a malformed event (no message ids at all) is dropped with a debug
    /// log, and a full buffer drops the event behind the overflow gate.
    pub fn event<I, II, O, OI>(&self, input_message_ids: I, output_message_ids: O, description: &str)
    where
        I: IntoIterator<Item = II>,
        II: Into<String>,
        O: IntoIterator<Item = OI>,
        OI: Into<String>,
    {
        if !self.enabled {
            return;
        }
        let inputs: BTreeSet<String> = input_message_ids.into_iter().map(Into::into).collect();
        let outputs: BTreeSet<String> = output_message_ids.into_iter().map(Into::into).collect();
        match Event::new(self.source_id.clone(), self.clock.now(), inputs, outputs, description) {
            Ok(event) => self.submit(event),
            Err(error) => {
                tracing::debug!(
                    target: "trailpost::recorder",
                    source = %self.source_id,
                    error = %error,
                    "discarding malformed event"
                );
            }
        }
    }

    /// Records a caller-constructed event verbatim, bypassing the clock and
    /// source-id injection.
    pub fn record(&self, event: Event) {
        if !self.enabled {
            return;
        }
        self.submit(event);
    }

    fn submit(&self, event: Event) {
        let buffer = match self.buffer.load_full() {
            Some(buffer) => buffer,
            None => return,
        };
        if !buffer.try_enqueue(Box::new(DeliverEvent::new(event)))
            && self.overflow_gate.allow(self.clock.now())
        {
            tracing::warn!(
                target: "trailpost::recorder",
                source = %self.source_id,
                capacity = buffer.capacity(),
                "telemetry buffer full; event dropped"
            );
        }
    }

    /// The source identity events are stamped with.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Whether this recorder actually records anything.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Stops accepting events. Already-accepted events are still delivered;
    /// the worker exits once they are drained.
    pub fn close(&self) {
        self.buffer.store(None);
    }

    /// Closes the recorder and waits for the worker to drain and exit.
    pub async fn shutdown(&self) {
        self.close();
        let handle = self.worker.lock().expect("worker handle poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

/// Builder for [`Recorder`], where all construction-time validation lives.
#[derive(Debug)]
pub struct RecorderBuilder {
    source_id: String,
    enabled: bool,
    capacity: usize,
    gag_period: Duration,
    clock: Arc<dyn Clock>,
    transport: Option<Arc<dyn Transport>>,
    endpoint: Option<String>,
}

impl RecorderBuilder {
    /// Turns recording on or off. A disabled recorder is a no-op shell:
    /// nothing is built, buffered, or sent.
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Fixed buffer capacity; must be positive.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Minimum spacing between repeated overflow/failure log lines.
    pub fn gag_period(mut self, gag_period: Duration) -> Self {
        self.gag_period = gag_period;
        self
    }

    /// Clock used to stamp events; swap in a manual one for tests.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Uses a caller-supplied transport instead of the HTTP one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Collector endpoint (`scheme://host[:port]`) for the HTTP transport.
    /// Ignored when an explicit transport is set.
    pub fn endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = Some(endpoint.to_string());
        self
    }

    /// Validates the configuration and starts the recorder.
    ///
    /// Spawns the dispatch worker, so this must run inside a tokio runtime
    /// (unless the recorder is disabled, which spawns nothing).
    pub fn build(self) -> Result<Recorder, BuildError> {
        if self.source_id.is_empty() {
            return Err(BuildError::EmptySourceId);
        }
        if self.gag_period.is_zero() {
            return Err(BuildError::InvalidGagPeriod);
        }
        let transport: Arc<dyn Transport> = match (self.transport, self.endpoint.as_deref()) {
            (Some(transport), _) => transport,
            (None, Some(endpoint)) => Arc::new(HttpTransport::new(endpoint)?),
            (None, None) => return Err(BuildError::MissingEndpoint),
        };
        let (buffer, consumer) = EventBuffer::bounded(self.capacity)?;

        if !self.enabled {
            // no worker, no buffer handle: every operation short-circuits
            // and the transport is never touched
            drop((buffer, consumer, transport));
            return Ok(Recorder {
                source_id: self.source_id,
                enabled: false,
                buffer: ArcSwapOption::empty(),
                overflow_gate: RateGate::new(self.gag_period),
                clock: self.clock,
                worker: Mutex::new(None),
            });
        }

        let worker = DispatchWorker::spawn(
            consumer,
            transport,
            RateGate::new(self.gag_period),
            self.clock.clone(),
        );
        Ok(Recorder {
            source_id: self.source_id,
            enabled: true,
            buffer: ArcSwapOption::from_pointee(buffer),
            overflow_gate: RateGate::new(self.gag_period),
            clock: self.clock,
            worker: Mutex::new(Some(worker)),
        })
    }
}
