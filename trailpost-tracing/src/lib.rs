#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! `tracing` adapter for `trailpost`: capture log events, turn them into
//! message-flow events through a pluggable transformation, and record them.
//!
//! The transformation decides which log events matter and how they map to
//! message ids; anything it declines is ignored. Transformations are chosen
//! by a configuration key from a fixed table — see [`transformation_for`] —
//! so a typo fails at startup, not silently at runtime.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tracing_subscriber::prelude::*;
//! use trailpost::Recorder;
//! use trailpost_tracing::{transformation_for, TrailpostLayer};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let recorder = Arc::new(
//!     Recorder::builder("payments")
//!         .endpoint("http://collector.example.com:9090")
//!         .build()?,
//! );
//! let layer = TrailpostLayer::new(recorder, transformation_for("message-id")?);
//! tracing_subscriber::registry().with(layer).init();
//!
//! // any log event carrying a message_id field becomes a checkpoint
//! tracing::info!(message_id = "msg-42", "payment captured");
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};

use trailpost::{Clock, Event, Recorder, WallClock};

/// A captured log event, flattened for transformations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Target of the log event (usually the module path).
    pub target: String,
    /// Level the event was emitted at.
    pub level: tracing::Level,
    /// The formatted log message.
    pub message: String,
    /// All other fields, stringified.
    pub fields: BTreeMap<String, String>,
}

/// Source identity and timestamp the produced event should carry.
#[derive(Debug)]
pub struct TransformContext<'a> {
    /// Source id of the recorder behind the layer.
    pub source_id: &'a str,
    /// Time the log event was captured.
    pub timestamp: SystemTime,
}

/// Maps captured log records to message-flow events.
///
/// Returning `None` declines the record; nothing is recorded for it.
pub trait EventTransformation: Send + Sync + std::fmt::Debug {
    /// Builds an event from `record`, or declines it.
    fn transform(&self, record: &LogRecord, ctx: &TransformContext<'_>) -> Option<Event>;
}

/// Built-in transformation: any record carrying a message-id field becomes a
/// checkpoint of that message, described by the log message.
#[derive(Debug, Clone)]
pub struct MessageIdTransformation {
    field: String,
}

impl MessageIdTransformation {
    /// Looks for `field` instead of the default `message_id`.
    pub fn with_field(field: impl Into<String>) -> Self {
        Self { field: field.into() }
    }
}

impl Default for MessageIdTransformation {
    fn default() -> Self {
        Self { field: "message_id".to_string() }
    }
}

impl EventTransformation for MessageIdTransformation {
    fn transform(&self, record: &LogRecord, ctx: &TransformContext<'_>) -> Option<Event> {
        let message_id = record.fields.get(&self.field)?;
        Event::checkpoint(ctx.source_id, ctx.timestamp, message_id.clone(), record.message.as_str())
            .ok()
    }
}

/// The configuration key did not name a known transformation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown event transformation '{key}' (known: message-id)")]
pub struct UnknownTransformation {
    /// The unrecognized key.
    pub key: String,
}

/// Resolves a configuration key to a transformation at startup.
///
/// The table is fixed at compile time; configuration can only select from
/// it, never load code.
pub fn transformation_for(key: &str) -> Result<Arc<dyn EventTransformation>, UnknownTransformation> {
    match key {
        "message-id" => Ok(Arc::new(MessageIdTransformation::default())),
        other => Err(UnknownTransformation { key: other.to_string() }),
    }
}

/// `tracing_subscriber` layer feeding captured log events to a recorder.
///
/// Recording inherits the recorder's guarantees: non-blocking, infallible,
/// a no-op when the recorder is disabled.
#[derive(Debug)]
pub struct TrailpostLayer {
    recorder: Arc<Recorder>,
    transformation: Arc<dyn EventTransformation>,
    clock: Arc<dyn Clock>,
}

impl TrailpostLayer {
    /// Creates a layer recording through `recorder` with the given
    /// transformation.
    pub fn new(recorder: Arc<Recorder>, transformation: Arc<dyn EventTransformation>) -> Self {
        Self { recorder, transformation, clock: Arc::new(WallClock) }
    }

    /// Creates a layer with the transformation named by a configuration key.
    pub fn from_key(
        recorder: Arc<Recorder>,
        key: &str,
    ) -> Result<Self, UnknownTransformation> {
        Ok(Self::new(recorder, transformation_for(key)?))
    }

    /// Swaps the clock used to stamp captured records.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl<S: Subscriber> Layer<S> for TrailpostLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);
        let record = LogRecord {
            target: event.metadata().target().to_string(),
            level: *event.metadata().level(),
            message: visitor.message,
            fields: visitor.fields,
        };
        let ctx = TransformContext {
            source_id: self.recorder.source_id(),
            timestamp: self.clock.now(),
        };
        if let Some(out) = self.transformation.transform(&record, &ctx) {
            self.recorder.record(out);
        }
    }
}

/// Collects the event's fields, keeping the message separate.
#[derive(Default)]
struct FieldVisitor {
    message: String,
    fields: BTreeMap<String, String>,
}

impl Visit for FieldVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.insert(field.name().to_string(), value.to_string());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.insert(field.name().to_string(), format!("{value:?}"));
        }
    }
}
