//! Wire contract between the recorder and the collector.
//!
//! Events travel as JSON documents POSTed to [`EVENT_PATH`], one request per
//! dequeued invocation, in dequeue order, never batched. The field layout is
//! owned here so the rest of the crate only ever hands around [`Event`]s.

use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::event::Event;

/// Path on the collector that accepts event documents.
pub const EVENT_PATH: &str = "/event";

/// Borrowed view of an [`Event`] with the on-the-wire field layout.
///
/// Timestamps travel as milliseconds since the Unix epoch.
#[derive(Serialize)]
struct WireEvent<'a> {
    source_id: &'a str,
    timestamp_millis: u64,
    input_message_ids: &'a BTreeSet<String>,
    output_message_ids: &'a BTreeSet<String>,
    description: &'a str,
}

/// Serializes an event to its JSON wire form.
pub fn json_for(event: &Event) -> String {
    let wire = WireEvent {
        source_id: event.source_id(),
        timestamp_millis: epoch_millis(event.timestamp()),
        input_message_ids: event.input_message_ids(),
        output_message_ids: event.output_message_ids(),
        description: event.description(),
    };
    serde_json::to_string(&wire).expect("event wire form serializes to JSON")
}

fn epoch_millis(timestamp: SystemTime) -> u64 {
    timestamp.duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}
