//! The immutable value describing one recorded occurrence.
//!
//! An [`Event`] says that a message (or a set of messages) passed through a
//! checkpoint in some component: which messages came in, which went out, and
//! a human-readable description of what happened there. Events are built
//! once, validated at construction, and never mutated.

use std::collections::BTreeSet;
use std::fmt;
use std::time::SystemTime;

use crate::error::EventError;

/// A record of a message's passage through a checkpoint.
///
/// The invariant enforced at construction: the union of input and output
/// message ids is non-empty — an event that references no message describes
/// nothing. Ids are kept in ordered sets so two events built from the same
/// ids in any order compare (and serialize) identically.
///
/// # Example
///
/// ```rust
/// use std::collections::BTreeSet;
/// use std::time::SystemTime;
/// use trailpost::Event;
///
/// let inputs: BTreeSet<String> = ["msg-1".to_string()].into_iter().collect();
/// let outputs: BTreeSet<String> = ["msg-2".to_string()].into_iter().collect();
/// let event = Event::new("splitter", SystemTime::now(), inputs, outputs, "split order")
///     .expect("valid event");
/// assert_eq!(event.source_id(), "splitter");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    source_id: String,
    timestamp: SystemTime,
    input_message_ids: BTreeSet<String>,
    output_message_ids: BTreeSet<String>,
    description: String,
}

impl Event {
    /// Builds an event, validating the source id and the message-id invariant.
    pub fn new(
        source_id: impl Into<String>,
        timestamp: SystemTime,
        input_message_ids: BTreeSet<String>,
        output_message_ids: BTreeSet<String>,
        description: impl Into<String>,
    ) -> Result<Self, EventError> {
        let source_id = source_id.into();
        if source_id.is_empty() {
            return Err(EventError::EmptySourceId);
        }
        if input_message_ids.is_empty() && output_message_ids.is_empty() {
            return Err(EventError::NoMessageIds);
        }
        Ok(Self {
            source_id,
            timestamp,
            input_message_ids,
            output_message_ids,
            description: description.into(),
        })
    }

    /// Builds the checkpoint shape: a single message that is both the sole
    /// input and the sole output.
    pub fn checkpoint(
        source_id: impl Into<String>,
        timestamp: SystemTime,
        message_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, EventError> {
        let ids: BTreeSet<String> = std::iter::once(message_id.into()).collect();
        Self::new(source_id, timestamp, ids.clone(), ids, description)
    }

    /// Id of the component that emitted the event.
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Wall-clock time at which the event was recorded.
    pub fn timestamp(&self) -> SystemTime {
        self.timestamp
    }

    /// Ids of the messages that arrived at the checkpoint.
    pub fn input_message_ids(&self) -> &BTreeSet<String> {
        &self.input_message_ids
    }

    /// Ids of the messages that departed the checkpoint.
    pub fn output_message_ids(&self) -> &BTreeSet<String> {
        &self.output_message_ids
    }

    /// Description of what happened at the checkpoint.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} (in={:?}, out={:?})",
            self.source_id, self.description, self.input_message_ids, self.output_message_ids
        )
    }
}
