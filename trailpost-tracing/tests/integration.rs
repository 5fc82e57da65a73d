//! The layer wired into a real subscriber, recording through a test
//! transport.

use std::sync::{Arc, Mutex};
use std::time::{Duration, UNIX_EPOCH};

use async_trait::async_trait;
use tracing_subscriber::prelude::*;
use trailpost::{ManualClock, Recorder, Transport, TransportError};
use trailpost_tracing::{transformation_for, TrailpostLayer};

#[derive(Debug, Default)]
struct RecordingTransport {
    posts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, path: &str, body: String) -> Result<(), TransportError> {
        self.posts.lock().unwrap().push((path.to_string(), body));
        Ok(())
    }
}

fn recorder(transport: Arc<RecordingTransport>) -> Arc<Recorder> {
    Arc::new(
        Recorder::builder("payments")
            .clock(Arc::new(ManualClock::at(UNIX_EPOCH + Duration::from_millis(500))))
            .transport(transport)
            .build()
            .expect("recorder builds"),
    )
}

#[tokio::test]
async fn log_events_with_message_ids_become_checkpoints() {
    let transport = Arc::new(RecordingTransport::default());
    let recorder = recorder(transport.clone());
    let layer = TrailpostLayer::new(recorder.clone(), transformation_for("message-id").unwrap())
        .with_clock(Arc::new(ManualClock::at(UNIX_EPOCH + Duration::from_millis(750))));

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(message_id = "msg-42", "payment captured");
        tracing::info!("no message id on this one");
        tracing::warn!(message_id = "msg-43", amount = 12, "payment flagged");
    });

    recorder.shutdown().await;
    let posts = transport.posts.lock().unwrap().clone();
    assert_eq!(posts.len(), 2, "the record without a message id is declined");

    let first: serde_json::Value = serde_json::from_str(&posts[0].1).unwrap();
    assert_eq!(posts[0].0, "/event");
    assert_eq!(first["source_id"], "payments");
    assert_eq!(first["timestamp_millis"], 750);
    assert_eq!(first["input_message_ids"], serde_json::json!(["msg-42"]));
    assert_eq!(first["output_message_ids"], serde_json::json!(["msg-42"]));
    assert_eq!(first["description"], "payment captured");

    let second: serde_json::Value = serde_json::from_str(&posts[1].1).unwrap();
    assert_eq!(second["input_message_ids"], serde_json::json!(["msg-43"]));
    assert_eq!(second["description"], "payment flagged");
}

#[tokio::test]
async fn disabled_recorder_makes_the_layer_inert() {
    let transport = Arc::new(RecordingTransport::default());
    let recorder = Arc::new(
        Recorder::builder("payments")
            .enabled(false)
            .transport(transport.clone())
            .build()
            .unwrap(),
    );
    let layer = TrailpostLayer::from_key(recorder.clone(), "message-id").unwrap();

    let subscriber = tracing_subscriber::registry().with(layer);
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(message_id = "msg-1", "goes nowhere");
    });

    recorder.shutdown().await;
    assert!(transport.posts.lock().unwrap().is_empty());
}

#[test]
fn unknown_transformation_key_is_a_startup_error() {
    let transport = Arc::new(RecordingTransport::default());
    let recorder = Arc::new(
        Recorder::builder("payments").enabled(false).transport(transport).build().unwrap(),
    );
    assert!(TrailpostLayer::from_key(recorder, "load-this-class").is_err());
}
