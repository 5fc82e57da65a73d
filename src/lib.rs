#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Trailpost
//!
//! Fire-and-forget message-flow telemetry for Rust services: report that a
//! message arrived at, departed, or passed through a checkpoint, and let a
//! background worker ship the event to a collector without ever blocking or
//! failing the calling code.
//!
//! ## Design
//!
//! - **Bounded buffering** — each [`Recorder`] owns a fixed-capacity queue;
//!   when it fills, the incoming event is dropped, never an older one, and
//!   never the caller's time.
//! - **One dispatch worker per recorder** — events reach the collector in
//!   the order they were accepted. There is no ordering across recorders.
//! - **Lossy by contract** — delivery is attempted at most once; a transport
//!   failure costs the event, not the application.
//! - **Rate-gated diagnostics** — sustained overload or collector downtime
//!   produces one log line per gag period, not one per event.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use trailpost::Recorder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), trailpost::BuildError> {
//!     let recorder = Recorder::builder("order-router")
//!         .endpoint("http://collector.example.com:9090")
//!         .build()?;
//!
//!     // a message passing through a single point
//!     recorder.checkpoint("msg-42", "order accepted");
//!
//!     // a message fanning out
//!     recorder.event(["msg-42"], ["msg-43", "msg-44"], "order split");
//!
//!     // drain what was accepted, then stop the worker
//!     recorder.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod buffer;
pub mod clock;
pub mod config;
mod dispatch;
pub mod error;
pub mod event;
pub mod gate;
pub mod recorder;
pub mod registry;
pub mod transport;
pub mod wire;

// Re-exports
pub use buffer::{BufferConsumer, DeliverEvent, DeliverPayload, EventBuffer, Invocation};
pub use clock::{Clock, ManualClock, WallClock};
pub use config::RecorderConfig;
pub use error::{BuildError, ConfigError, EventError, TransportError};
pub use event::Event;
pub use gate::RateGate;
pub use recorder::{Recorder, RecorderBuilder};
pub use registry::RecorderRegistry;
pub use transport::{HttpTransport, Transport};
