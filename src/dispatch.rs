//! The single background worker that drains a recorder's buffer.
//!
//! One worker per recorder, spawned at construction. Invocations reach the
//! transport in the exact order they were accepted by the buffer; a failed
//! delivery is logged through the failure gate and the event is gone — no
//! retry, since retrying would need unbounded buffering or producer
//! blocking, both off the table.

use std::sync::Arc;

use crate::buffer::BufferConsumer;
use crate::clock::Clock;
use crate::gate::RateGate;
use crate::transport::Transport;

pub(crate) struct DispatchWorker {
    consumer: BufferConsumer,
    transport: Arc<dyn Transport>,
    failure_gate: RateGate,
    clock: Arc<dyn Clock>,
}

impl DispatchWorker {
    /// Spawns the worker task. It runs until the buffer is closed and
    /// drained; errors never terminate it.
    pub(crate) fn spawn(
        consumer: BufferConsumer,
        transport: Arc<dyn Transport>,
        failure_gate: RateGate,
        clock: Arc<dyn Clock>,
    ) -> tokio::task::JoinHandle<()> {
        let worker = Self { consumer, transport, failure_gate, clock };
        tokio::spawn(worker.run())
    }

    async fn run(mut self) {
        while let Some(invocation) = self.consumer.take_next().await {
            if let Err(error) = invocation.invoke(self.transport.as_ref()).await {
                if self.failure_gate.allow(self.clock.now()) {
                    tracing::warn!(
                        target: "trailpost::dispatch",
                        kind = invocation.label(),
                        error = %error,
                        "delivery failed; invocation dropped"
                    );
                }
            }
        }
        tracing::debug!(target: "trailpost::dispatch", "buffer closed; dispatch worker exiting");
    }
}
