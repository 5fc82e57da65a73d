//! One recorder per source identity, owned by the composition root.
//!
//! Applications hold a single registry, pass it down, and ask it for
//! recorders by source id. Creation is lazy and race-safe: two tasks asking
//! for the same id at the same moment get the same instance. There is no
//! process-global state; whoever builds the registry owns every recorder's
//! lifetime.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::config::RecorderConfig;
use crate::error::BuildError;
use crate::recorder::Recorder;

/// Hands out one [`Recorder`] per source identity, creating them lazily
/// from a shared [`RecorderConfig`].
#[derive(Debug)]
pub struct RecorderRegistry {
    config: RecorderConfig,
    recorders: RwLock<HashMap<String, Arc<Recorder>>>,
}

impl RecorderRegistry {
    /// Creates an empty registry; recorders are built on first request.
    pub fn new(config: RecorderConfig) -> Self {
        Self { config, recorders: RwLock::new(HashMap::new()) }
    }

    /// Returns the recorder for `source_id`, building it on first use.
    ///
    /// Construction errors surface only on the call that actually builds;
    /// later calls for the same id return the cached instance.
    pub fn get_or_create(&self, source_id: &str) -> Result<Arc<Recorder>, BuildError> {
        {
            let guard = self.recorders.read().expect("recorder registry poisoned");
            if let Some(recorder) = guard.get(source_id) {
                return Ok(recorder.clone());
            }
        }
        let mut guard = self.recorders.write().expect("recorder registry poisoned");
        // double-check: another task may have built it while we waited
        if let Some(recorder) = guard.get(source_id) {
            return Ok(recorder.clone());
        }
        let recorder = Arc::new(Recorder::from_config(source_id, &self.config)?);
        guard.insert(source_id.to_string(), recorder.clone());
        Ok(recorder)
    }

    /// Returns the recorder for `source_id` if one was already created.
    pub fn get(&self, source_id: &str) -> Option<Arc<Recorder>> {
        let guard = self.recorders.read().expect("recorder registry poisoned");
        guard.get(source_id).cloned()
    }

    /// Number of recorders created so far.
    pub fn len(&self) -> usize {
        self.recorders.read().expect("recorder registry poisoned").len()
    }

    /// True if no recorder has been created yet.
    pub fn is_empty(&self) -> bool {
        self.recorders.read().expect("recorder registry poisoned").is_empty()
    }

    /// Closes every recorder and waits for their workers to drain.
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<Recorder>> = {
            let mut guard = self.recorders.write().expect("recorder registry poisoned");
            guard.drain().map(|(_, recorder)| recorder).collect()
        };
        for recorder in drained {
            recorder.shutdown().await;
        }
    }
}
