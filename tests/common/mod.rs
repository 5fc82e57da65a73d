#![allow(dead_code)] // not every test binary uses every helper

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use trailpost::{Transport, TransportError};

/// Test transport that captures every post and can be told to fail them.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    posts: Mutex<Vec<(String, String)>>,
    fail_with_status: Option<u16>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(Self { posts: Mutex::new(Vec::new()), fail_with_status: Some(status) })
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn bodies(&self) -> Vec<String> {
        self.posts().into_iter().map(|(_, body)| body).collect()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn post(&self, path: &str, body: String) -> Result<(), TransportError> {
        self.posts.lock().unwrap().push((path.to_string(), body));
        match self.fail_with_status {
            Some(status) => Err(TransportError::Status { status, path: path.to_string() }),
            None => Ok(()),
        }
    }
}
