//! In-process generation backend that replays queued replies. Used by the unit
//! and integration tests in place of a live model. Compiled only for tests or
//! with the `test-helpers` feature.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;

use crate::generation::{GenerationBackend, GenerationError, GenerationRequest, Result};

#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_raw(&self, reply: &str) {
        self.replies.lock().push_back(Ok(reply.to_string()));
    }

    pub fn push_json<T: Serialize>(&self, value: &T) {
        let reply = serde_json::to_string(value).unwrap_or_default();
        self.replies.lock().push_back(Ok(reply));
    }

    pub fn push_err(&self, err: GenerationError) {
        self.replies.lock().push_back(Err(err));
    }

    /// Number of calls received so far.
    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .map(|request| request.prompt.clone())
            .collect()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn complete(&self, request: &GenerationRequest) -> Result<String> {
        self.requests.lock().push(request.clone());
        // Suspend once so overlapping calls from the same task can observe the
        // pending state.
        tokio::task::yield_now().await;
        self.replies.lock().pop_front().unwrap_or_else(|| {
            Err(GenerationError::BackendUnavailable(
                "no scripted reply left".to_string(),
            ))
        })
    }
}
