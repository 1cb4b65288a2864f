use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;

use super::{CompletionRequest, TextBackend};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct RecordedCall {
    pub system: String,
    pub user: String,
    pub temperature: Option<f64>,
}

type Responder = Box<dyn Fn(&CompletionRequest<'_>) -> Result<String> + Send + Sync>;

/// In-memory backend answering from a closure and recording every request
pub(crate) struct MockBackend {
    responder: Responder,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockBackend {
    pub fn new(
        responder: impl Fn(&CompletionRequest<'_>) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn systems(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.system).collect()
    }
}

#[async_trait]
impl TextBackend for MockBackend {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String> {
        self.calls.lock().unwrap().push(RecordedCall {
            system: request.system.to_string(),
            user: request.user.to_string(),
            temperature: request.temperature,
        });
        (self.responder)(request)
    }
}
