use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;

use crate::errors::ChatResult;
use crate::models::message::Message;
use crate::providers::base::{CompletionRequest, Credential, Provider, Usage};

/// A mock provider that returns pre-configured responses for testing
#[derive(Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<ChatResult<Message>>>>,
    calls: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of responses
    pub fn new(responses: Vec<ChatResult<Message>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The message lists this provider was called with, oldest first
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _credential: &Credential,
        request: &CompletionRequest<'_>,
    ) -> ChatResult<(Message, Usage)> {
        self.calls.lock().unwrap().push(request.messages.to_vec());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            // Return empty response if no more pre-configured responses
            Ok((Message::assistant(), Usage::default()))
        } else {
            responses
                .remove(0)
                .map(|message| (message, Usage::default()))
        }
    }
}
