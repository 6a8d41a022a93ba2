use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ChatResult;
use crate::models::message::Message;
use crate::models::profile::ModelProfile;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// API key for the completion provider. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for a blank key
    pub fn new<S: Into<String>>(key: S) -> Option<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            None
        } else {
            Some(Credential(key.trim().to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Everything needed for one completion call. Built fresh per submission.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a ModelProfile,
    pub messages: &'a [Message],
    pub temperature: f32,
}

impl CompletionRequest<'_> {
    pub fn max_tokens(&self) -> usize {
        self.model.max_output_tokens
    }
}

/// Base trait for completion providers
#[async_trait]
pub trait Provider: Send + Sync {
    /// Generate the next assistant message for the conversation in `request`
    async fn complete(
        &self,
        credential: &Credential,
        request: &CompletionRequest<'_>,
    ) -> ChatResult<(Message, Usage)>;
}
