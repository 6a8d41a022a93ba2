use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification of a [`ChatError`], used by the outer surfaces to pick
/// how a failure is shown (and which HTTP status the server answers with).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    AdmissionRejected,
    ProviderError,
    UnsupportedFormat,
    Unclassified,
    InvalidRequest,
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Deserialize, Serialize)]
pub enum ChatError {
    #[error(
        "The total tokens (input {estimated} + max output {reserved}) exceed the model's context window of {window}"
    )]
    AdmissionRejected {
        estimated: usize,
        reserved: usize,
        window: usize,
    },

    #[error("Provider API error: {0}")]
    Provider(String),

    #[error("An error occurred: {0}")]
    Unclassified(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("Could not read {name}: {reason}")]
    MalformedAttachment { name: String, reason: String },

    #[error("Message is empty")]
    EmptyInput,

    #[error("No API key configured for this session")]
    MissingCredential,

    #[error("Unknown model: {0}")]
    UnknownModel(String),

    #[error("Temperature must be between 0.0 and 1.0, got {0}")]
    InvalidTemperature(f32),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),
}

impl ChatError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ChatError::AdmissionRejected { .. } => ErrorKind::AdmissionRejected,
            ChatError::Provider(_) => ErrorKind::ProviderError,
            ChatError::UnsupportedFormat(_) | ChatError::MalformedAttachment { .. } => {
                ErrorKind::UnsupportedFormat
            }
            ChatError::EmptyInput
            | ChatError::MissingCredential
            | ChatError::UnknownModel(_)
            | ChatError::InvalidTemperature(_) => ErrorKind::InvalidRequest,
            ChatError::Unclassified(_) | ChatError::Tokenizer(_) => ErrorKind::Unclassified,
        }
    }
}

pub type ChatResult<T> = Result<T, ChatError>;
