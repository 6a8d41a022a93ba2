use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chatguard::errors::{ChatError, ErrorKind};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable: {env_var}")]
    MissingEnvVar { env_var: String },
    #[error("Invalid value for {env_var}: {reason}")]
    InvalidValue { env_var: String, reason: String },
    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

/// Maps a settings path such as `provider.timeout_secs` to its env var
pub fn to_env_var(field_path: &str) -> String {
    let mut env_var = String::from("CHATGUARD_");
    env_var.push_str(&field_path.replace('.', "__").to_uppercase());
    env_var
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    pub warnings: Vec<String>,
}

/// A failed request: either a library error or an unknown session
#[derive(Debug)]
pub enum ApiError {
    Chat {
        error: ChatError,
        warnings: Vec<String>,
    },
    SessionNotFound(String),
    BadRequest(String),
}

impl ApiError {
    pub fn with_warnings(error: ChatError, warnings: Vec<String>) -> Self {
        ApiError::Chat { error, warnings }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Chat {
                error: ChatError::MissingCredential,
                ..
            } => StatusCode::UNAUTHORIZED,
            ApiError::Chat { error, .. } => match error.kind() {
                ErrorKind::InvalidRequest | ErrorKind::UnsupportedFormat => StatusCode::BAD_REQUEST,
                ErrorKind::AdmissionRejected => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorKind::ProviderError => StatusCode::BAD_GATEWAY,
                ErrorKind::Unclassified => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        ApiError::with_warnings(error, Vec::new())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Chat { error, warnings } => ErrorResponse {
                error: error.to_string(),
                kind: error.kind().to_string(),
                warnings,
            },
            ApiError::SessionNotFound(id) => ErrorResponse {
                error: format!("Session '{}' not found", id),
                kind: "not_found".to_string(),
                warnings: Vec::new(),
            },
            ApiError::BadRequest(reason) => ErrorResponse {
                error: reason,
                kind: ErrorKind::InvalidRequest.to_string(),
                warnings: Vec::new(),
            },
        };
        (status, Json(body)).into_response()
    }
}
