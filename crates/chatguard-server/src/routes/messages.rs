use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chatguard::attachments::Attachment;
use chatguard::budget::BudgetReport;
use chatguard::models::message::Message;
use chatguard::orchestrator::Submission;
use chatguard::providers::base::Usage;
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
struct FileUpload {
    name: String,
    mime_type: String,
    data_base64: String,
}

#[derive(Debug, Deserialize, Serialize)]
struct MessageRequest {
    text: String,
    #[serde(default)]
    files: Vec<FileUpload>,
}

#[derive(Debug, Serialize)]
struct MessageResponse {
    reply: Message,
    usage: Usage,
    budget: BudgetReport,
    warnings: Vec<String>,
}

fn decode_files(files: Vec<FileUpload>) -> Result<Vec<Attachment>, ApiError> {
    files
        .into_iter()
        .map(|file| {
            let bytes = STANDARD.decode(file.data_base64.trim()).map_err(|e| {
                ApiError::BadRequest(format!("{} is not valid base64: {}", file.name, e))
            })?;
            Ok(Attachment::new(file.name, file.mime_type, bytes))
        })
        .collect()
}

async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let attachments = decode_files(request.files)?;
    let shared = state.get(&id).await?;

    // held for the whole submission so a session never has two in flight
    let mut session = shared.lock().await;
    let report = state
        .orchestrator
        .submit(
            &mut session,
            Submission {
                text: request.text,
                attachments,
            },
        )
        .await;

    match report.outcome {
        Ok(reply) => Ok(Json(MessageResponse {
            reply: reply.message,
            usage: reply.usage,
            budget: reply.budget,
            warnings: report.warnings,
        })),
        Err(error) => {
            tracing::warn!(session = %id, kind = %error.kind(), "submission failed");
            Err(ApiError::with_warnings(error, report.warnings))
        }
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions/:id/messages", post(send_message))
        .with_state(state)
}
