use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use chatguard::models::message::Message;
use chatguard::providers::base::Credential;
use chatguard::session::{ChatSession, SessionSettings};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

/// Body of both session creation and settings updates; absent fields are left alone.
/// A blank `api_key` clears the stored credential.
#[derive(Debug, Default, Deserialize, Serialize)]
struct SettingsRequest {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct SessionSummary {
    id: String,
    settings: SessionSettings,
    has_credential: bool,
}

impl SessionSummary {
    fn of(session: &ChatSession) -> Self {
        SessionSummary {
            id: session.id().to_string(),
            settings: session.settings.clone(),
            has_credential: session.has_credential(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SessionView {
    #[serde(flatten)]
    summary: SessionSummary,
    messages: Vec<Message>,
}

fn apply(
    state: &AppState,
    session: &mut ChatSession,
    request: SettingsRequest,
) -> Result<(), ApiError> {
    // validate everything before changing anything
    if let Some(temperature) = request.temperature {
        SessionSettings::validate_temperature(temperature)?;
    }
    if let Some(model) = request.model {
        session.set_model(state.orchestrator.catalog(), &model)?;
    }
    if let Some(temperature) = request.temperature {
        session.set_temperature(temperature)?;
    }
    if let Some(api_key) = request.api_key {
        session.set_credential(Credential::new(api_key));
    }
    Ok(())
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<SettingsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut session = ChatSession::new(state.defaults.clone());
    apply(&state, &mut session, request)?;
    let summary = SessionSummary::of(&session);

    state.insert(session).await;
    tracing::info!(session = %summary.id, model = %summary.settings.model, "session created");
    Ok((StatusCode::CREATED, Json(summary)))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let shared = state.get(&id).await?;
    let session = shared.lock().await;
    Ok(Json(SessionView {
        summary: SessionSummary::of(&session),
        messages: session.log.messages().to_vec(),
    }))
}

async fn update_settings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SettingsRequest>,
) -> Result<Json<SessionSummary>, ApiError> {
    let shared = state.get(&id).await?;
    let mut session = shared.lock().await;
    apply(&state, &mut session, request)?;
    Ok(Json(SessionSummary::of(&session)))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.remove(&id).await?;
    let remaining = state.len().await;
    tracing::info!(session = %id, remaining = remaining, "session ended");
    Ok(StatusCode::NO_CONTENT)
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", get(get_session).delete(delete_session))
        .route("/sessions/:id/settings", put(update_settings))
        .with_state(state)
}
