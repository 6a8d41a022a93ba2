use axum::{extract::State, routing::get, Json, Router};
use chatguard::models::profile::ModelProfile;
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
struct ModelsResponse {
    default: Option<String>,
    models: Vec<ModelProfile>,
}

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let catalog = state.orchestrator.catalog();
    Json(ModelsResponse {
        default: catalog.default_profile().map(|p| p.identifier.clone()),
        models: catalog.profiles().to_vec(),
    })
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/models", get(list_models))
        .with_state(state)
}
