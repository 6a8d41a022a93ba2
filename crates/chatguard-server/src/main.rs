mod configuration;
mod error;
mod routes;
mod state;

use std::sync::Arc;
use std::time::Duration;

use chatguard::budget::TokenBudgetGuard;
use chatguard::models::profile::ModelCatalog;
use chatguard::orchestrator::Orchestrator;
use chatguard::providers::openai::OpenAiProvider;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::configuration::Settings;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let settings = Settings::new()?;
    let addr = settings.server.socket_addr()?;

    let catalog = ModelCatalog::builtin();
    let defaults = settings.session.to_settings();
    let idle_timeout = settings.session.idle_timeout();
    // refuse to start with defaults no session could use
    defaults.resolve(&catalog)?;

    let provider = OpenAiProvider::new(settings.provider.into_config())?;
    let orchestrator = Orchestrator::new(Arc::new(provider), TokenBudgetGuard::new()?, catalog);
    let state = AppState::new(orchestrator, defaults);

    if let Some(max_idle) = idle_timeout {
        let sweeper = state.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(max_idle.min(Duration::from_secs(60)));
            loop {
                interval.tick().await;
                sweeper.evict_idle(max_idle).await;
            }
        });
    }

    // the browser page is served from elsewhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::configure(state).layer(cors);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
