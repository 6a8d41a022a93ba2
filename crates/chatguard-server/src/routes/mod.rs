// Export route modules
pub mod messages;
pub mod models;
pub mod sessions;

use axum::Router;

use crate::state::AppState;

pub fn configure(state: AppState) -> Router {
    Router::new()
        .merge(models::routes(state.clone()))
        .merge(sessions::routes(state.clone()))
        .merge(messages::routes(state))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, Response},
    };
    use chatguard::budget::TokenBudgetGuard;
    use chatguard::errors::ChatResult;
    use chatguard::models::message::Message;
    use chatguard::models::profile::ModelCatalog;
    use chatguard::orchestrator::Orchestrator;
    use chatguard::providers::base::{CompletionRequest, Credential, Provider, Usage};
    use chatguard::session::SessionSettings;
    use http_body_util::BodyExt;
    use serde_json::Value;

    use crate::state::AppState;

    /// Replays queued replies and counts how often it was called
    #[derive(Clone, Default)]
    pub struct QueuedProvider {
        replies: Arc<Mutex<VecDeque<ChatResult<Message>>>>,
        calls: Arc<Mutex<usize>>,
    }

    impl QueuedProvider {
        pub fn new(replies: Vec<ChatResult<Message>>) -> Self {
            QueuedProvider {
                replies: Arc::new(Mutex::new(replies.into())),
                calls: Arc::new(Mutex::new(0)),
            }
        }

        pub fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Provider for QueuedProvider {
        async fn complete(
            &self,
            _credential: &Credential,
            _request: &CompletionRequest<'_>,
        ) -> ChatResult<(Message, Usage)> {
            *self.calls.lock().unwrap() += 1;
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Message::assistant().with_text("ok")));
            next.map(|message| (message, Usage::new(Some(10), Some(2), Some(12))))
        }
    }

    pub fn state_with(provider: QueuedProvider) -> AppState {
        let orchestrator = Orchestrator::new(
            Arc::new(provider),
            TokenBudgetGuard::new().unwrap(),
            ModelCatalog::builtin(),
        );
        AppState::new(orchestrator, SessionSettings::default())
    }

    pub fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method(method)
            .body(Body::empty())
            .unwrap()
    }

    pub async fn body_json(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }
}
