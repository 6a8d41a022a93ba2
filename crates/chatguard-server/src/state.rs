use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chatguard::orchestrator::Orchestrator;
use chatguard::session::{ChatSession, SessionSettings};
use tokio::sync::{Mutex, RwLock};

use crate::error::ApiError;

/// One session's state; the lock keeps its submissions strictly sequential
pub type SharedSession = Arc<Mutex<ChatSession>>;

struct SessionEntry {
    session: SharedSession,
    last_used: Instant,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub defaults: SessionSettings,
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, defaults: SessionSettings) -> Self {
        AppState {
            orchestrator: Arc::new(orchestrator),
            defaults,
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, session: ChatSession) -> String {
        let id = session.id().to_string();
        let entry = SessionEntry {
            session: Arc::new(Mutex::new(session)),
            last_used: Instant::now(),
        };
        self.sessions.write().await.insert(id.clone(), entry);
        id
    }

    /// Looks a session up and marks it as used
    pub async fn get(&self, id: &str) -> Result<SharedSession, ApiError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))?;
        entry.last_used = Instant::now();
        Ok(entry.session.clone())
    }

    /// Ends a session; its log is dropped with it
    pub async fn remove(&self, id: &str) -> Result<(), ApiError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| ApiError::SessionNotFound(id.to_string()))
    }

    /// Drops sessions unused for longer than `max_idle`. A session with a submission in
    /// flight is kept. Returns how many were dropped.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let idle = entry.last_used.elapsed() > max_idle;
            let busy = entry.session.try_lock().is_err();
            if idle && !busy {
                tracing::info!(session = %id, "session expired");
                false
            } else {
                true
            }
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{state_with, QueuedProvider};

    #[tokio::test]
    async fn test_idle_sessions_are_evicted() {
        let state = state_with(QueuedProvider::default());
        let idle = state.insert(ChatSession::default()).await;
        let busy = state.insert(ChatSession::default()).await;

        assert_eq!(state.evict_idle(Duration::from_secs(3600)).await, 0);
        assert_eq!(state.len().await, 2);

        let shared = state.get(&busy).await.unwrap();
        let _guard = shared.lock().await;
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert_eq!(state.evict_idle(Duration::from_millis(1)).await, 1);
        assert!(matches!(
            state.get(&idle).await,
            Err(ApiError::SessionNotFound(_))
        ));
        assert_eq!(state.len().await, 1);
    }
}
