// Concurrent session store keyed by user id

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::session::Session;

/// Shared handle to one user's session. Hold the lock for a whole turn.
pub type SessionHandle = Arc<Mutex<Session>>;

/// User id → session map. Sessions live for the process lifetime.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionHandle>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the user's session, creating an empty one on first contact
    pub fn get_or_create(&self, user_id: &str) -> SessionHandle {
        if let Some(existing) = self.sessions.get(user_id) {
            return Arc::clone(existing.value());
        }
        let entry = self.sessions.entry(user_id.to_string()).or_insert_with(|| {
            tracing::debug!("Created new session");
            Arc::new(Mutex::new(Session::new()))
        });
        Arc::clone(entry.value())
    }

    pub fn get(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions
            .get(user_id)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
