//! Session registry - the process-wide session store.
//!
//! Maps opaque session identifiers to their sessions. Each entry sits behind
//! its own async mutex, so concurrent submissions for the same session queue
//! up and run one at a time, while turns for different sessions proceed in
//! parallel. Entries live until explicitly removed; there is no expiry.

use crate::session::StorySession;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared handle to one registered session.
pub type SessionHandle = Arc<Mutex<StorySession>>;

/// In-memory store of active sessions.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session, returning its identifier.
    pub async fn insert(&self, session: StorySession) -> String {
        let id = session.id().to_string();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    /// Look up a session by identifier.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let sessions = self.sessions.lock().await;
        sessions.get(id).cloned()
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, id: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        sessions.remove(id).is_some()
    }

    /// Number of registered sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestHarness;

    fn test_session(id: &str) -> StorySession {
        let harness = TestHarness::new();
        StorySession::with_orchestrator(id, harness.orchestrator)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let registry = SessionRegistry::new();
        let id = registry.insert(test_session("s1")).await;

        assert_eq!(id, "s1");
        assert!(registry.get("s1").await.is_some());
        assert!(registry.get("missing").await.is_none());
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn test_remove() {
        let registry = SessionRegistry::new();
        registry.insert(test_session("s1")).await;

        assert!(registry.remove("s1").await);
        assert!(!registry.remove("s1").await);
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_sessions_are_isolated() {
        let registry = SessionRegistry::new();
        registry.insert(test_session("s1")).await;
        registry.insert(test_session("s2")).await;

        let handle = registry.get("s1").await.unwrap();
        {
            let mut session = handle.lock().await;
            session
                .submit(crate::orchestrator::TurnInput::Text("a dragon".to_string()))
                .await
                .unwrap();
        }

        let s1 = registry.get("s1").await.unwrap();
        let s2 = registry.get("s2").await.unwrap();
        assert_eq!(s1.lock().await.memory().turn_count(), 1);
        assert_eq!(s2.lock().await.memory().turn_count(), 0);
    }
}
