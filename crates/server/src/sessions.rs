//! Live SSE sessions, keyed by session id.
//!
//! Each entry holds the sender feeding that session's protocol server. The
//! lock is held only for insert/lookup/remove, never across an `.await`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tracing::debug;

#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, mpsc::Sender<String>>>,
}

impl SessionStore {
    pub fn insert(&self, id: String, inbound: mpsc::Sender<String>) {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, inbound);
    }

    pub fn get(&self, id: &str) -> Option<mpsc::Sender<String>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    pub fn remove(&self, id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Removes its session from the store when dropped. Owned by the SSE
/// response stream, so a client disconnect closes the session.
pub struct SessionGuard {
    id: String,
    store: Arc<SessionStore>,
}

impl SessionGuard {
    pub fn new(id: String, store: Arc<SessionStore>) -> Self {
        Self { id, store }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if self.store.remove(&self.id) {
            debug!(session = %self.id, "SSE session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_removes_session_on_drop() {
        let store = Arc::new(SessionStore::default());
        let (tx, _rx) = mpsc::channel(1);
        store.insert("s1".into(), tx);

        let guard = SessionGuard::new("s1".into(), store.clone());
        assert!(store.get("s1").is_some());

        drop(guard);
        assert!(store.get("s1").is_none());
        assert_eq!(store.len(), 0);
    }
}
