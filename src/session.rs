//! Per-session state and the session-store boundary.
//!
//! The store moves one [`SessionState`] record per session: the continuity
//! context, the progression state machine, and the recent utterance history
//! the classifier consults. Persistence beyond process memory is external;
//! the in-memory implementation here is the reference one and keeps
//! sessions fully isolated from each other.

use crate::continuity::ContinuityContext;
use crate::progression::ProgressionStateMachine;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Number of recent student messages retained for the classifier.
const HISTORY_LIMIT: usize = 12;

/// Everything the core remembers about one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Cross-turn continuity record.
    pub continuity: ContinuityContext,
    /// Learning-progression state.
    pub progression: ProgressionStateMachine,
    /// Recent student messages, oldest first, bounded.
    pub history: Vec<String>,
}

impl SessionState {
    /// Fresh state for a session.
    pub fn new(session_id: &str) -> Self {
        Self {
            continuity: ContinuityContext::new(session_id),
            progression: ProgressionStateMachine::new(),
            history: Vec::new(),
        }
    }

    /// Record a student message, dropping the oldest past the bound.
    pub fn push_history(&mut self, utterance: &str) {
        self.history.push(utterance.to_string());
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }
}

/// The session-store boundary.
///
/// `load` creates fresh state for an unknown session; `save` replaces the
/// stored record wholesale. One turn per session is in flight at a time, so
/// load-modify-save per turn is race-free by construction.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the session's state, creating it if absent.
    async fn load(&self, session_id: &str) -> SessionState;

    /// Persist the session's state.
    async fn save(&self, session_id: &str, state: SessionState);
}

/// In-memory session store, keyed per session.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions currently held.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, session_id: &str) -> SessionState {
        if let Some(state) = self.sessions.read().await.get(session_id) {
            return state.clone();
        }
        SessionState::new(session_id)
    }

    async fn save(&self, session_id: &str, state: SessionState) {
        self.sessions
            .write()
            .await
            .insert(session_id.to_string(), state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Route;

    #[tokio::test]
    async fn test_load_unknown_session_is_fresh() {
        let store = MemorySessionStore::new();
        let state = store.load("s-1").await;
        assert_eq!(state.continuity.turn_count, 0);
        assert!(state.history.is_empty());
        assert_eq!(store.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let store = MemorySessionStore::new();
        let mut state = store.load("s-1").await;
        state.continuity.begin_turn(Some("daylight"));
        state.continuity.record_route(Route::KnowledgeOnly);
        state.push_history("what is daylighting?");
        store.save("s-1", state.clone()).await;

        let loaded = store.load("s-1").await;
        assert_eq!(loaded, state);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_sessions_isolated() {
        let store = MemorySessionStore::new();
        let mut a = store.load("s-a").await;
        a.continuity.begin_turn(None);
        store.save("s-a", a).await;

        let b = store.load("s-b").await;
        assert_eq!(b.continuity.turn_count, 0);
    }

    #[test]
    fn test_history_bounded() {
        let mut state = SessionState::new("s-1");
        for i in 0..20 {
            state.push_history(&format!("message {i}"));
        }
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        assert_eq!(state.history.first().map(String::as_str), Some("message 8"));
        assert_eq!(state.history.last().map(String::as_str), Some("message 19"));
    }
}
