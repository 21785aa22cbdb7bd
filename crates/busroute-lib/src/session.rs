//! Per-user conversation state and the store that holds it.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::model::RouteRecord;

/// Position of a user within a multi-turn flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    #[default]
    Initial,
    AwaitingSource,
    AwaitingDestination,
    AwaitingSourceFare,
    AwaitingDestinationFare,
}

impl ConversationState {
    /// Whether the next message is consumed as a location answer.
    pub fn is_mid_flow(self) -> bool {
        self != ConversationState::Initial
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub state: ConversationState,
    pub source: Option<String>,
    pub destination: Option<String>,
}

impl ConversationContext {
    /// Enter `state` with cleared locations.
    pub fn restart(&mut self, state: ConversationState) {
        self.state = state;
        self.source = None;
        self.destination = None;
    }
}

/// Routes returned by a user's most recent two-location search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastSearchResult {
    pub routes: Vec<RouteRecord>,
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Session {
    pub conversation: ConversationContext,
    pub last_search: Option<LastSearchResult>,
}

impl Session {
    /// Cached search results, treating an empty result set as absent.
    pub fn cached_search(&self) -> Option<&LastSearchResult> {
        self.last_search
            .as_ref()
            .filter(|result| !result.routes.is_empty())
    }
}

/// Keyed storage for [`Session`]s.
///
/// The engine serialises access per user, so implementations only need to
/// make individual calls thread-safe.
pub trait SessionStore: Send + Sync {
    fn get(&self, user_id: &str) -> Option<Session>;
    fn put(&self, user_id: &str, session: Session);
    fn remove(&self, user_id: &str);
}

/// Process-local [`SessionStore`].
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Session>> {
        // Entries are replaced whole, so a poisoned map is still consistent.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for InMemorySessionStore {
    fn get(&self, user_id: &str) -> Option<Session> {
        self.lock().get(user_id).cloned()
    }

    fn put(&self, user_id: &str, session: Session) {
        self.lock().insert(user_id.to_string(), session);
    }

    fn remove(&self, user_id: &str) {
        self.lock().remove(user_id);
    }
}
