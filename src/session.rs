//! Per-session state owned by the server
//!
//! The source design kept an ambient per-session history alive across
//! re-runs; here it is an explicit state object created on a session's
//! first request and discarded with the process. Sessions never share
//! state with each other.

use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Opaque 128-bit session identifier carried in a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Allocate a fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an id from its cookie representation.
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value.trim()).ok().map(Self)
    }

    /// Cookie representation (hyphenated lowercase).
    pub fn to_cookie_value(self) -> String {
        self.0.to_string()
    }
}

/// State scoped to one user session.
#[derive(Debug, Default, Clone)]
pub struct SessionState {
    history: Vec<String>,
}

impl SessionState {
    /// Append a submitted input. Order reflects submission order and
    /// duplicates are kept.
    pub fn record(&mut self, input: &str) {
        self.history.push(input.to_string());
    }

    /// All inputs submitted so far, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Number of recorded submissions.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// True when nothing has been submitted yet.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// All live sessions, keyed by id.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<SessionId, SessionState>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the session for a request: reuse a known id or mint a new
    /// one. Returns the id to set on the response alongside whether it was
    /// freshly created.
    pub fn resolve(&self, id: Option<SessionId>) -> (SessionId, bool) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        if let Some(id) = id {
            if sessions.contains_key(&id) {
                return (id, false);
            }
        }
        let id = SessionId::generate();
        sessions.insert(id, SessionState::default());
        (id, true)
    }

    /// Append an input to a session's history.
    pub fn record(&self, id: SessionId, input: &str) {
        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.entry(id).or_default().record(input);
    }

    /// Snapshot a session's history for rendering.
    pub fn history(&self, id: SessionId) -> Vec<String> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(&id)
            .map(|state| state.history().to_vec())
            .unwrap_or_default()
    }

    /// Number of submissions recorded for a session.
    pub fn history_len(&self, id: SessionId) -> usize {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.get(&id).map(SessionState::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_preserves_order_and_duplicates() {
        let mut state = SessionState::default();
        state.record("alpha");
        state.record("beta");
        state.record("alpha");
        assert_eq!(state.history(), ["alpha", "beta", "alpha"]);
        assert_eq!(state.len(), 3);
    }

    #[test]
    fn resolve_reuses_known_session() {
        let store = SessionStore::new();
        let (id, created) = store.resolve(None);
        assert!(created);
        let (same, created_again) = store.resolve(Some(id));
        assert_eq!(id, same);
        assert!(!created_again);
    }

    #[test]
    fn unknown_cookie_ids_get_a_fresh_session() {
        let store = SessionStore::new();
        let stale = SessionId::generate();
        let (id, created) = store.resolve(Some(stale));
        assert!(created);
        assert_ne!(id, stale);
    }

    #[test]
    fn sessions_are_isolated() {
        let store = SessionStore::new();
        let (a, _) = store.resolve(None);
        let (b, _) = store.resolve(None);
        store.record(a, "only-in-a");
        assert_eq!(store.history(a), ["only-in-a"]);
        assert!(store.history(b).is_empty());
    }

    #[test]
    fn session_id_cookie_round_trip() {
        let id = SessionId::generate();
        let parsed = SessionId::parse(&id.to_cookie_value()).unwrap();
        assert_eq!(id, parsed);
        assert!(SessionId::parse("not-a-uuid").is_none());
    }
}
