//! Per-session form state with TTL expiry.
//!
//! Holds what a browser would otherwise keep in local storage: the last
//! submitted inputs and the last generated timetable.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::{Duration, Instant};

use super::types::{GeneratedTimetable, TimetableInputs};

/// A session key derived from the client's session token.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
pub struct SessionKey(String);

impl SessionKey {
    /// Creates a session key from a raw token.
    ///
    /// The token is hashed so it is never kept as-is.
    pub fn from_token(token: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        let result = hasher.finalize();
        // First 16 bytes as hex
        let hash = hex::encode(&result[..16]);
        Self(hash)
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}...", &self.0[..8.min(self.0.len())])
    }
}

/// Cached form state for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub inputs: Option<TimetableInputs>,
    pub last_generated: Option<GeneratedTimetable>,
}

#[derive(Clone)]
struct CachedSession {
    state: SessionState,
    touched_at: Instant,
}

/// Thread-safe session state store.
pub struct SessionStore {
    entries: DashMap<SessionKey, CachedSession>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Gets the state of a session if it exists and hasn't expired.
    pub fn get(&self, key: &SessionKey) -> Option<SessionState> {
        self.entries.get(key).and_then(|entry| {
            if entry.touched_at.elapsed() < self.ttl {
                Some(entry.state.clone())
            } else {
                drop(entry);
                self.entries.remove(key);
                None
            }
        })
    }

    /// Replaces the state of a session.
    pub fn insert(&self, key: SessionKey, state: SessionState) {
        self.entries.insert(
            key,
            CachedSession {
                state,
                touched_at: Instant::now(),
            },
        );
    }

    /// Applies `f` to the session's current state (empty if none) and stores
    /// the result, which is also returned.
    pub fn update<F>(&self, key: SessionKey, f: F) -> SessionState
    where
        F: FnOnce(SessionState) -> SessionState,
    {
        let current = self.get(&key).unwrap_or_default();
        let next = f(current);
        self.insert(key, next.clone());
        next
    }

    /// Records the inputs last submitted by a session.
    pub fn record_inputs(&self, key: SessionKey, inputs: TimetableInputs) -> SessionState {
        self.update(key, |state| SessionState {
            inputs: Some(inputs),
            ..state
        })
    }

    /// Records a freshly generated timetable and the inputs behind it.
    pub fn record_generated(&self, key: SessionKey, generated: GeneratedTimetable) -> SessionState {
        self.update(key, |_| SessionState {
            inputs: Some(generated.inputs.clone()),
            last_generated: Some(generated),
        })
    }

    /// Removes a session.
    pub fn invalidate(&self, key: &SessionKey) {
        self.entries.remove(key);
    }

    /// Returns the number of sessions (including expired ones).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes expired sessions.
    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.touched_at.elapsed() < ttl);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(Duration::from_secs(60 * 60))
    }
}

mod hex {
    pub fn encode(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridConfig;
    use crate::timetable::types::WeeklyGrid;
    use chrono::Utc;

    #[test]
    fn test_session_key_hashing() {
        let key1 = SessionKey::from_token("session123");
        let key2 = SessionKey::from_token("session123");
        let key3 = SessionKey::from_token("session456");

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.0.len(), 32);
        assert!(!key1.0.contains("session123"));
    }

    #[test]
    fn test_generated_overwrites_inputs() {
        let store = SessionStore::default();
        let key = SessionKey::from_token("abc");

        let mut first = TimetableInputs::default();
        first.department = "CSE".to_string();
        store.record_inputs(key.clone(), first);

        let mut second = TimetableInputs::default();
        second.department = "ECE".to_string();
        store.record_generated(
            key.clone(),
            GeneratedTimetable {
                inputs: second,
                timetable: WeeklyGrid::new(&GridConfig::default()),
                generated_at: Utc::now(),
            },
        );

        let state = store.get(&key).unwrap();
        assert_eq!(state.inputs.unwrap().department, "ECE");
        assert!(state.last_generated.is_some());
    }

    #[test]
    fn test_expired_sessions_dropped() {
        let store = SessionStore::new(Duration::from_millis(0));
        let key = SessionKey::from_token("abc");
        store.insert(key.clone(), SessionState::default());

        assert!(store.get(&key).is_none());
        store.insert(key, SessionState::default());
        store.cleanup_expired();
        assert!(store.is_empty());
    }
}
