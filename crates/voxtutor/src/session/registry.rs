//! Active-session registry.
//!
//! An in-memory index from vendor session id to lightweight runtime
//! metadata, covering exactly the sessions whose persisted record is in
//! the Active or Paused window. Entries never own the record; the
//! lifecycle manager is the only writer of persisted state.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Runtime metadata for one Active or Paused session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSession {
    /// Persisted record id this entry points at.
    pub record_id: String,
    /// Owning user.
    pub user_id: String,
    /// Wall-clock creation time, used by the expiry sweep.
    pub started_at: DateTime<Utc>,
}

/// Registry of live sessions.
///
/// Thread-safe and cheap to clone. Removal is atomic: concurrent
/// finalizers racing on the same session see exactly one `Some`, which
/// is what makes end-of-session side effects run exactly once.
#[derive(Clone, Default)]
pub struct ActiveSessions {
    entries: Arc<DashMap<String, ActiveSession>>,
}

impl ActiveSessions {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session under its vendor session id.
    pub fn insert(&self, vendor_session_id: impl Into<String>, entry: ActiveSession) {
        self.entries.insert(vendor_session_id.into(), entry);
    }

    /// Look up a session's runtime metadata.
    pub fn get(&self, vendor_session_id: &str) -> Option<ActiveSession> {
        self.entries.get(vendor_session_id).map(|r| r.clone())
    }

    /// Check if a session is registered.
    pub fn contains(&self, vendor_session_id: &str) -> bool {
        self.entries.contains_key(vendor_session_id)
    }

    /// Deregister a session, returning its entry if it was present.
    ///
    /// Exactly one of any number of concurrent callers gets the entry.
    pub fn remove(&self, vendor_session_id: &str) -> Option<ActiveSession> {
        self.entries.remove(vendor_session_id).map(|(_, entry)| entry)
    }

    /// Snapshot the sessions started before `cutoff`.
    ///
    /// Collects into a Vec so callers never hold map references across
    /// await points.
    pub fn started_before(&self, cutoff: DateTime<Utc>) -> Vec<(String, ActiveSession)> {
        self.entries
            .iter()
            .filter(|entry| entry.value().started_at < cutoff)
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect()
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no sessions are live.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn entry(record_id: &str, user_id: &str, age_minutes: i64) -> ActiveSession {
        ActiveSession {
            record_id: record_id.to_string(),
            user_id: user_id.to_string(),
            started_at: Utc::now() - Duration::minutes(age_minutes),
        }
    }

    #[test]
    fn insert_get_and_contains() {
        let registry = ActiveSessions::new();
        assert!(registry.is_empty());

        registry.insert("vnd-1", entry("lsn_1", "user-1", 0));

        assert!(registry.contains("vnd-1"));
        assert!(!registry.contains("vnd-2"));
        assert_eq!(registry.len(), 1);

        let found = registry.get("vnd-1").unwrap();
        assert_eq!(found.record_id, "lsn_1");
        assert_eq!(found.user_id, "user-1");
    }

    #[test]
    fn remove_returns_entry_exactly_once() {
        let registry = ActiveSessions::new();
        registry.insert("vnd-1", entry("lsn_1", "user-1", 0));

        assert!(registry.remove("vnd-1").is_some());
        assert!(registry.remove("vnd-1").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn started_before_filters_by_age() {
        let registry = ActiveSessions::new();
        registry.insert("vnd-old", entry("lsn_1", "user-1", 90));
        registry.insert("vnd-new", entry("lsn_2", "user-1", 5));

        let cutoff = Utc::now() - Duration::minutes(60);
        let stale = registry.started_before(cutoff);

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].0, "vnd-old");
    }

    #[test]
    fn concurrent_removal_yields_one_winner() {
        let registry = ActiveSessions::new();
        registry.insert("vnd-1", entry("lsn_1", "user-1", 0));

        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let registry = registry.clone();
                    scope.spawn(move || registry.remove("vnd-1").is_some() as usize)
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(winners, 1);
    }
}
