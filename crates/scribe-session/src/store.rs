//! Record store interface used by the cache manager.
//!
//! The cache manager never owns session content. It reads sizes from and
//! deletes through a [`RecordStore`], which any backend (SQLite, in-memory,
//! remote) can implement.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Read-only view of a persisted session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Unique identifier for the session.
    pub id: String,

    /// Primary timestamp; older sessions are evicted first on recency ties.
    pub created_at: DateTime<Utc>,

    /// Display title.
    pub title: Option<String>,

    /// Transcript text, if transcribed.
    pub transcript: Option<String>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// Whether a recording is attached.
    pub has_audio: bool,

    /// Recording length in seconds.
    pub duration_secs: u64,
}

impl SessionRecord {
    /// Create an empty session record created now.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            created_at: Utc::now(),
            title: None,
            transcript: None,
            notes: None,
            has_audio: false,
            duration_secs: 0,
        }
    }

    /// Set creation timestamp.
    pub fn with_created_at(mut self, ts: DateTime<Utc>) -> Self {
        self.created_at = ts;
        self
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set transcript text.
    pub fn with_transcript(mut self, transcript: impl Into<String>) -> Self {
        self.transcript = Some(transcript.into());
        self
    }

    /// Set notes text.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Attach a recording of the given length.
    pub fn with_audio(mut self, duration_secs: u64) -> Self {
        self.has_audio = true;
        self.duration_secs = duration_secs;
        self
    }
}

/// Trait for record store backends.
///
/// Implementations must tolerate concurrent readers and writers from
/// other components; the cache manager does not own the store.
pub trait RecordStore: Send + Sync {
    /// Return every persisted session.
    fn fetch_all(&self) -> Result<Vec<SessionRecord>>;

    /// Number of persisted sessions.
    fn count(&self) -> Result<usize>;

    /// Remove a session. Deleting an absent id is not an error.
    fn delete(&self, session_id: &str) -> Result<()>;

    /// Remove every session, returning how many were removed.
    fn delete_all(&self) -> Result<usize>;
}

/// In-process record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemoryRecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a session.
    pub fn insert(&self, record: SessionRecord) {
        self.records.write().insert(record.id.clone(), record);
    }

    /// Look up a session by id.
    pub fn get(&self, session_id: &str) -> Option<SessionRecord> {
        self.records.read().get(session_id).cloned()
    }

    /// Check whether a session exists.
    pub fn contains(&self, session_id: &str) -> bool {
        self.records.read().contains_key(session_id)
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Check if the store holds no sessions.
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl RecordStore for MemoryRecordStore {
    fn fetch_all(&self) -> Result<Vec<SessionRecord>> {
        let mut records: Vec<_> = self.records.read().values().cloned().collect();
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(records)
    }

    fn count(&self) -> Result<usize> {
        Ok(self.records.read().len())
    }

    fn delete(&self, session_id: &str) -> Result<()> {
        self.records.write().remove(session_id);
        Ok(())
    }

    fn delete_all(&self) -> Result<usize> {
        let mut records = self.records.write();
        let count = records.len();
        records.clear();
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_fetch_all_orders_by_creation() {
        let store = MemoryRecordStore::new();
        let base = Utc::now();
        store.insert(SessionRecord::new("b").with_created_at(base));
        store.insert(SessionRecord::new("a").with_created_at(base + Duration::seconds(5)));
        store.insert(SessionRecord::new("c").with_created_at(base - Duration::seconds(5)));

        let ids: Vec<_> = store
            .fetch_all()
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryRecordStore::new();
        store.insert(SessionRecord::new("session-1"));

        store.delete("session-1").unwrap();
        store.delete("session-1").unwrap();

        assert!(store.is_empty());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_all() {
        let store = MemoryRecordStore::new();
        for i in 0..4 {
            store.insert(SessionRecord::new(format!("session-{i}")));
        }

        assert_eq!(store.delete_all().unwrap(), 4);
        assert!(store.is_empty());
        assert_eq!(store.delete_all().unwrap(), 0);
    }
}
