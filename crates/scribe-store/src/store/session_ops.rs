//! Session CRUD and the record-store interface.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{OptionalExtension, params};
use scribe_session::{RecordStore, SessionRecord};
use tracing::debug;

use crate::error::{Result, StoreError};

use super::SessionStore;

const SESSION_COLUMNS: &str =
    "id, title, transcript, notes, has_audio, duration_secs, created_at";

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// SQLite integers are signed; reject durations that do not fit.
fn encode_duration(session: &SessionRecord) -> Result<i64> {
    i64::try_from(session.duration_secs).map_err(|_| {
        StoreError::InvalidData(format!(
            "session {}: duration {}s out of range",
            session.id, session.duration_secs
        ))
    })
}

impl SessionStore {
    /// Insert a new session.
    pub fn insert_session(&self, session: &SessionRecord) -> Result<()> {
        let duration_secs = encode_duration(session)?;
        let conn = self.conn();

        conn.execute(
            r#"
            INSERT INTO sessions (id, title, transcript, notes, has_audio, duration_secs, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                session.id,
                session.title,
                session.transcript,
                session.notes,
                session.has_audio,
                duration_secs,
                encode_timestamp(&session.created_at),
            ],
        )?;

        debug!("Inserted session {}", session.id);
        Ok(())
    }

    /// Get a session by ID.
    pub fn get_session(&self, id: &str) -> Result<Option<SessionRecord>> {
        let conn = self.conn();

        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE id = ?1");
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt.query_row(params![id], RawSession::from_row).optional()?;

        raw.map(RawSession::into_record).transpose()
    }

    /// Update a session's content. The creation time is left unchanged.
    pub fn update_session(&self, session: &SessionRecord) -> Result<()> {
        let duration_secs = encode_duration(session)?;
        let conn = self.conn();

        let rows_affected = conn.execute(
            r#"
            UPDATE sessions
            SET title = ?2, transcript = ?3, notes = ?4, has_audio = ?5, duration_secs = ?6
            WHERE id = ?1
            "#,
            params![
                session.id,
                session.title,
                session.transcript,
                session.notes,
                session.has_audio,
                duration_secs,
            ],
        )?;

        if rows_affected == 0 {
            return Err(StoreError::NotFound(format!("Session {}", session.id)));
        }

        Ok(())
    }

    /// Delete a session by ID. Returns whether a row was removed.
    pub fn delete_session(&self, id: &str) -> Result<bool> {
        let conn = self.conn();

        let rows_affected = conn.execute("DELETE FROM sessions WHERE id = ?1", params![id])?;

        Ok(rows_affected > 0)
    }

    /// Delete every session, returning how many were removed.
    pub fn delete_all_sessions(&self) -> Result<usize> {
        let conn = self.conn();
        let rows_affected = conn.execute("DELETE FROM sessions", [])?;
        debug!("Deleted {} sessions", rows_affected);
        Ok(rows_affected)
    }

    /// List sessions ordered by creation time, oldest first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>> {
        let conn = self.conn();

        let sql = format!("SELECT {SESSION_COLUMNS} FROM sessions ORDER BY created_at ASC, id ASC");
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map([], RawSession::from_row)?;

        let mut sessions = Vec::new();
        for raw in rows {
            sessions.push(raw?.into_record()?);
        }

        Ok(sessions)
    }

    /// Number of stored sessions.
    pub fn count_sessions(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

/// Column values as read, before timestamp decoding.
struct RawSession {
    id: String,
    title: Option<String>,
    transcript: Option<String>,
    notes: Option<String>,
    has_audio: bool,
    duration_secs: i64,
    created_at: String,
}

impl RawSession {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            transcript: row.get(2)?,
            notes: row.get(3)?,
            has_audio: row.get(4)?,
            duration_secs: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<SessionRecord> {
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map_err(|e| StoreError::InvalidData(format!("session {}: {e}", self.id)))?
            .with_timezone(&Utc);
        let duration_secs = u64::try_from(self.duration_secs).map_err(|_| {
            StoreError::InvalidData(format!(
                "session {}: negative duration {}",
                self.id, self.duration_secs
            ))
        })?;

        Ok(SessionRecord {
            id: self.id,
            created_at,
            title: self.title,
            transcript: self.transcript,
            notes: self.notes,
            has_audio: self.has_audio,
            duration_secs,
        })
    }
}

impl RecordStore for SessionStore {
    fn fetch_all(&self) -> scribe_session::Result<Vec<SessionRecord>> {
        Ok(self.list_sessions()?)
    }

    fn count(&self) -> scribe_session::Result<usize> {
        Ok(self.count_sessions()?)
    }

    fn delete(&self, session_id: &str) -> scribe_session::Result<()> {
        self.delete_session(session_id)?;
        Ok(())
    }

    fn delete_all(&self) -> scribe_session::Result<usize> {
        Ok(self.delete_all_sessions()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn create_test_store() -> SessionStore {
        SessionStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_session_crud() {
        let store = create_test_store();

        let session = SessionRecord::new(uuid::Uuid::new_v4().to_string())
            .with_title("Design review")
            .with_transcript("we agreed on the plan")
            .with_audio(120);
        store.insert_session(&session).unwrap();

        let fetched = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(fetched.title, Some("Design review".to_string()));
        assert_eq!(fetched.duration_secs, 120);
        assert!(fetched.has_audio);
        assert_eq!(
            fetched.created_at.timestamp_micros(),
            session.created_at.timestamp_micros()
        );

        let updated = fetched.with_notes("follow up with infra");
        store.update_session(&updated).unwrap();

        let fetched = store.get_session(&session.id).unwrap().unwrap();
        assert_eq!(fetched.notes, Some("follow up with infra".to_string()));

        assert!(store.delete_session(&session.id).unwrap());
        assert!(store.get_session(&session.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_session() {
        let store = create_test_store();
        let result = store.update_session(&SessionRecord::new("missing"));
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_oversized_duration_rejected() {
        let store = create_test_store();
        let session = SessionRecord::new("endless").with_audio(u64::MAX);

        let result = store.insert_session(&session);

        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert!(store.get_session("endless").unwrap().is_none());

        store.insert_session(&SessionRecord::new("endless")).unwrap();
        let result = store.update_session(&session);
        assert!(matches!(result, Err(StoreError::InvalidData(_))));
        assert_eq!(store.get_session("endless").unwrap().unwrap().duration_secs, 0);
    }

    #[test]
    fn test_negative_duration_is_invalid_data() {
        let store = create_test_store();
        store.insert_session(&SessionRecord::new("corrupt")).unwrap();
        store
            .conn()
            .execute("UPDATE sessions SET duration_secs = -5 WHERE id = 'corrupt'", [])
            .unwrap();

        assert!(matches!(
            store.get_session("corrupt"),
            Err(StoreError::InvalidData(_))
        ));
    }

    #[test]
    fn test_duplicate_insert_fails() {
        let store = create_test_store();
        store.insert_session(&SessionRecord::new("session-1")).unwrap();
        assert!(store.insert_session(&SessionRecord::new("session-1")).is_err());
    }

    #[test]
    fn test_list_orders_by_creation() {
        let store = create_test_store();
        let base = Utc::now();
        store
            .insert_session(&SessionRecord::new("late").with_created_at(base + TimeDelta::hours(1)))
            .unwrap();
        store
            .insert_session(&SessionRecord::new("early").with_created_at(base - TimeDelta::hours(1)))
            .unwrap();
        store
            .insert_session(&SessionRecord::new("middle").with_created_at(base))
            .unwrap();

        let ids: Vec<_> = store
            .list_sessions()
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["early", "middle", "late"]);
    }

    #[test]
    fn test_record_store_delete_is_idempotent() {
        let store = create_test_store();
        store.insert_session(&SessionRecord::new("session-1")).unwrap();

        RecordStore::delete(&store, "session-1").unwrap();
        RecordStore::delete(&store, "session-1").unwrap();

        assert_eq!(RecordStore::count(&store).unwrap(), 0);
    }

    #[test]
    fn test_record_store_delete_all() {
        let store = create_test_store();
        for i in 0..3 {
            store
                .insert_session(&SessionRecord::new(format!("session-{i}")))
                .unwrap();
        }

        assert_eq!(RecordStore::delete_all(&store).unwrap(), 3);
        assert!(RecordStore::fetch_all(&store).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cache_manager_over_sqlite() {
        use scribe_session::{CacheConfig, CacheManager};
        use std::sync::Arc;
        use std::time::Duration;

        let store = Arc::new(create_test_store());
        let base = Utc::now() - TimeDelta::days(1);
        for i in 0..5 {
            store
                .insert_session(
                    &SessionRecord::new(format!("session-{i}"))
                        .with_created_at(base + TimeDelta::minutes(i)),
                )
                .unwrap();
        }

        let config = CacheConfig::new()
            .with_max_total_size(1000)
            .with_grace_window(Duration::ZERO)
            .with_estimator(300, 1000);
        let manager = CacheManager::new(config, Arc::clone(&store)).unwrap();

        manager.update_cache_stats().await;
        let report = manager.perform_lru_cleanup().await.unwrap();

        assert_eq!(report.evicted, vec!["session-0", "session-1", "session-2"]);
        assert_eq!(store.count_sessions().unwrap(), 2);
        assert_eq!(manager.cache_configuration().session_count, 2);
    }
}
