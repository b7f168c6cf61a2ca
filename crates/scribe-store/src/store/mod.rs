//! Session store implementation using SQLite.
//!
//! Provides persistent storage for session records using rusqlite.
//! Record CRUD lives in `session_ops`; this module owns the connection
//! and the schema.

mod session_ops;

use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

// ─────────────────────────────────────────────────────────────────────────────
// Schema Version
// ─────────────────────────────────────────────────────────────────────────────

/// Current schema version for migrations.
pub const SCHEMA_VERSION: i32 = 1;

// ─────────────────────────────────────────────────────────────────────────────
// Session Store
// ─────────────────────────────────────────────────────────────────────────────

/// Session store backed by SQLite.
///
/// Uses WAL mode so other components can read while the cache manager
/// deletes. The connection is serialized behind a mutex.
pub struct SessionStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Initialization
// ─────────────────────────────────────────────────────────────────────────────

impl SessionStore {
    /// Open or create a session store at the given path.
    ///
    /// Creates the database file and initializes the schema if it doesn't exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::Path {
                path: parent.display().to_string(),
                source: e,
            })?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_FULL_MUTEX,
        )?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize(true)?;

        info!("Session store opened at {:?}", path);
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize(false)?;

        debug!("In-memory session store created");
        Ok(store)
    }

    /// Schema version recorded in the database.
    pub fn schema_version(&self) -> Result<i32> {
        let conn = self.conn();
        Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
    }

    pub(crate) fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Initialize the database with schema and pragmas.
    fn initialize(&self, wal: bool) -> Result<()> {
        let conn = self.conn();

        if wal {
            conn.pragma_update(None, "journal_mode", "WAL")?;
            conn.pragma_update(None, "synchronous", "NORMAL")?;
        }

        Self::create_schema(&conn)
    }

    /// Create the database schema.
    fn create_schema(conn: &Connection) -> Result<()> {
        let current_version: i32 = conn
            .pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap_or(0);

        if current_version >= SCHEMA_VERSION {
            debug!("Schema up to date (version {})", current_version);
            return Ok(());
        }

        info!("Creating schema version {}", SCHEMA_VERSION);

        conn.execute_batch(
            r#"
            -- Sessions table: recordings, transcripts and notes
            CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                title TEXT,
                transcript TEXT,
                notes TEXT,
                has_audio INTEGER NOT NULL DEFAULT 0,
                duration_secs INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            );

            -- Eviction walks sessions oldest first
            CREATE INDEX IF NOT EXISTS idx_sessions_created_at
                ON sessions(created_at, id);
            "#,
        )?;

        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;

        Ok(())
    }
}
