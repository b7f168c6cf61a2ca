//! Session record storage for Scribe.
//!
//! A single SQLite file (WAL mode) holds session metadata and content:
//! titles, transcripts, notes, and recording length. [`SessionStore`]
//! implements [`scribe_session::RecordStore`] so the cache manager can
//! size and evict sessions directly against the database.
//!
//! # Usage
//!
//! ```no_run
//! use scribe_session::SessionRecord;
//! use scribe_store::SessionStore;
//!
//! let store = SessionStore::open("/tmp/scribe/sessions.db")?;
//!
//! let record = SessionRecord::new("standup-2026-10-16")
//!     .with_title("Standup")
//!     .with_audio(900);
//! store.insert_session(&record)?;
//!
//! assert_eq!(store.count_sessions()?, 1);
//! # Ok::<(), scribe_store::StoreError>(())
//! ```

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::{SCHEMA_VERSION, SessionStore};
