//! Session cache manager with a storage budget.
//!
//! This crate keeps the locally resident set of session records
//! (recordings, transcripts, notes) under a fixed size budget:
//! - Size estimation from a record's constituent parts
//! - A recency index of last-access times
//! - Eviction of least-recently-used sessions down to a hysteresis
//!   watermark, skipping sessions touched within a grace window
//! - A record-store trait so any backend can hold the actual content
//!
//! # Example
//!
//! ```rust,ignore
//! use scribe_session::{CacheConfig, CacheManager, MemoryRecordStore};
//!
//! let config = CacheConfig::default()
//!     .with_max_total_size(200 * 1024 * 1024)
//!     .with_grace_window(Duration::from_secs(3600));
//!
//! let manager = CacheManager::new(config, Arc::new(MemoryRecordStore::new()))?;
//! manager.update_cache_stats().await;
//! manager.record_access("session-1");
//! ```

mod cache;
mod config;
mod error;
mod estimator;
mod eviction;
mod recency;
mod store;

pub use cache::{BackgroundReport, CacheConfiguration, CacheManager, CacheStats, PressureLevel};
pub use config::CacheConfig;
pub use error::{Error, Result};
pub use estimator::SizeEstimator;
pub use eviction::{CleanupPlan, CleanupReport, EvictionCandidate};
pub use recency::RecencyIndex;
pub use store::{MemoryRecordStore, RecordStore, SessionRecord};
