//! Cache manager enforcing the storage budget.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, MutexGuard, RwLock};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::estimator::SizeEstimator;
use crate::eviction::{CleanupPlan, CleanupReport, select_victims};
use crate::recency::{RecencyIndex, cutoff};
use crate::store::{MemoryRecordStore, RecordStore};

/// Whether an eviction or clear is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CleanupState {
    Idle,
    CleaningUp,
}

/// Cached size statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Sum of estimated session sizes in bytes.
    pub total_size: u64,

    /// Number of sessions in the record store.
    pub session_count: usize,

    /// When the statistics were last refreshed from the store.
    pub refreshed_at: Option<DateTime<Utc>>,
}

/// Usage level relative to the budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    /// Below the hysteresis watermark.
    Ok,
    /// At or above the watermark, within the hard cap.
    Warning,
    /// Above the hard cap; eviction is due.
    Critical,
}

impl std::fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PressureLevel::Ok => write!(f, "ok"),
            PressureLevel::Warning => write!(f, "warning"),
            PressureLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Snapshot of cache limits and usage handed to callers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheConfiguration {
    /// Hard cap in bytes.
    pub max_total_size: u64,
    /// Informational per-session upper bound.
    pub max_session_size: u64,
    /// Informational per-session lower bound.
    pub min_session_size: u64,
    /// Last known total estimated size.
    pub current_size: u64,
    /// Last known session count.
    pub session_count: usize,
    /// Hysteresis watermark in bytes.
    pub target_size: u64,
}

impl CacheConfiguration {
    /// Fraction of the hard cap in use.
    pub fn usage_ratio(&self) -> f64 {
        if self.max_total_size == 0 {
            return 0.0;
        }
        self.current_size as f64 / self.max_total_size as f64
    }

    /// Usage level for display.
    pub fn pressure(&self) -> PressureLevel {
        if self.current_size > self.max_total_size {
            PressureLevel::Critical
        } else if self.current_size >= self.target_size {
            PressureLevel::Warning
        } else {
            PressureLevel::Ok
        }
    }
}

/// Result of a lifecycle-triggered background cleanup.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BackgroundReport {
    /// Recency entries forgotten for being older than the staleness horizon.
    pub pruned: usize,
    /// Eviction pass, if the cache was over budget.
    pub cleanup: Option<CleanupReport>,
}

/// State shared between the manager handle and spawned passes.
struct CacheInner<S: RecordStore> {
    config: CacheConfig,
    estimator: SizeEstimator,
    store: Arc<S>,
    recency: Mutex<RecencyIndex>,
    /// Accesses recorded while the index was held by an eviction.
    pending: Mutex<Vec<(String, DateTime<Utc>)>>,
    state: Mutex<CleanupState>,
    stats: RwLock<CacheStats>,
    /// Bumped whenever records are deleted. A refresh whose listing
    /// predates the bump is discarded.
    generation: AtomicU64,
}

/// Returns the state to `Idle` when dropped, however the pass ends.
struct CleanupGuard<S: RecordStore> {
    inner: Arc<CacheInner<S>>,
}

impl<S: RecordStore> Drop for CleanupGuard<S> {
    fn drop(&mut self) {
        *self.inner.state.lock() = CleanupState::Idle;
    }
}

/// Session cache manager.
///
/// Keeps the aggregate estimated size of all sessions in the record store
/// under `max_total_size`:
/// - Callers report accesses with [`record_access`](Self::record_access)
/// - Over budget, the least recently used sessions are deleted down to the
///   hysteresis watermark, oldest-created first
/// - Sessions accessed within the grace window are never evicted
/// - At most one eviction or clear runs at a time; extra requests are dropped
///
/// Statistics start at zero. Hosts call
/// [`update_cache_stats`](Self::update_cache_stats) at startup so that
/// access-triggered eviction has a size to compare against.
pub struct CacheManager<S: RecordStore + 'static = MemoryRecordStore> {
    inner: Arc<CacheInner<S>>,
}

impl<S: RecordStore + 'static> CacheManager<S> {
    /// Create a manager bound to a record store.
    pub fn new(config: CacheConfig, store: Arc<S>) -> Result<Self> {
        config.validate()?;
        let estimator = SizeEstimator::from_config(&config);

        let inner = CacheInner {
            config,
            estimator,
            store,
            recency: Mutex::new(RecencyIndex::new()),
            pending: Mutex::new(Vec::new()),
            state: Mutex::new(CleanupState::Idle),
            stats: RwLock::new(CacheStats::default()),
            generation: AtomicU64::new(0),
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Get the cache configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Get the size estimator in use.
    pub fn estimator(&self) -> &SizeEstimator {
        &self.inner.estimator
    }

    /// Get the underlying record store.
    pub fn store(&self) -> &Arc<S> {
        &self.inner.store
    }

    /// Last known statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.read().clone()
    }

    /// Whether an eviction or clear is in flight.
    pub fn is_cleaning_up(&self) -> bool {
        *self.inner.state.lock() == CleanupState::CleaningUp
    }

    /// Number of sessions in the recency index.
    pub fn tracked_sessions(&self) -> usize {
        self.inner.recency().len()
    }

    /// Last recorded access for a session.
    pub fn last_access(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.inner.recency().last_access(session_id)
    }

    /// Note that a session was opened, loaded, or displayed.
    ///
    /// If the last known total exceeds the hard cap, an eviction pass is
    /// spawned on the current tokio runtime. The caller never waits for it,
    /// and never waits on an eviction that is deleting: the access is queued
    /// and applied before the next protection check.
    pub fn record_access(&self, session_id: &str) {
        match self.inner.recency.try_lock() {
            Some(mut recency) => recency.touch(session_id),
            None => self
                .inner
                .pending
                .lock()
                .push((session_id.to_string(), Utc::now())),
        }
        trace!(session_id = %session_id, "Session access recorded");

        let total = self.inner.stats.read().total_size;
        if total <= self.inner.config.max_total_size {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                debug!(
                    total_size = total,
                    max_total_size = self.inner.config.max_total_size,
                    "Cache over budget, scheduling cleanup"
                );
                let manager = self.clone();
                handle.spawn(async move {
                    manager.perform_lru_cleanup().await;
                });
            }
            Err(_) => {
                warn!("Cache over budget but no tokio runtime available; cleanup not scheduled");
            }
        }
    }

    /// Evict least recently used sessions down to the hysteresis watermark.
    ///
    /// Returns `None` without doing anything if another pass is running.
    pub async fn perform_lru_cleanup(&self) -> Option<CleanupReport> {
        let Some(guard) = self.try_begin() else {
            debug!("Cleanup already in progress, skipping");
            return None;
        };

        let outcome = tokio::task::spawn_blocking(move || {
            let report = guard.inner.evict();
            drop(guard);
            report
        })
        .await;

        match outcome {
            Ok(report) => Some(report),
            Err(e) => {
                warn!(error = %e, "Cleanup task failed");
                Some(CleanupReport::default())
            }
        }
    }

    /// Explicit user-triggered cleanup. Same semantics as
    /// [`perform_lru_cleanup`](Self::perform_lru_cleanup).
    pub async fn perform_manual_cleanup(&self) -> Option<CleanupReport> {
        info!("Manual cache cleanup requested");
        self.perform_lru_cleanup().await
    }

    /// Compute what a cleanup pass would delete, without deleting.
    pub async fn plan_cleanup(&self) -> Result<CleanupPlan> {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || inner.plan())
            .await
            .map_err(|e| Error::Store(format!("planning task failed: {e}")))?
    }

    /// Delete every session regardless of recency and reset the index.
    ///
    /// Returns the number of sessions removed, or `None` if another pass
    /// is running. Grace protection does not apply.
    pub async fn clear_all_cache(&self) -> Option<usize> {
        let Some(guard) = self.try_begin() else {
            debug!("Cleanup in progress, clear request dropped");
            return None;
        };

        let outcome = tokio::task::spawn_blocking(move || {
            let removed = guard.inner.clear_all();
            drop(guard);
            removed
        })
        .await;

        match outcome {
            Ok(removed) => Some(removed),
            Err(e) => {
                warn!(error = %e, "Clear task failed");
                Some(0)
            }
        }
    }

    /// Recompute total size and session count from the record store.
    ///
    /// On a store failure the previous statistics are kept.
    pub async fn update_cache_stats(&self) {
        let inner = Arc::clone(&self.inner);
        if let Err(e) = tokio::task::spawn_blocking(move || inner.refresh_stats()).await {
            warn!(error = %e, "Statistics refresh task failed");
        }
    }

    /// Lifecycle hook for process start or return to foreground.
    ///
    /// Forgets recency entries older than the staleness horizon, then runs
    /// an eviction pass if the cache is over budget. Pruning never deletes
    /// session data.
    pub async fn perform_background_cleanup(&self) -> BackgroundReport {
        let horizon = cutoff(Utc::now(), self.inner.config.staleness_horizon);
        let pruned = self.inner.recency().prune_older_than(horizon).len();
        if pruned > 0 {
            debug!(count = pruned, "Pruned stale recency entries");
        }

        let total = self.inner.stats.read().total_size;
        let cleanup = if total > self.inner.config.max_total_size {
            self.perform_lru_cleanup().await
        } else {
            None
        };

        BackgroundReport { pruned, cleanup }
    }

    /// Snapshot of limits and last known usage.
    pub fn cache_configuration(&self) -> CacheConfiguration {
        let stats = self.inner.stats.read();
        let config = &self.inner.config;
        CacheConfiguration {
            max_total_size: config.max_total_size,
            max_session_size: config.max_session_size,
            min_session_size: config.min_session_size,
            current_size: stats.total_size,
            session_count: stats.session_count,
            target_size: config.target_size(),
        }
    }

    fn try_begin(&self) -> Option<CleanupGuard<S>> {
        let mut state = self.inner.state.lock();
        if *state == CleanupState::CleaningUp {
            return None;
        }
        *state = CleanupState::CleaningUp;
        Some(CleanupGuard {
            inner: Arc::clone(&self.inner),
        })
    }
}

impl<S: RecordStore> CacheInner<S> {
    /// Lock the recency index, folding in queued accesses first.
    fn recency(&self) -> MutexGuard<'_, RecencyIndex> {
        let mut recency = self.recency.lock();
        let queued = std::mem::take(&mut *self.pending.lock());
        for (id, at) in queued {
            if recency.last_access(&id).is_none_or(|last| last < at) {
                recency.touch_at(&id, at);
            }
        }
        recency
    }

    fn plan(&self) -> Result<CleanupPlan> {
        let records = self.store.fetch_all()?;
        let start_size = self.stats.read().total_size;
        let recency = self.recency();
        Ok(select_victims(
            &records,
            &recency,
            &self.estimator,
            &self.config,
            start_size,
            Utc::now(),
        ))
    }

    fn evict(&self) -> CleanupReport {
        let started = Utc::now();
        let records = match self.store.fetch_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to list sessions for cleanup");
                return CleanupReport::default();
            }
        };

        let start_size = self.stats.read().total_size;
        let plan = {
            let recency = self.recency();
            select_victims(
                &records,
                &recency,
                &self.estimator,
                &self.config,
                start_size,
                started,
            )
        };
        let mut report = CleanupReport::from_plan(&plan);

        for candidate in plan.candidates {
            let id = candidate.session_id;
            // Hold the index while deleting so a concurrent access either
            // lands first and protects the session, or lands after removal.
            let mut recency = self.recency();
            if recency.is_protected(&id, Utc::now(), self.config.grace_window) {
                debug!(session_id = %id, "Session accessed during cleanup, keeping");
                report.touched_during_pass += 1;
                continue;
            }

            match self.store.delete(&id) {
                Ok(()) => {
                    recency.remove(&id);
                    debug!(session_id = %id, bytes = candidate.size, "Evicted session");
                    report.bytes_reclaimed += candidate.size;
                    report.evicted.push(id);
                }
                Err(e) => {
                    warn!(session_id = %id, error = %e, "Failed to evict session");
                    report.failed.push(id);
                }
            }
        }

        {
            let known: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
            let purged = self.recency().retain_known(&known, started);
            if purged > 0 {
                debug!(count = purged, "Purged recency entries for missing sessions");
            }
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        self.refresh_stats();
        report.size_after = self.stats.read().total_size;

        info!(
            evicted = report.evicted.len(),
            protected = report.protected,
            failed = report.failed.len(),
            bytes_reclaimed = report.bytes_reclaimed,
            size_before = report.size_before,
            size_after = report.size_after,
            target_size = report.target_size,
            "Cache cleanup finished"
        );

        report
    }

    fn clear_all(&self) -> usize {
        let result = self.store.delete_all();
        self.generation.fetch_add(1, Ordering::SeqCst);
        match result {
            Ok(removed) => {
                self.recency().clear();
                *self.stats.write() = CacheStats {
                    total_size: 0,
                    session_count: 0,
                    refreshed_at: Some(Utc::now()),
                };
                info!(removed, "Cleared all cached sessions");
                removed
            }
            Err(e) => {
                warn!(error = %e, "Failed to clear cached sessions");
                self.refresh_stats();
                0
            }
        }
    }

    /// Recompute statistics from one listing.
    ///
    /// Size and count come from the same snapshot. If records were deleted
    /// while the listing was in flight, the result is dropped and the
    /// deleting pass publishes its own.
    fn refresh_stats(&self) {
        let generation = self.generation.load(Ordering::SeqCst);
        let records = match self.store.fetch_all() {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to list sessions, keeping previous statistics");
                return;
            }
        };

        let total_size = self.estimator.estimate_all(&records);
        let session_count = records.len();

        let mut stats = self.stats.write();
        if self.generation.load(Ordering::SeqCst) != generation {
            debug!(total_size, session_count, "Discarding statistics listed before a deletion");
            return;
        }
        *stats = CacheStats {
            total_size,
            session_count,
            refreshed_at: Some(Utc::now()),
        };
        trace!(total_size, session_count, "Cache statistics refreshed");
    }
}

impl<S: RecordStore + 'static> Clone for CacheManager<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
