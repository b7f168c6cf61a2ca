//! Victim selection for a cleanup pass.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::trace;

use crate::config::CacheConfig;
use crate::estimator::SizeEstimator;
use crate::recency::RecencyIndex;
use crate::store::SessionRecord;

/// A session chosen for eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EvictionCandidate {
    /// Session to delete.
    pub session_id: String,
    /// Estimated bytes freed by deleting it.
    pub size: u64,
}

/// Outcome of the selection walk, before anything is deleted.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupPlan {
    /// Total size the walk started from (last known statistics).
    pub size_before: u64,
    /// Hysteresis watermark the walk aimed for.
    pub target_size: u64,
    /// Size expected once every candidate is deleted.
    pub projected_size: u64,
    /// Number of sessions the walk looked at before stopping.
    pub sessions_examined: usize,
    /// Sessions skipped because they were accessed within the grace window.
    pub protected: usize,
    /// Sessions to delete, oldest first.
    pub candidates: Vec<EvictionCandidate>,
}

impl CleanupPlan {
    /// Whether the walk found nothing to delete.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Whether the plan reaches the watermark.
    pub fn reaches_target(&self) -> bool {
        self.projected_size <= self.target_size
    }
}

/// Result of an executed cleanup pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CleanupReport {
    /// Number of sessions the walk looked at.
    pub sessions_examined: usize,
    /// Sessions deleted from the store.
    pub evicted: Vec<String>,
    /// Estimated bytes reclaimed.
    pub bytes_reclaimed: u64,
    /// Sessions kept because of the grace window.
    pub protected: usize,
    /// Candidates kept because they were accessed while the pass ran.
    pub touched_during_pass: usize,
    /// Candidates whose deletion failed.
    pub failed: Vec<String>,
    /// Total size the pass started from.
    pub size_before: u64,
    /// Total size after statistics were refreshed.
    pub size_after: u64,
    /// Hysteresis watermark.
    pub target_size: u64,
}

impl CleanupReport {
    pub(crate) fn from_plan(plan: &CleanupPlan) -> Self {
        Self {
            sessions_examined: plan.sessions_examined,
            protected: plan.protected,
            size_before: plan.size_before,
            target_size: plan.target_size,
            ..Default::default()
        }
    }
}

/// Walk sessions oldest-created first and pick victims until the running
/// size reaches the watermark.
///
/// Sessions with no access record, or whose last access is older than the
/// grace window, are chosen. Recently accessed sessions are skipped. If
/// every remaining session is protected the plan stays above target.
pub(crate) fn select_victims(
    records: &[SessionRecord],
    recency: &RecencyIndex,
    estimator: &SizeEstimator,
    config: &CacheConfig,
    start_size: u64,
    now: DateTime<Utc>,
) -> CleanupPlan {
    let mut ordered: Vec<&SessionRecord> = records.iter().collect();
    ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let target_size = config.target_size();
    let mut current = start_size;
    let mut plan = CleanupPlan {
        size_before: start_size,
        target_size,
        projected_size: start_size,
        sessions_examined: 0,
        protected: 0,
        candidates: Vec::new(),
    };

    for record in ordered {
        if current <= target_size {
            break;
        }
        plan.sessions_examined += 1;

        if recency.is_protected(&record.id, now, config.grace_window) {
            trace!(session_id = %record.id, "Session within grace window, skipping");
            plan.protected += 1;
            continue;
        }

        let size = estimator.estimate(record);
        current = current.saturating_sub(size);
        plan.candidates.push(EvictionCandidate {
            session_id: record.id.clone(),
            size,
        });
    }

    plan.projected_size = current;
    plan
}
