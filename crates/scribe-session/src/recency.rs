//! Last-access tracking for eviction ordering.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// Tracks last access times per session.
///
/// This is the recency index: a plain `id -> timestamp` map. It is
/// approximate and rebuildable, and entries may outlive the sessions
/// they describe until an eviction pass or sweep purges them.
#[derive(Debug, Default)]
pub struct RecencyIndex {
    access_times: HashMap<String, DateTime<Utc>>,
}

/// The instant `window` before `now`, clamped to the earliest representable time.
pub(crate) fn cutoff(now: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

impl RecencyIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an access for a session now.
    pub fn touch(&mut self, session_id: &str) {
        self.touch_at(session_id, Utc::now());
    }

    /// Record an access at a specific time.
    pub fn touch_at(&mut self, session_id: &str, at: DateTime<Utc>) {
        self.access_times.insert(session_id.to_string(), at);
    }

    /// Last access time, if the session has been seen.
    pub fn last_access(&self, session_id: &str) -> Option<DateTime<Utc>> {
        self.access_times.get(session_id).copied()
    }

    /// Whether a session was accessed within `grace` of `now`.
    ///
    /// Sessions without an access record are never protected.
    pub fn is_protected(&self, session_id: &str, now: DateTime<Utc>, grace: Duration) -> bool {
        let since = cutoff(now, grace);
        match self.access_times.get(session_id) {
            None => false,
            Some(last_access) => *last_access >= since,
        }
    }

    /// Remove tracking for a session.
    pub fn remove(&mut self, session_id: &str) {
        self.access_times.remove(session_id);
    }

    /// Forget every entry last accessed before `cutoff`, returning their IDs.
    pub fn prune_older_than(&mut self, cutoff: DateTime<Utc>) -> Vec<String> {
        let stale: Vec<String> = self
            .access_times
            .iter()
            .filter(|(_, last_access)| **last_access < cutoff)
            .map(|(id, _)| id.clone())
            .collect();
        for id in &stale {
            self.access_times.remove(id);
        }
        stale
    }

    /// Drop entries for sessions missing from `known`.
    ///
    /// Only entries last touched before `observed_at` are dropped, so an
    /// access newer than the snapshot that produced `known` survives.
    pub fn retain_known(&mut self, known: &HashSet<&str>, observed_at: DateTime<Utc>) -> usize {
        let before = self.access_times.len();
        self.access_times
            .retain(|id, last_access| known.contains(id.as_str()) || *last_access >= observed_at);
        before - self.access_times.len()
    }

    /// Get the number of tracked sessions.
    pub fn len(&self) -> usize {
        self.access_times.len()
    }

    /// Check if there are no tracked sessions.
    pub fn is_empty(&self) -> bool {
        self.access_times.is_empty()
    }

    /// Clear all tracking data.
    pub fn clear(&mut self) {
        self.access_times.clear();
    }
}
