//! Approximate storage footprint of a session.

use crate::config::{CacheConfig, DEFAULT_AUDIO_BYTES_PER_SEC, DEFAULT_BASE_OVERHEAD};
use crate::store::SessionRecord;

/// Estimates session size for budget comparisons.
///
/// The result is only ever compared against the cache budget, so a stable
/// approximation is enough. Estimation is pure and may be called any number
/// of times on the same record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeEstimator {
    base_overhead: u64,
    audio_bytes_per_sec: u64,
}

impl Default for SizeEstimator {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_OVERHEAD, DEFAULT_AUDIO_BYTES_PER_SEC)
    }
}

impl SizeEstimator {
    /// Create an estimator with explicit constants.
    pub fn new(base_overhead: u64, audio_bytes_per_sec: u64) -> Self {
        Self {
            base_overhead,
            audio_bytes_per_sec,
        }
    }

    /// Create an estimator from cache configuration.
    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.base_overhead, config.audio_bytes_per_sec)
    }

    /// Estimated size in bytes.
    ///
    /// `base + len(transcript) + len(notes) + audio`, where audio is
    /// `duration_secs * audio_bytes_per_sec` when a recording is attached.
    pub fn estimate(&self, record: &SessionRecord) -> u64 {
        let text = |s: &Option<String>| s.as_ref().map_or(0, |s| s.len() as u64);

        let audio = if record.has_audio {
            record.duration_secs.saturating_mul(self.audio_bytes_per_sec)
        } else {
            0
        };

        self.base_overhead
            .saturating_add(text(&record.transcript))
            .saturating_add(text(&record.notes))
            .saturating_add(audio)
    }

    /// Sum of estimates over a set of records.
    pub fn estimate_all<'a>(&self, records: impl IntoIterator<Item = &'a SessionRecord>) -> u64 {
        records
            .into_iter()
            .fold(0u64, |acc, r| acc.saturating_add(self.estimate(r)))
    }
}
