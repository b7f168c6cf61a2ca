//! Configuration for the session cache.

use std::time::Duration;

use crate::error::{Error, Result};

const MB: u64 = 1024 * 1024;

/// Default hard cap on the aggregate estimated size (200 MB).
pub const DEFAULT_MAX_TOTAL_SIZE: u64 = 200 * MB;

/// Default informational upper bound for a single session (75 MB).
pub const DEFAULT_MAX_SESSION_SIZE: u64 = 75 * MB;

/// Default informational lower bound for a single session (50 MB).
pub const DEFAULT_MIN_SESSION_SIZE: u64 = 50 * MB;

/// Sessions accessed within this window are never evicted.
pub const DEFAULT_GRACE_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Eviction stops once the total drops to this fraction of the hard cap.
pub const DEFAULT_TARGET_RATIO: f64 = 0.8;

/// Recency entries older than this are forgotten by the background sweep.
pub const DEFAULT_STALENESS_HORIZON: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// Fixed per-session metadata overhead used by the size estimator.
pub const DEFAULT_BASE_OVERHEAD: u64 = 1024;

/// Approximate audio footprint per second of recording.
pub const DEFAULT_AUDIO_BYTES_PER_SEC: u64 = 1000;

/// Configuration for the session cache.
///
/// Values are fixed for the lifetime of a [`CacheManager`](crate::CacheManager).
#[derive(Debug, Clone, PartialEq)]
pub struct CacheConfig {
    /// Hard cap in bytes. Exceeding it triggers eviction.
    pub max_total_size: u64,

    /// Reported to callers only; not enforced by eviction.
    pub max_session_size: u64,

    /// Reported to callers only; not enforced by eviction.
    pub min_session_size: u64,

    /// Sessions accessed more recently than this are protected from eviction.
    pub grace_window: Duration,

    /// Hysteresis watermark as a fraction of `max_total_size`.
    pub target_ratio: f64,

    /// Age after which recency entries are pruned by background cleanup.
    pub staleness_horizon: Duration,

    /// Estimator overhead per session in bytes.
    pub base_overhead: u64,

    /// Estimator audio rate in bytes per second.
    pub audio_bytes_per_sec: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_total_size: DEFAULT_MAX_TOTAL_SIZE,
            max_session_size: DEFAULT_MAX_SESSION_SIZE,
            min_session_size: DEFAULT_MIN_SESSION_SIZE,
            grace_window: DEFAULT_GRACE_WINDOW,
            target_ratio: DEFAULT_TARGET_RATIO,
            staleness_horizon: DEFAULT_STALENESS_HORIZON,
            base_overhead: DEFAULT_BASE_OVERHEAD,
            audio_bytes_per_sec: DEFAULT_AUDIO_BYTES_PER_SEC,
        }
    }
}

impl CacheConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hard cap on total estimated size.
    pub fn with_max_total_size(mut self, bytes: u64) -> Self {
        self.max_total_size = bytes;
        self
    }

    /// Set the informational per-session bounds.
    pub fn with_session_bounds(mut self, min: u64, max: u64) -> Self {
        self.min_session_size = min;
        self.max_session_size = max;
        self
    }

    /// Set the grace window. `Duration::ZERO` disables protection.
    pub fn with_grace_window(mut self, window: Duration) -> Self {
        self.grace_window = window;
        self
    }

    /// Set the hysteresis target ratio.
    pub fn with_target_ratio(mut self, ratio: f64) -> Self {
        self.target_ratio = ratio;
        self
    }

    /// Set the staleness horizon for recency pruning.
    pub fn with_staleness_horizon(mut self, horizon: Duration) -> Self {
        self.staleness_horizon = horizon;
        self
    }

    /// Set the estimator constants.
    pub fn with_estimator(mut self, base_overhead: u64, audio_bytes_per_sec: u64) -> Self {
        self.base_overhead = base_overhead;
        self.audio_bytes_per_sec = audio_bytes_per_sec;
        self
    }

    /// The eviction watermark: `floor(max_total_size * target_ratio)`.
    pub fn target_size(&self) -> u64 {
        (self.max_total_size as f64 * self.target_ratio).floor() as u64
    }

    /// Check that the values are usable together.
    pub fn validate(&self) -> Result<()> {
        if self.max_total_size == 0 {
            return Err(Error::InvalidConfig(
                "max_total_size must be greater than zero".to_string(),
            ));
        }
        if !(self.target_ratio > 0.0 && self.target_ratio <= 1.0) {
            return Err(Error::InvalidConfig(format!(
                "target_ratio must be in (0, 1], got {}",
                self.target_ratio
            )));
        }
        if self.min_session_size > self.max_session_size {
            return Err(Error::InvalidConfig(format!(
                "min_session_size ({}) exceeds max_session_size ({})",
                self.min_session_size, self.max_session_size
            )));
        }
        Ok(())
    }
}
