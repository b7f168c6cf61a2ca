//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [cache]      # budget, grace window, hysteresis, estimator
//! [storage]    # database location
//! [logging]    # log directory and JSON file output
//! ```

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

const MB: u64 = 1024 * 1024;

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScribeConfig {
    /// Session cache configuration.
    pub cache: Option<CacheSection>,

    /// Record storage configuration.
    pub storage: Option<StorageConfig>,

    /// Log output configuration.
    pub logging: Option<LoggingConfig>,
}

impl ScribeConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    pub fn merge(&mut self, other: ScribeConfig) {
        if other.cache.is_some() {
            self.cache = other.cache;
        }

        if other.storage.is_some() {
            self.storage = other.storage;
        }

        if other.logging.is_some() {
            self.logging = other.logging;
        }
    }

    /// The cache section, or defaults if absent.
    pub fn cache_or_default(&self) -> CacheSection {
        self.cache.clone().unwrap_or_default()
    }

    /// Validate every present section.
    pub fn validate(&self) -> Result<()> {
        if let Some(ref cache) = self.cache {
            cache.validate()?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cache Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Session cache budget and eviction policy.
///
/// ```toml
/// [cache]
/// max_total_mb = 200
/// max_session_mb = 75
/// min_session_mb = 50
/// grace_window_secs = 3600
/// target_ratio = 0.8
/// staleness_days = 30
/// base_overhead_bytes = 1024
/// audio_bytes_per_sec = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSection {
    /// Hard cap on total estimated size, in megabytes.
    pub max_total_mb: u64,
    /// Informational per-session upper bound, in megabytes.
    pub max_session_mb: u64,
    /// Informational per-session lower bound, in megabytes.
    pub min_session_mb: u64,
    /// Sessions accessed within this many seconds are never evicted.
    pub grace_window_secs: u64,
    /// Eviction stops at this fraction of the hard cap.
    pub target_ratio: f64,
    /// Recency entries older than this many days are pruned.
    pub staleness_days: u64,
    /// Per-session metadata overhead used for size estimates.
    pub base_overhead_bytes: u64,
    /// Estimated audio bytes per second of recording.
    pub audio_bytes_per_sec: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_total_mb: 200,
            max_session_mb: 75,
            min_session_mb: 50,
            grace_window_secs: 3600,
            target_ratio: 0.8,
            staleness_days: 30,
            base_overhead_bytes: 1024,
            audio_bytes_per_sec: 1000,
        }
    }
}

impl CacheSection {
    /// Hard cap in bytes.
    pub fn max_total_bytes(&self) -> u64 {
        self.max_total_mb.saturating_mul(MB)
    }

    /// Per-session upper bound in bytes.
    pub fn max_session_bytes(&self) -> u64 {
        self.max_session_mb.saturating_mul(MB)
    }

    /// Per-session lower bound in bytes.
    pub fn min_session_bytes(&self) -> u64 {
        self.min_session_mb.saturating_mul(MB)
    }

    /// Grace window as a duration.
    pub fn grace_window(&self) -> Duration {
        Duration::from_secs(self.grace_window_secs)
    }

    /// Staleness horizon as a duration.
    pub fn staleness_horizon(&self) -> Duration {
        Duration::from_secs(self.staleness_days.saturating_mul(24 * 60 * 60))
    }

    /// Reject values the cache manager cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_total_mb == 0 {
            return Err(ConfigError::Invalid {
                field: "cache.max_total_mb".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(self.target_ratio > 0.0 && self.target_ratio <= 1.0) {
            return Err(ConfigError::Invalid {
                field: "cache.target_ratio".to_string(),
                reason: format!("must be in (0, 1], got {}", self.target_ratio),
            });
        }
        if self.min_session_mb > self.max_session_mb {
            return Err(ConfigError::Invalid {
                field: "cache.min_session_mb".to_string(),
                reason: format!(
                    "{} exceeds max_session_mb ({})",
                    self.min_session_mb, self.max_session_mb
                ),
            });
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Record storage location.
///
/// ```toml
/// [storage]
/// database = "~/.local/share/scribe/sessions.db"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path. Defaults to the platform data directory.
    pub database: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Logging Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Log file settings. Console output is always on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rolling JSON log files. Defaults to `<config dir>/logs`.
    pub directory: Option<PathBuf>,
    /// Whether to write JSON log files at all.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            json: true,
        }
    }
}
