//! CLI command handlers.

pub mod add;
pub mod background;
pub mod cleanup;
pub mod clear;
pub mod config;
pub mod list;
pub mod stats;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use scribe_config::ScribeConfig;
use scribe_session::{CacheConfig, CacheManager};
use scribe_store::SessionStore;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
    /// Merged configuration.
    pub config: ScribeConfig,
    /// Config files that were loaded, lowest precedence first.
    pub config_sources: Vec<PathBuf>,
    /// Session database location.
    pub db_path: PathBuf,
}

impl Context {
    /// Open the session database.
    pub fn open_store(&self) -> Result<Arc<SessionStore>> {
        Ok(Arc::new(SessionStore::open(&self.db_path)?))
    }

    /// Cache policy built from the `[cache]` section.
    pub fn cache_config(&self) -> CacheConfig {
        let section = self.config.cache_or_default();
        CacheConfig::new()
            .with_max_total_size(section.max_total_bytes())
            .with_session_bounds(section.min_session_bytes(), section.max_session_bytes())
            .with_grace_window(section.grace_window())
            .with_target_ratio(section.target_ratio)
            .with_staleness_horizon(section.staleness_horizon())
            .with_estimator(section.base_overhead_bytes, section.audio_bytes_per_sec)
    }

    /// Cache manager bound to the session database.
    ///
    /// Statistics are not loaded yet; callers run `update_cache_stats`
    /// once any startup accesses have been recorded.
    pub fn cache_manager(&self) -> Result<CacheManager<SessionStore>> {
        Ok(CacheManager::new(self.cache_config(), self.open_store()?)?)
    }
}

/// Human-readable byte count.
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> Context {
        Context {
            json_output: false,
            verbose: false,
            config: ScribeConfig::from_toml("[cache]\nmax_total_mb = 10\ngrace_window_secs = 0\n")
                .unwrap(),
            config_sources: Vec::new(),
            db_path: PathBuf::from("unused.db"),
        }
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(200 * 1024 * 1024), "200.0 MB");
    }

    #[test]
    fn test_cache_config_from_section() {
        let config = context().cache_config();
        assert_eq!(config.max_total_size, 10 * 1024 * 1024);
        assert_eq!(config.grace_window, std::time::Duration::ZERO);
        assert_eq!(config.base_overhead, 1024);
        assert!(config.validate().is_ok());
    }
}
