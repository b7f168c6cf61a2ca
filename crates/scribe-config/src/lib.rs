//! Configuration system for Scribe.
//!
//! Provides TOML-based configuration with:
//! - `[cache]` budget, grace window, hysteresis and estimator tunables
//! - `[storage]` database location
//! - `[logging]` log directory and JSON file output
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    LoadedConfig, default_database_path, load_config, load_config_file,
    load_config_with_options, save_config, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
