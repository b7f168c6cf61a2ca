//! Scribe - local session cache manager.
//!
//! Main entry point for the Scribe CLI.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use tracing::warn;

mod commands;

use commands::{add, background, cleanup, clear, config, list, stats};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Scribe - keeps recordings, transcripts and notes within a storage budget
#[derive(Parser)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of discovering config layers
    #[arg(long, global = true, env = "SCRIBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Session database path (overrides [storage] database)
    #[arg(long, global = true, env = "SCRIBE_DB")]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a session record
    Add(add::AddArgs),

    /// List stored sessions with estimated sizes
    List(list::ListArgs),

    /// Show cache usage against the budget
    Stats(stats::StatsArgs),

    /// Evict least recently used sessions down to the target size
    Cleanup(cleanup::CleanupArgs),

    /// Run start-of-process maintenance (stale index pruning, eviction if over budget)
    Background(background::BackgroundArgs),

    /// Delete every cached session
    Clear(clear::ClearArgs),

    /// Configuration inspection
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources, warnings) = match cli.config {
        Some(ref path) => {
            let config = scribe_config::load_config_file(path)
                .with_context(|| format!("loading {}", path.display()))?;
            (config, vec![path.clone()], Vec::new())
        }
        None => {
            let loaded = scribe_config::load_config(None)?;
            let sources = loaded
                .loaded_from()
                .into_iter()
                .map(|p| p.to_path_buf())
                .collect();
            (loaded.config, sources, loaded.warnings)
        }
    };
    config.validate()?;

    // Keep the guard alive so the non-blocking file writer flushes on exit.
    let _guard = init_logging(cli.verbose, &config);
    for warning in &warnings {
        warn!("{}", warning);
    }

    let db_path = cli
        .db
        .unwrap_or_else(|| scribe_config::default_database_path(&config));

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config,
        config_sources: sources,
        db_path,
    };

    match cli.command {
        Commands::Add(args) => add::run(args, &ctx).await,
        Commands::List(args) => list::run(args, &ctx).await,
        Commands::Stats(args) => stats::run(args, &ctx).await,
        Commands::Cleanup(args) => cleanup::run(args, &ctx).await,
        Commands::Background(args) => background::run(args, &ctx).await,
        Commands::Clear(args) => clear::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}

/// Console logging on stderr plus an optional rolling JSON file.
fn init_logging(
    verbose: bool,
    config: &scribe_config::ScribeConfig,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_filter = if verbose {
        "scribe=debug,scribe_session=debug,scribe_store=debug,scribe_config=debug,info"
    } else {
        "scribe=info,scribe_session=info,scribe_store=warn,warn"
    };
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let console = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);

    let logging = config.logging.clone().unwrap_or_default();
    let log_dir = logging
        .directory
        .or_else(|| scribe_config::xdg_config_dir().map(|d| d.join("logs")));

    let file_appender = log_dir.filter(|_| logging.json).and_then(|dir| {
        tracing_appender::rolling::RollingFileAppender::builder()
            .rotation(tracing_appender::rolling::Rotation::DAILY)
            .filename_prefix("scribe")
            .filename_suffix("log")
            .build(&dir)
            .ok()
    });

    match file_appender {
        Some(file_appender) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(console)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking)
                        .with_filter(EnvFilter::new(
                            "scribe=trace,scribe_session=trace,scribe_store=debug,scribe_config=debug,info",
                        )),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    }
}
