//! Stats command - shows cache usage against the budget.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use scribe_session::{CacheConfiguration, PressureLevel};
use serde::Serialize;

use super::{Context, format_bytes};

/// Arguments for the stats command.
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Show the eviction policy as well
    #[arg(short, long)]
    pub detailed: bool,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    #[serde(flatten)]
    configuration: CacheConfiguration,
    usage_ratio: f64,
    pressure: PressureLevel,
}

/// Run the stats command.
pub async fn run(args: StatsArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.cache_manager()?;
    manager.update_cache_stats().await;
    let snapshot = manager.cache_configuration();

    if ctx.json_output {
        let output = StatsOutput {
            usage_ratio: snapshot.usage_ratio(),
            pressure: snapshot.pressure(),
            configuration: snapshot,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let level = match snapshot.pressure() {
        PressureLevel::Ok => Style::new().green(),
        PressureLevel::Warning => Style::new().yellow(),
        PressureLevel::Critical => Style::new().red(),
    };

    println!();
    println!("{}", style("Scribe Cache").bold());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!();
    println!("  {} {}", dim.apply_to("Sessions:"), snapshot.session_count);
    println!(
        "  {} {} / {} ({:.1}%)",
        dim.apply_to("Usage:"),
        format_bytes(snapshot.current_size),
        format_bytes(snapshot.max_total_size),
        snapshot.usage_ratio() * 100.0
    );
    println!(
        "  {} {}",
        dim.apply_to("Pressure:"),
        level.apply_to(format!("● {}", snapshot.pressure()))
    );

    if args.detailed {
        let config = manager.config();
        println!();
        println!("{}", dim.apply_to("─".repeat(40)));
        println!();
        println!(
            "  {} {}",
            dim.apply_to("Cleanup target:"),
            format_bytes(snapshot.target_size)
        );
        println!(
            "  {} {} – {}",
            dim.apply_to("Session size:"),
            format_bytes(snapshot.min_session_size),
            format_bytes(snapshot.max_session_size)
        );
        println!(
            "  {} {}s",
            dim.apply_to("Grace window:"),
            config.grace_window.as_secs()
        );
        println!("  {} {}", dim.apply_to("Database:"), ctx.db_path.display());
    }

    println!();
    Ok(())
}
