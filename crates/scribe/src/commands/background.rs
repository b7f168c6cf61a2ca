//! Background command - start-of-process cache maintenance.

use anyhow::Result;
use clap::Args;
use console::Style;

use super::{Context, format_bytes};

/// Arguments for the background command.
#[derive(Args, Debug)]
pub struct BackgroundArgs {}

/// Run the background command.
pub async fn run(_args: BackgroundArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.cache_manager()?;
    manager.update_cache_stats().await;

    let report = manager.perform_background_cleanup().await;

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let green = Style::new().green();
    let dim = Style::new().dim();
    match report.cleanup {
        Some(ref cleanup) => println!(
            "{} Over budget: evicted {} session(s), reclaimed {}",
            green.apply_to("✓"),
            cleanup.evicted.len(),
            format_bytes(cleanup.bytes_reclaimed)
        ),
        None => println!("{} Within budget, nothing evicted", green.apply_to("✓")),
    }
    if report.pruned > 0 {
        println!(
            "  {}",
            dim.apply_to(format!("{} stale recency entries pruned", report.pruned))
        );
    }

    Ok(())
}
