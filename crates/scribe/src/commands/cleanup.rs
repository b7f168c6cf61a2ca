//! Cleanup command - manual eviction pass.

use anyhow::Result;
use clap::Args;
use console::Style;
use scribe_session::{CleanupPlan, CleanupReport};

use super::{Context, format_bytes};

/// Arguments for the cleanup command.
#[derive(Args, Debug)]
pub struct CleanupArgs {
    /// Show what would be evicted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Treat these sessions as just accessed (protected by the grace window)
    #[arg(short, long, value_name = "ID")]
    pub keep: Vec<String>,
}

/// Run the cleanup command.
pub async fn run(args: CleanupArgs, ctx: &Context) -> Result<()> {
    let manager = ctx.cache_manager()?;

    // Record before loading statistics so these accesses cannot start a
    // pass of their own.
    for id in &args.keep {
        manager.record_access(id);
    }
    manager.update_cache_stats().await;

    if args.dry_run {
        let plan = manager.plan_cleanup().await?;
        if ctx.json_output {
            println!("{}", serde_json::to_string_pretty(&plan)?);
        } else {
            print_plan(&plan);
        }
        return Ok(());
    }

    match manager.perform_manual_cleanup().await {
        Some(report) => {
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report, ctx.verbose);
            }
        }
        None => {
            let yellow = Style::new().yellow();
            println!("{} Cleanup already in progress", yellow.apply_to("!"));
        }
    }

    Ok(())
}

fn print_plan(plan: &CleanupPlan) {
    let dim = Style::new().dim();
    if plan.is_empty() {
        println!(
            "Nothing to evict {}",
            dim.apply_to(format!(
                "(usage {}, target {})",
                format_bytes(plan.size_before),
                format_bytes(plan.target_size)
            ))
        );
        return;
    }

    println!("Would evict {} session(s):", plan.candidates.len());
    for candidate in &plan.candidates {
        println!(
            "  {}  {}",
            candidate.session_id,
            dim.apply_to(format_bytes(candidate.size))
        );
    }
    println!(
        "{}",
        dim.apply_to(format!(
            "{} → {} (target {}, {} protected)",
            format_bytes(plan.size_before),
            format_bytes(plan.projected_size),
            format_bytes(plan.target_size),
            plan.protected
        ))
    );
}

fn print_report(report: &CleanupReport, verbose: bool) {
    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    println!(
        "{} Evicted {} session(s), reclaimed {}",
        green.apply_to("✓"),
        report.evicted.len(),
        format_bytes(report.bytes_reclaimed)
    );
    if verbose {
        for id in &report.evicted {
            println!("  {}", dim.apply_to(id));
        }
    }
    if report.protected > 0 {
        println!(
            "  {}",
            dim.apply_to(format!(
                "{} recently used session(s) kept",
                report.protected
            ))
        );
    }
    for id in &report.failed {
        println!("  {} failed to delete {}", red.apply_to("✗"), id);
    }
    println!(
        "  {}",
        dim.apply_to(format!(
            "{} → {} (target {})",
            format_bytes(report.size_before),
            format_bytes(report.size_after),
            format_bytes(report.target_size)
        ))
    );
}
