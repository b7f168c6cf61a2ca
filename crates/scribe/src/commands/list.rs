//! List command - stored sessions with estimated sizes.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Args;
use console::{Style, style};
use scribe_session::SizeEstimator;
use serde::Serialize;

use super::{Context, format_bytes};

/// Arguments for the list command.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Maximum sessions to show (oldest first)
    #[arg(short, long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct ListEntry {
    id: String,
    title: Option<String>,
    created_at: DateTime<Utc>,
    has_audio: bool,
    duration_secs: u64,
    estimated_size: u64,
}

/// Run the list command.
pub async fn run(args: ListArgs, ctx: &Context) -> Result<()> {
    let store = ctx.open_store()?;
    let estimator = SizeEstimator::from_config(&ctx.cache_config());

    let sessions = store.list_sessions()?;
    let limit = args.limit.unwrap_or(sessions.len());
    let entries: Vec<ListEntry> = sessions
        .into_iter()
        .take(limit)
        .map(|s| ListEntry {
            estimated_size: estimator.estimate(&s),
            id: s.id,
            title: s.title,
            created_at: s.created_at,
            has_audio: s.has_audio,
            duration_secs: s.duration_secs,
        })
        .collect();

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    if entries.is_empty() {
        println!("{}", dim.apply_to("No sessions stored."));
        return Ok(());
    }

    println!();
    println!("{}", style("Sessions").bold());
    println!("{}", dim.apply_to("─".repeat(60)));
    for entry in &entries {
        let audio = if entry.has_audio {
            format!("{}s audio", entry.duration_secs)
        } else {
            "no audio".to_string()
        };
        println!(
            "  {}  {:>10}  {}  {}",
            entry.id,
            format_bytes(entry.estimated_size),
            dim.apply_to(entry.created_at.format("%Y-%m-%d %H:%M")),
            dim.apply_to(audio)
        );
        if let Some(ref title) = entry.title {
            println!("    {}", title);
        }
    }
    println!();

    Ok(())
}
