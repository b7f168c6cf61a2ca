//! Add command - insert a session record.

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Args;
use console::Style;
use scribe_session::{SessionRecord, SizeEstimator};
use serde::Serialize;

use super::{Context, format_bytes};

/// Arguments for the add command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Session ID (random UUID if omitted)
    #[arg(long)]
    pub id: Option<String>,

    /// Session title
    #[arg(short, long)]
    pub title: Option<String>,

    /// Transcript text
    #[arg(long, conflicts_with = "transcript_file")]
    pub transcript: Option<String>,

    /// Read the transcript from a file
    #[arg(long)]
    pub transcript_file: Option<PathBuf>,

    /// Notes text
    #[arg(short, long)]
    pub notes: Option<String>,

    /// Attach a recording of this many seconds
    #[arg(long)]
    pub audio_secs: Option<u64>,
}

#[derive(Debug, Serialize)]
struct AddOutput {
    id: String,
    estimated_size: u64,
}

/// Run the add command.
pub async fn run(args: AddArgs, ctx: &Context) -> Result<()> {
    let transcript = match args.transcript_file {
        Some(ref path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("reading transcript {}", path.display()))?,
        ),
        None => args.transcript,
    };

    let id = args
        .id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let mut record = SessionRecord::new(id);
    record.title = args.title;
    record.transcript = transcript;
    record.notes = args.notes;
    if let Some(secs) = args.audio_secs {
        record = record.with_audio(secs);
    }

    let store = ctx.open_store()?;
    store.insert_session(&record)?;

    let estimated_size = SizeEstimator::from_config(&ctx.cache_config()).estimate(&record);

    if ctx.json_output {
        let output = AddOutput {
            id: record.id,
            estimated_size,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        let green = Style::new().green();
        let dim = Style::new().dim();
        println!(
            "{} Session added: {} {}",
            green.apply_to("✓"),
            record.id,
            dim.apply_to(format!("({})", format_bytes(estimated_size)))
        );
    }

    Ok(())
}
