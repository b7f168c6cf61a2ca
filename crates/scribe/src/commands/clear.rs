//! Clear command - delete every cached session.

use anyhow::{Result, bail};
use clap::Args;
use console::Style;
use serde::Serialize;

use super::Context;

/// Arguments for the clear command.
#[derive(Args, Debug)]
pub struct ClearArgs {
    /// Confirm deletion of all sessions
    #[arg(long)]
    pub yes: bool,
}

#[derive(Debug, Serialize)]
struct ClearOutput {
    removed: usize,
}

/// Run the clear command.
pub async fn run(args: ClearArgs, ctx: &Context) -> Result<()> {
    if !args.yes {
        bail!("refusing to delete every session without --yes");
    }

    let manager = ctx.cache_manager()?;
    let Some(removed) = manager.clear_all_cache().await else {
        bail!("a cleanup is already in progress");
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&ClearOutput { removed })?);
    } else {
        let green = Style::new().green();
        println!("{} Cleared {} session(s)", green.apply_to("✓"), removed);
    }

    Ok(())
}
