//! Config command - configuration inspection.

use anyhow::Result;
use clap::{Args, Subcommand};
use console::Style;

use super::Context;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the effective configuration
    Show,

    /// Show which config files are loaded and the database location
    Which,
}

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => {
            let mut effective = ctx.config.clone();
            effective.cache = Some(ctx.config.cache_or_default());
            print!("{}", effective.to_toml()?);
        }
        ConfigCommand::Which => {
            let dim = Style::new().dim();
            if ctx.config_sources.is_empty() {
                println!("{}", dim.apply_to("No config files loaded (using defaults)"));
            }
            for path in &ctx.config_sources {
                println!("config:   {}", path.display());
            }
            println!("database: {}", ctx.db_path.display());
        }
    }
    Ok(())
}
