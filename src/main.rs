//! Chalkcast CLI
//!
//! Command-line driver for the Chalkcast recording pipeline.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::debug;

use chalkcast::cli::commands::{self, RecordOptions};
use chalkcast::cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Chalkcast v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Chalkcast v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Record {
            seconds,
            profile,
            input,
            tone,
            output,
            config,
            aspect,
            mock_ai,
        } => {
            let options = RecordOptions {
                seconds,
                profile,
                input,
                tone,
                output,
                config,
                aspect,
                mock_ai,
            };
            commands::record(&options).context("recording failed")?;
        }
        Commands::Profiles => commands::list_profiles()?,
        Commands::Config { output } => commands::write_default_config(&output)
            .with_context(|| format!("could not write {}", output.display()))?,
        Commands::Snapshot { output, aspect } => commands::snapshot(&output, aspect.as_deref())?,
        Commands::Inspect { path } => commands::inspect(&path)
            .with_context(|| format!("could not read {}", path.display()))?,
    }
    Ok(())
}
