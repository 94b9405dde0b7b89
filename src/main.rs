mod command;
mod config;
mod executor;
mod replay;
mod script;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{CommandKind, ReplayConfig};
use crate::replay::{Replay, ReplayError};

#[derive(Parser, Debug)]
#[command(name = "modeler", about = "Replay a gizmo interaction script against a modeling command")]
struct Cli {
    /// JSON script of viewport steps.
    #[arg(env = "MODELER_SCRIPT")]
    script: PathBuf,

    /// Command to start before the first step.
    #[arg(long)]
    command: Option<CommandKind>,

    /// Keep single-drag commands running after pointer-up.
    #[arg(long)]
    persistent: bool,

    /// Pretty-print the report.
    #[arg(long)]
    pretty: bool,
}

fn main() -> Result<(), ReplayError> {
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();
    if let Err(err) = dotenv {
        tracing::debug!(error = %err, "no .env loaded");
    }

    let cli = Cli::parse();
    let mut config = ReplayConfig::from_env();
    if let Some(command) = cli.command {
        config.command = command;
    }
    config.persistent |= cli.persistent;
    config.pretty |= cli.pretty;

    let steps = replay::load(&cli.script)?;
    tracing::info!(script = %cli.script.display(), steps = steps.len(), "replay starting");
    let reports = Replay::new(config).run(&steps)?;

    let out = if config.pretty { serde_json::to_string_pretty(&reports)? } else { serde_json::to_string(&reports)? };
    println!("{out}");
    Ok(())
}
