//! Pointerflow CLI: replay recorded pointer logs through the recognizers.
//!
//! Usage:
//!   pointerflow replay <EVENTS>    Recognize gestures in a JSONL pointer log
//!   pointerflow info <EVENTS>      Summarize a JSONL pointer log
//!   pointerflow config             Print, write or check configuration

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use pointerflow_common::config::{LoggingConfig, PointerflowConfig};

mod commands;
mod writer;

use commands::replay::GestureSelection;

#[derive(Parser)]
#[command(
    name = "pointerflow",
    about = "Pointer gesture recognition over recorded input logs",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a pointer log through the recognizers and write gesture signals
    Replay {
        /// Path to the JSONL pointer event log
        path: PathBuf,

        /// Which recognizers to run
        #[arg(short, long, value_enum, default_value = "all")]
        gesture: GestureSelection,

        /// JSON configuration file (defaults are used for missing fields)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file for gesture signals (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show pointer log statistics
    Info {
        /// Path to the JSONL pointer event log
        path: PathBuf,
    },

    /// Print the default configuration, write it to a file, or check a file
    Config {
        /// Write the default configuration here instead of printing it
        #[arg(short, long, conflicts_with = "check")]
        output: Option<PathBuf>,

        /// Validate an existing configuration file
        #[arg(long)]
        check: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Replay loads its configuration first so the logging section applies.
    let config = load_config(&cli.command)?;
    pointerflow_common::logging::init_logging(&logging_config(cli.verbose, config.as_ref()));

    match cli.command {
        Commands::Replay {
            path,
            gesture,
            output,
            ..
        } => commands::replay::run(path, gesture, config.unwrap_or_default(), output),
        Commands::Info { path } => commands::info::run(path),
        Commands::Config { output, check } => commands::config::run(output, check),
    }
}

fn load_config(command: &Commands) -> anyhow::Result<Option<PointerflowConfig>> {
    match command {
        Commands::Replay { config, .. } => PointerflowConfig::load_or_default(config.as_deref())
            .map(Some)
            .context("Failed to load configuration"),
        _ => Ok(None),
    }
}

/// The loaded `logging` section, or defaults; `--verbose` forces debug.
fn logging_config(verbose: bool, config: Option<&PointerflowConfig>) -> LoggingConfig {
    let mut logging = config
        .map(|config| config.logging.clone())
        .unwrap_or_default();
    if verbose {
        logging.level = "debug".to_string();
    }
    logging
}
