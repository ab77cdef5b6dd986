//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for one-shot responses
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Full formatted output
    Full,
    /// JSON output
    Json,
}

/// CLI arguments for cadmate
#[derive(Parser, Debug)]
#[command(name = "cadmate")]
#[command(author, version, about = "CAD agent - natural language to CAD operations")]
#[command(long_about = r#"
Cadmate turns natural-language instructions into CAD operations.

Two operating modes:
  chat   - instructions become numbered guidance, nothing is executed
  agent  - instructions become plans that execute after approval

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./cadmate.toml      Project-level config
3. ~/.config/cadmate/config.toml   Global config

Example:
  cadmate "create a box 50mm long, 30mm wide, and 20mm high"
  cadmate --mode agent "union box001 and cylinder001"
  cadmate            (no instruction starts the interactive REPL)
"#)]
pub struct Cli {
    /// A single instruction to process (omit to start the REPL)
    pub instruction: Option<String>,

    /// Operating mode to start in
    #[arg(short, long, value_name = "MODE", default_value = "chat")]
    pub mode: String,

    /// Output format for one-shot responses
    #[arg(short, long, value_enum, default_value = "full")]
    pub output: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Test the configured AI provider connection and exit
    #[arg(long)]
    pub test_connection: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
