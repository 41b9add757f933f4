//! Command-line interface.

pub mod commands;

use clap::{Parser, Subcommand};

/// Iterative AI-detection and plagiarism score optimizer.
#[derive(Parser, Debug)]
#[command(name = "proofloop", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a config file (overrides the .proofloop/ hierarchy)
    #[arg(long, global = true)]
    pub config: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a starter configuration file
    Init(commands::init::InitArgs),
    /// Score or optimize a text from a file or stdin
    Run(commands::run::RunArgs),
    /// Start the MCP server
    Serve(commands::serve::ServeArgs),
}

/// Uniform error rendering for all commands.
pub fn handle_error(err: anyhow::Error, json_mode: bool) {
    if json_mode {
        let payload = serde_json::json!({ "error": err.to_string() });
        eprintln!("{payload}");
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
