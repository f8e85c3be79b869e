//! CLI argument definitions using clap
//!
//! Usage:
//! - `replikv <file>` runs a script file
//! - `replikv -` reads the script from stdin
//! - `--config <path>` loads an optional JSON configuration file
//! - `--trace` enables the structured event log on stderr

use clap::Parser;
use std::path::PathBuf;

/// replikv - a strict, deterministic replicated key-value store simulator
#[derive(Parser, Debug)]
#[command(name = "replikv")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Input script file, or "-" to read from stdin
    pub input: String,

    /// Path to an optional JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable the structured event log on stderr
    #[arg(long)]
    pub trace: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
