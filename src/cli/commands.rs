//! CLI command implementation
//!
//! The driver is a thin client of `engine::run_script_with`: load
//! configuration, load the script, run it, print the report. Configuration
//! only steers the stderr event log; it can never change a report line.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::engine;
use crate::observability::{EventLog, Severity};

use super::args::Cli;
use super::errors::{CliError, CliResult};
use super::io::{read_input, write_report};

/// Configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Whether the structured event log on stderr is enabled (default:
    /// false).
    #[serde(default)]
    pub trace_events: bool,

    /// Minimum severity emitted when tracing is on (default: "info").
    #[serde(default = "default_log_severity")]
    pub log_severity: String,
}

fn default_log_severity() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trace_events: false,
            log_severity: default_log_severity(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    fn validate(&self) -> CliResult<()> {
        self.severity()?;
        Ok(())
    }

    fn severity(&self) -> CliResult<Severity> {
        self.log_severity
            .parse::<Severity>()
            .map_err(CliError::config_error)
    }

    /// Builds the event sink. The `--trace` flag enables tracing even when
    /// the config leaves it off.
    pub fn event_log(&self, trace_flag: bool) -> CliResult<EventLog> {
        if trace_flag || self.trace_events {
            Ok(EventLog::with_threshold(self.severity()?))
        } else {
            Ok(EventLog::disabled())
        }
    }
}

/// Runs the CLI: load config and script, execute, print the report.
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let events = config.event_log(cli.trace)?;

    let input = read_input(&cli.input)?;
    let output = engine::run_script_with(&input, events)?;
    write_report(&output)?;
    Ok(())
}
