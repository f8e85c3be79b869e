//! Input and output plumbing for the CLI
//!
//! Input is a whole script read from a file or stdin; output is the report
//! text written to stdout in one pass. Nothing else may reach stdout.

use std::fs;
use std::io::{self, Read, Write};

use super::errors::{CliError, CliResult};

/// Reads the whole script from a file, or from stdin when `spec` is `-`.
pub fn read_input(spec: &str) -> CliResult<String> {
    if spec == "-" {
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .map_err(|e| CliError::io_error(format!("Failed to read stdin: {}", e)))?;
        Ok(input)
    } else {
        fs::read_to_string(spec)
            .map_err(|e| CliError::io_error(format!("Failed to read '{}': {}", spec, e)))
    }
}

/// Writes the report text to stdout.
pub fn write_report(report: &str) -> CliResult<()> {
    let mut stdout = io::stdout();
    stdout.write_all(report.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
