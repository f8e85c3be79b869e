//! replikv CLI entry point
//!
//! main parses arguments, dispatches to the CLI driver, and maps any fatal
//! error to a non-zero exit. It never calls subsystems directly.

use std::process;

use replikv::cli::{run_command, Cli};

fn main() {
    let cli = Cli::parse_args();

    if let Err(e) = run_command(cli) {
        // Print error JSON to stderr and exit non-zero
        let error_json = serde_json::json!({
            "status": "error",
            "code": e.code_str(),
            "message": e.message()
        });

        eprintln!("{}", error_json);
        process::exit(1);
    }
}
