//! Directive parser
//!
//! One directive per non-blank, non-comment line; `//` introduces a line
//! comment; whitespace around commas is tolerated. Parsing is total: a bad
//! line yields a typed `ScriptError` which the driver reports as a warning
//! and skips - never an abort of the run.
//!
//! A comment of the form `// Test <id>` is a segmentation marker, not a
//! directive; the driver splits the script on these and runs each segment
//! against a fresh simulator.

use thiserror::Error;

use crate::site::{SiteId, VariableId};

use super::ast::Directive;

/// Result type for parsing operations.
pub type ScriptResult<T> = Result<T, ScriptError>;

/// Why a line failed to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unknown directive '{0}'")]
    UnknownDirective(String),

    #[error("malformed directive '{0}': expected name(args)")]
    Malformed(String),

    #[error("{directive} takes {expected} argument(s), got {got}")]
    WrongArity {
        directive: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid transaction name '{0}'")]
    InvalidTransaction(String),

    #[error("invalid variable '{0}': expected x1..x20")]
    InvalidVariable(String),

    #[error("invalid site '{0}': expected 1..10")]
    InvalidSite(String),

    #[error("invalid value '{0}': expected a signed integer")]
    InvalidValue(String),
}

/// Recognizes a `// Test <id>` segmentation marker and returns the id.
pub fn test_marker(line: &str) -> Option<String> {
    let rest = line.trim().strip_prefix("//")?.trim_start();
    let rest = rest.strip_prefix("Test")?;
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let id = rest.trim();
    if id.is_empty() {
        None
    } else {
        Some(id.to_string())
    }
}

/// Parses one script line.
///
/// Returns `Ok(None)` for blank lines and comments, `Ok(Some(_))` for a
/// directive, and a typed error for anything else.
pub fn parse_line(line: &str) -> ScriptResult<Option<Directive>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("//") {
        return Ok(None);
    }

    let open = line
        .find('(')
        .ok_or_else(|| ScriptError::Malformed(line.to_string()))?;
    if !line.ends_with(')') {
        return Err(ScriptError::Malformed(line.to_string()));
    }
    let name = line[..open].trim();
    let inner = &line[open + 1..line.len() - 1];
    let args: Vec<&str> = if inner.trim().is_empty() {
        Vec::new()
    } else {
        inner.split(',').map(str::trim).collect()
    };

    let directive = match name {
        "begin" => {
            expect_arity("begin", &args, 1)?;
            Directive::Begin {
                txn: parse_txn(args[0])?,
            }
        }
        "end" => {
            expect_arity("end", &args, 1)?;
            Directive::End {
                txn: parse_txn(args[0])?,
            }
        }
        "R" => {
            expect_arity("R", &args, 2)?;
            Directive::Read {
                txn: parse_txn(args[0])?,
                variable: parse_variable(args[1])?,
            }
        }
        "W" => {
            expect_arity("W", &args, 3)?;
            Directive::Write {
                txn: parse_txn(args[0])?,
                variable: parse_variable(args[1])?,
                value: args[2]
                    .parse::<i64>()
                    .map_err(|_| ScriptError::InvalidValue(args[2].to_string()))?,
            }
        }
        "fail" => {
            expect_arity("fail", &args, 1)?;
            Directive::Fail {
                site: parse_site(args[0])?,
            }
        }
        "recover" => {
            expect_arity("recover", &args, 1)?;
            Directive::Recover {
                site: parse_site(args[0])?,
            }
        }
        "dump" => match args.len() {
            0 => Directive::DumpAll,
            1 => {
                if args[0].starts_with('x') {
                    Directive::DumpVariable {
                        variable: parse_variable(args[0])?,
                    }
                } else {
                    Directive::DumpSite {
                        site: parse_site(args[0])?,
                    }
                }
            }
            got => {
                return Err(ScriptError::WrongArity {
                    directive: "dump",
                    expected: 1,
                    got,
                })
            }
        },
        "reset" => {
            expect_arity("reset", &args, 0)?;
            Directive::Reset
        }
        other => return Err(ScriptError::UnknownDirective(other.to_string())),
    };

    Ok(Some(directive))
}

fn expect_arity(directive: &'static str, args: &[&str], expected: usize) -> ScriptResult<()> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(ScriptError::WrongArity {
            directive,
            expected,
            got: args.len(),
        })
    }
}

fn parse_txn(raw: &str) -> ScriptResult<String> {
    if !raw.is_empty() && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(raw.to_string())
    } else {
        Err(ScriptError::InvalidTransaction(raw.to_string()))
    }
}

fn parse_variable(raw: &str) -> ScriptResult<VariableId> {
    raw.strip_prefix('x')
        .and_then(|n| n.parse::<u8>().ok())
        .and_then(VariableId::new)
        .ok_or_else(|| ScriptError::InvalidVariable(raw.to_string()))
}

fn parse_site(raw: &str) -> ScriptResult<SiteId> {
    raw.parse::<u8>()
        .ok()
        .and_then(SiteId::new)
        .ok_or_else(|| ScriptError::InvalidSite(raw.to_string()))
}
