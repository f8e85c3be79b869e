//! Script parsing
//!
//! This module provides:
//! - `Directive` - the tagged union of scripted directives
//! - `parse_line` / `test_marker` - tolerant line parsing and segment
//!   marker recognition
//! - `ScriptError` - typed parse failures, reported as warnings

mod ast;
mod parser;

pub use ast::Directive;
pub use parser::{parse_line, test_marker, ScriptError, ScriptResult};
