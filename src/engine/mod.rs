//! Engine
//!
//! This module provides:
//! - `LogicalClock` - the monotone counter ordering all events
//! - `Report` - the ordered stream of output lines
//! - `Simulator` - the single owner of all core state
//! - `run_script` / `run_script_with` - the whole-script facade
//! - `EngineError` - fatal internal errors

mod clock;
mod errors;
mod report;
mod simulator;

pub use clock::LogicalClock;
pub use errors::{EngineError, EngineResult};
pub use report::Report;
pub use simulator::{run_script, run_script_with, Simulator};
