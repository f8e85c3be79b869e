//! Concurrency control
//!
//! This module provides:
//! - `SerializationGraph` - WR/WW/RW dependency edges with cycle detection
//! - `ConflictTracker` - last-writer table, read/write histories, and the
//!   first-committer-wins and serializability checks run at commit

mod control;
mod graph;

pub use control::{CommitRejection, CommittedWrite, ConflictTracker};
pub use graph::{DependencyKind, SerializationGraph};
