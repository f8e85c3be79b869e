//! replikv - a strict, deterministic simulator of a replicated key-value store
//!
//! The simulator models a fixed cluster of ten sites holding twenty variables
//! under snapshot isolation, with a serialization-graph check that excludes
//! write-skew anomalies. It consumes a scripted transcript of directives and
//! produces a deterministic textual report: identical input always yields
//! identical output.

pub mod cli;
pub mod conflict;
pub mod engine;
pub mod mvcc;
pub mod observability;
pub mod routing;
pub mod script;
pub mod site;
pub mod txn;
