//! Observability
//!
//! This module provides the typed event catalog for the transaction and
//! site lifecycle, and the severity-gated sink (`EventLog`) threaded through
//! the engine. Admitted events render as structured JSON lines with
//! deterministic key order.
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. All log output goes to stderr; stdout carries only the report

mod events;

pub use events::{Event, EventLog, Severity};
