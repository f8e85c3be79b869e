//! Transactions
//!
//! This module provides:
//! - `Transaction` - snapshot, buffered writes, touched-site tracking
//! - `TransactionStatus` / `AbortReason` - lifecycle and report vocabulary
//! - `TransactionManager` - the begin/read/write/end protocol and the
//!   failure cascade

mod manager;
mod transaction;

pub use manager::TransactionManager;
pub use transaction::{AbortReason, ReadSource, Transaction, TransactionStatus, WriteIntent};
