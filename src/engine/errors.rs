//! Engine error types
//!
//! An `EngineError` always marks an internal invariant violation - the
//! directive loop resolves every user-visible condition to a report line,
//! so any error that escapes it indicates a bug. The driver logs a FATAL
//! event and exits non-zero; these are never papered over.

use std::fmt;

use crate::mvcc::{StoreError, Timestamp};
use crate::site::{SiteId, VariableId};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Fatal internal errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The version store rejected an operation.
    Store(StoreError),

    /// A read re-fetch did not return the version routing selected.
    SnapshotMismatch {
        txn: String,
        variable: VariableId,
        site: SiteId,
        selected: Timestamp,
        found: Option<Timestamp>,
    },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Store(err) => write!(f, "version store failure: {}", err),
            EngineError::SnapshotMismatch {
                txn,
                variable,
                site,
                selected,
                found,
            } => {
                write!(
                    f,
                    "snapshot mismatch reading {} for {} at site {}: selected version {} but found ",
                    variable, txn, site, selected
                )?;
                match found {
                    Some(ts) => write!(f, "{}", ts),
                    None => write!(f, "none"),
                }
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Store(err) => Some(err),
            EngineError::SnapshotMismatch { .. } => None,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Store(err)
    }
}
