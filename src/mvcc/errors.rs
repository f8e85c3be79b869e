//! Version store error types
//!
//! Every store error marks a programmer error, never user input: the parser
//! and placement rules are the only entrance, so an unknown site or variable
//! reaching the store means a bug upstream. The engine treats these as fatal.

use std::fmt;

use crate::site::placement::{SiteId, VariableId};

use super::Timestamp;

/// Result type for version store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Version store errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The site was never initialized in the store.
    UnknownSite { site: SiteId },

    /// The variable is not held at the given site.
    UnknownVariable { site: SiteId, variable: VariableId },

    /// An append would break the strictly increasing timestamp order.
    NonMonotonicVersion {
        site: SiteId,
        variable: VariableId,
        attempted: Timestamp,
        latest: Timestamp,
    },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::UnknownSite { site } => {
                write!(f, "unknown site {} in version store", site)
            }
            StoreError::UnknownVariable { site, variable } => {
                write!(f, "variable {} is not held at site {}", variable, site)
            }
            StoreError::NonMonotonicVersion {
                site,
                variable,
                attempted,
                latest,
            } => {
                write!(
                    f,
                    "non-monotonic version for {} at site {}: attempted timestamp {} but latest is {}",
                    variable, site, attempted, latest
                )
            }
        }
    }
}

impl std::error::Error for StoreError {}
