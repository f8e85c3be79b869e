//! Replication routing
//!
//! This module provides:
//! - `ReadEligibility` - typed verdict for serving a read from one copy
//! - `Router` - stateless site selection under the available-copies rule
//!   with a continuity constraint

mod eligibility;
mod router;

pub use eligibility::ReadEligibility;
pub use router::Router;
