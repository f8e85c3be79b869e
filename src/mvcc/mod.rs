//! Multiversion store
//!
//! This module provides the version model of the simulator:
//! - `Timestamp` - totally ordered logical time
//! - `Version` - immutable ⟨timestamp, value⟩ pair
//! - `VersionLog` - append-only version history for one ⟨site, variable⟩
//! - `VersionStore` - cluster-wide storage with monotonicity enforcement
//!
//! Versions are never deleted or rewritten; a site that was down simply has
//! an older log than its peers until commits reach it again.

mod errors;
mod store;
mod timestamp;
mod version;
mod version_log;

pub use errors::{StoreError, StoreResult};
pub use store::VersionStore;
pub use timestamp::Timestamp;
pub use version::Version;
pub use version_log::VersionLog;
