//! Site availability and placement
//!
//! This module provides:
//! - `SiteId` / `VariableId` - validated identifiers plus the static
//!   placement rules (replication parity, home sites, routing order)
//! - `SiteState` - the Up / Failed / Recovering state machine
//! - `UptimeInterval` - a site's up-window history for continuity queries
//! - `SiteManager` - the site table driving fail / recover / readmission

pub mod placement;
mod manager;
mod state;
mod uptime;

pub use manager::{Site, SiteManager};
pub use placement::{SiteId, VariableId, SITE_COUNT, VARIABLE_COUNT};
pub use state::SiteState;
pub use uptime::UptimeInterval;
