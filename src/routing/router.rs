//! Replication router
//!
//! Stateless selection of sites for reads and writes. The router owns no
//! state: it evaluates the version store and site table it is handed, the
//! same way every time for identical inputs.
//!
//! Read selection applies the available-copies rule with a continuity
//! constraint. A site s may serve variable xi at snapshot bound `begin_ts`
//! only if all three gates pass:
//! 1. s currently admits reads of xi (not Failed, holds xi, not
//!    read-disabled while Recovering),
//! 2. s has a version V visible at `begin_ts`,
//! 3. s stayed up through the whole window [V.ts, begin_ts] - otherwise s
//!    may have missed writes between V and the snapshot.
//!
//! Candidate sites are scanned in the variable's routing order: the anchor
//! site first, then ascending with wrap-around. The first eligible site
//! wins, so selection is deterministic.

use crate::mvcc::{StoreResult, Timestamp, VersionStore};
use crate::site::{SiteId, SiteManager, VariableId};

use super::eligibility::ReadEligibility;

/// Stateless site selection for reads and writes.
pub struct Router;

impl Router {
    /// Evaluates the three read gates for one site.
    pub fn read_eligibility(
        site: SiteId,
        variable: VariableId,
        begin_ts: Timestamp,
        store: &VersionStore,
        sites: &SiteManager,
    ) -> StoreResult<ReadEligibility> {
        if !sites.can_read(site, variable) {
            return Ok(ReadEligibility::NotReadable { site });
        }
        let Some(version) = store.get_version(site, variable, begin_ts)? else {
            return Ok(ReadEligibility::NoVisibleVersion { site });
        };
        if !sites.was_continuously_up(site, version.ts(), begin_ts) {
            return Ok(ReadEligibility::ContinuityBroken {
                site,
                version_ts: version.ts(),
            });
        }
        Ok(ReadEligibility::Eligible {
            site,
            version_ts: version.ts(),
        })
    }

    /// Selects the site serving a read of `variable` at snapshot bound
    /// `begin_ts`, with the version timestamp it would return. None when no
    /// copy is eligible.
    pub fn select_read_site(
        variable: VariableId,
        begin_ts: Timestamp,
        store: &VersionStore,
        sites: &SiteManager,
    ) -> StoreResult<Option<(SiteId, Timestamp)>> {
        for site in variable.preferred_site_order() {
            if let ReadEligibility::Eligible { site, version_ts } =
                Self::read_eligibility(site, variable, begin_ts, store, sites)?
            {
                return Ok(Some((site, version_ts)));
            }
        }
        Ok(None)
    }

    /// Snapshot of where a write of `variable` issued at this instant would
    /// land: every currently-available holding site (Recovering included -
    /// installing there is what re-enables reads). Empty when every holding
    /// site is down.
    pub fn select_write_sites(variable: VariableId, sites: &SiteManager) -> Vec<SiteId> {
        variable
            .holding_sites()
            .into_iter()
            .filter(|&s| sites.is_available(s))
            .collect()
    }

    /// All sites that physically hold `variable`, regardless of state.
    pub fn sites_for_variable(variable: VariableId) -> Vec<SiteId> {
        variable.holding_sites()
    }
}
