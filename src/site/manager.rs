//! SiteManager - per-site availability bookkeeping
//!
//! Owns the ten site records and drives their state machines. Invariants:
//! - Exactly one open uptime interval iff the site is not Failed.
//! - While Recovering, a replicated variable is readable only after a commit
//!   has installed a fresh version of it at this site.
//! - Non-replicated variables stay readable while Recovering; their single
//!   copy is authoritative, so the stale-copy problem does not arise.
//! - When the last replicated variable is re-enabled the site returns to Up.

use std::collections::BTreeMap;

use crate::mvcc::Timestamp;

use super::placement::{SiteId, VariableId};
use super::state::SiteState;
use super::uptime::UptimeInterval;

/// One site record.
#[derive(Clone, Debug)]
pub struct Site {
    id: SiteId,
    state: SiteState,
    uptime: Vec<UptimeInterval>,
    /// Read-enable flag per replicated variable held here. All true while
    /// Up; all false immediately after recovery.
    read_enabled: BTreeMap<VariableId, bool>,
}

impl Site {
    fn new(id: SiteId) -> Self {
        let read_enabled = VariableId::all()
            .filter(|v| v.is_replicated())
            .map(|v| (v, true))
            .collect();
        Self {
            id,
            state: SiteState::Up,
            uptime: vec![UptimeInterval::open(Timestamp::ZERO)],
            read_enabled,
        }
    }

    /// The site identity.
    pub fn id(&self) -> SiteId {
        self.id
    }

    /// The current availability state.
    pub fn state(&self) -> SiteState {
        self.state
    }

    /// The uptime history, oldest first.
    pub fn uptime_intervals(&self) -> &[UptimeInterval] {
        &self.uptime
    }

    /// Whether a replicated variable is currently read-enabled here.
    pub fn read_enabled(&self, variable: VariableId) -> bool {
        self.read_enabled.get(&variable).copied().unwrap_or(false)
    }

    fn holds(&self, variable: VariableId) -> bool {
        variable.is_replicated() || variable.home_site() == Some(self.id)
    }
}

/// The site table and its state machines.
#[derive(Clone, Debug)]
pub struct SiteManager {
    sites: Vec<Site>,
}

impl SiteManager {
    /// Creates the table with every site Up since time zero.
    pub fn new() -> Self {
        Self {
            sites: SiteId::all().map(Site::new).collect(),
        }
    }

    fn site(&self, id: SiteId) -> &Site {
        // SiteId construction guarantees 1..=10.
        &self.sites[usize::from(id.value() - 1)]
    }

    fn site_mut(&mut self, id: SiteId) -> &mut Site {
        &mut self.sites[usize::from(id.value() - 1)]
    }

    /// The current state of a site.
    pub fn state(&self, id: SiteId) -> SiteState {
        self.site(id).state()
    }

    /// Read access to a site record (uptime history, read flags).
    pub fn site_record(&self, id: SiteId) -> &Site {
        self.site(id)
    }

    /// Fails a site, closing its open uptime interval at `now`.
    ///
    /// Returns true when the site actually transitioned; failing a Failed
    /// site is a no-op.
    pub fn fail(&mut self, id: SiteId, now: Timestamp) -> bool {
        let site = self.site_mut(id);
        if site.state.is_failed() {
            return false;
        }
        if let Some(last) = site.uptime.last_mut() {
            if last.is_open() {
                last.close(now);
            }
        }
        site.state = SiteState::Failed;
        true
    }

    /// Recovers a Failed site at `now`: opens a fresh uptime interval and
    /// read-disables every replicated variable until it is rewritten.
    ///
    /// Returns true when the site actually transitioned; recovering a site
    /// that is not Failed is a no-op.
    pub fn recover(&mut self, id: SiteId, now: Timestamp) -> bool {
        let site = self.site_mut(id);
        if !site.state.is_failed() {
            return false;
        }
        site.state = SiteState::Recovering;
        site.uptime.push(UptimeInterval::open(now));
        for enabled in site.read_enabled.values_mut() {
            *enabled = false;
        }
        true
    }

    /// Marks a replicated variable readable again at a site, called when a
    /// commit installs a fresh version there. Returns true when this was the
    /// last disabled variable and the site transitioned Recovering → Up.
    pub fn enable_replicated_read(&mut self, id: SiteId, variable: VariableId) -> bool {
        let site = self.site_mut(id);
        if !variable.is_replicated() || !site.holds(variable) {
            return false;
        }
        if let Some(enabled) = site.read_enabled.get_mut(&variable) {
            *enabled = true;
        }
        if site.state.is_recovering() && site.read_enabled.values().all(|&e| e) {
            site.state = SiteState::Up;
            return true;
        }
        false
    }

    /// A site participates in reads and writes unless it is Failed.
    pub fn is_available(&self, id: SiteId) -> bool {
        self.site(id).state().is_available()
    }

    /// Whether a read of `variable` may be served from this site right now:
    /// the site is not Failed, holds the variable, and (for replicated
    /// variables) is either Up or has re-enabled this variable since
    /// recovering.
    pub fn can_read(&self, id: SiteId, variable: VariableId) -> bool {
        let site = self.site(id);
        if site.state.is_failed() || !site.holds(variable) {
            return false;
        }
        if !variable.is_replicated() {
            return true;
        }
        match site.state {
            SiteState::Up => true,
            SiteState::Recovering => site.read_enabled(variable),
            SiteState::Failed => false,
        }
    }

    /// Whether the site stayed up through the entire closed window
    /// [`from`, `until`]: some uptime interval covers it.
    pub fn was_continuously_up(&self, id: SiteId, from: Timestamp, until: Timestamp) -> bool {
        self.site(id)
            .uptime_intervals()
            .iter()
            .any(|interval| interval.covers(from, until))
    }
}

impl Default for SiteManager {
    fn default() -> Self {
        Self::new()
    }
}
