//! VersionStore - multiversion storage keyed by ⟨site, variable⟩
//!
//! Each site holds an independent append-only version log per variable it
//! stores. The store enforces the single structural invariant of the version
//! model: timestamps along any one log are strictly increasing. Visibility
//! and routing decisions live elsewhere; the store only answers point
//! lookups.

use std::collections::BTreeMap;

use crate::site::placement::{SiteId, VariableId};

use super::errors::{StoreError, StoreResult};
use super::{Timestamp, Version, VersionLog};

/// Multiversion storage for the whole cluster.
#[derive(Clone, Debug, Default)]
pub struct VersionStore {
    /// Per-site, per-variable version logs. Ordered maps keep dump output
    /// and iteration deterministic.
    sites: BTreeMap<SiteId, BTreeMap<VariableId, VersionLog>>,
}

impl VersionStore {
    /// Creates an empty store with no sites.
    pub fn new() -> Self {
        Self {
            sites: BTreeMap::new(),
        }
    }

    /// Creates a store seeded with the full cluster topology: every site
    /// initialized with the variables placement assigns to it, each at its
    /// initial value at time zero.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        for site in SiteId::all() {
            let vars = VariableId::all().filter(|v| v.holding_sites().contains(&site));
            store.init_site(site, vars);
        }
        store
    }

    /// Allocates a site and seeds each listed variable with its initial
    /// version ⟨0, 10·i⟩. Re-initializing a site replaces its contents.
    pub fn init_site(&mut self, site: SiteId, variables: impl IntoIterator<Item = VariableId>) {
        let logs = variables
            .into_iter()
            .map(|v| {
                let seed = Version::new(Timestamp::ZERO, v.initial_value());
                (v, VersionLog::seeded(seed))
            })
            .collect();
        self.sites.insert(site, logs);
    }

    /// Appends a version. The timestamp must be strictly greater than the
    /// latest one in the log; anything else is a programmer error.
    pub fn add_version(
        &mut self,
        site: SiteId,
        variable: VariableId,
        ts: Timestamp,
        value: i64,
    ) -> StoreResult<()> {
        let log = self
            .sites
            .get_mut(&site)
            .ok_or(StoreError::UnknownSite { site })?
            .get_mut(&variable)
            .ok_or(StoreError::UnknownVariable { site, variable })?;

        if let Some(latest) = log.latest() {
            if ts <= latest.ts() {
                return Err(StoreError::NonMonotonicVersion {
                    site,
                    variable,
                    attempted: ts,
                    latest: latest.ts(),
                });
            }
        }

        log.push(Version::new(ts, value));
        Ok(())
    }

    /// The version with the largest timestamp ≤ `bound`, or None.
    pub fn get_version(
        &self,
        site: SiteId,
        variable: VariableId,
        bound: Timestamp,
    ) -> StoreResult<Option<Version>> {
        Ok(self.log(site, variable)?.visible_at(bound))
    }

    /// The newest version at the site, or None.
    pub fn get_latest(&self, site: SiteId, variable: VariableId) -> StoreResult<Option<Version>> {
        Ok(self.log(site, variable)?.latest())
    }

    /// Whether the site holds the variable.
    pub fn has_variable(&self, site: SiteId, variable: VariableId) -> bool {
        self.sites
            .get(&site)
            .map(|logs| logs.contains_key(&variable))
            .unwrap_or(false)
    }

    /// All variables held at the site, in ascending index order.
    pub fn all_variables(&self, site: SiteId) -> StoreResult<Vec<VariableId>> {
        let logs = self
            .sites
            .get(&site)
            .ok_or(StoreError::UnknownSite { site })?;
        Ok(logs.keys().copied().collect())
    }

    fn log(&self, site: SiteId, variable: VariableId) -> StoreResult<&VersionLog> {
        self.sites
            .get(&site)
            .ok_or(StoreError::UnknownSite { site })?
            .get(&variable)
            .ok_or(StoreError::UnknownVariable { site, variable })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(n: u8) -> SiteId {
        SiteId::new(n).unwrap()
    }

    fn var(n: u8) -> VariableId {
        VariableId::new(n).unwrap()
    }

    #[test]
    fn test_seeded_topology() {
        let store = VersionStore::seeded();

        // Replicated x2 exists everywhere; x3 only at its home site 3.
        for s in SiteId::all() {
            assert!(store.has_variable(s, var(2)));
        }
        assert!(store.has_variable(site(3), var(3)));
        assert!(!store.has_variable(site(4), var(3)));
    }

    #[test]
    fn test_seed_values() {
        let store = VersionStore::seeded();
        let seed = store.get_latest(site(1), var(2)).unwrap().unwrap();
        assert_eq!(seed.ts(), Timestamp::ZERO);
        assert_eq!(seed.value(), 20);
    }

    #[test]
    fn test_add_and_lookup() {
        let mut store = VersionStore::seeded();
        store
            .add_version(site(1), var(2), Timestamp::new(3), 99)
            .unwrap();

        // Snapshot before the write still sees the seed.
        let old = store
            .get_version(site(1), var(2), Timestamp::new(2))
            .unwrap()
            .unwrap();
        assert_eq!(old.value(), 20);

        let new = store
            .get_version(site(1), var(2), Timestamp::new(3))
            .unwrap()
            .unwrap();
        assert_eq!(new.value(), 99);
    }

    #[test]
    fn test_non_monotonic_append_rejected() {
        let mut store = VersionStore::seeded();
        store
            .add_version(site(1), var(2), Timestamp::new(5), 1)
            .unwrap();

        let result = store.add_version(site(1), var(2), Timestamp::new(5), 2);
        assert!(matches!(
            result,
            Err(StoreError::NonMonotonicVersion { .. })
        ));

        let result = store.add_version(site(1), var(2), Timestamp::new(4), 2);
        assert!(matches!(
            result,
            Err(StoreError::NonMonotonicVersion { .. })
        ));
    }

    #[test]
    fn test_unknown_variable_is_error() {
        let mut store = VersionStore::seeded();
        // x3 is not held at site 4.
        let result = store.add_version(site(4), var(3), Timestamp::new(1), 0);
        assert!(matches!(result, Err(StoreError::UnknownVariable { .. })));
    }

    #[test]
    fn test_unknown_site_is_error() {
        let store = VersionStore::new();
        let result = store.get_latest(site(1), var(2));
        assert!(matches!(result, Err(StoreError::UnknownSite { .. })));
    }

    #[test]
    fn test_all_variables_ascending() {
        let store = VersionStore::seeded();

        // Site 1 holds every even variable plus its odd residents x1 and x11.
        let vars = store.all_variables(site(1)).unwrap();
        let values: Vec<u8> = vars.iter().map(|v| v.value()).collect();
        let mut sorted = values.clone();
        sorted.sort_unstable();
        assert_eq!(values, sorted);
        assert!(vars.contains(&var(1)));
        assert!(vars.contains(&var(11)));
        assert!(vars.contains(&var(2)));
        assert!(!vars.contains(&var(3)));

        // Even sites hold only replicated variables.
        let vars = store.all_variables(site(2)).unwrap();
        assert_eq!(vars.len(), 10);
        assert!(vars.iter().all(|v| v.is_replicated()));
    }
}
