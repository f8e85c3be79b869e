//! Static placement rules
//!
//! The cluster shape is fixed: ten sites, twenty variables. Even-indexed
//! variables are replicated at every site; odd-indexed variables live at a
//! single home site derived from their index. Placement never changes at
//! runtime, so every placement query is a pure function of the identifiers.

use std::fmt;

/// Number of sites in the cluster.
pub const SITE_COUNT: u8 = 10;

/// Number of variables in the store.
pub const VARIABLE_COUNT: u8 = 20;

/// A site identity in 1..=10.
///
/// Construction validates the range, so a `SiteId` in hand is always a real
/// site. Display renders the bare number (`3`), matching report lines such as
/// `site 3 failed`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SiteId(u8);

impl SiteId {
    /// Creates a site identity, rejecting out-of-range values.
    pub fn new(raw: u8) -> Option<Self> {
        if (1..=SITE_COUNT).contains(&raw) {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Returns the underlying site number.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// All sites in ascending order.
    pub fn all() -> impl Iterator<Item = SiteId> {
        (1..=SITE_COUNT).map(SiteId)
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A variable identity in 1..=20.
///
/// Display renders the scripted form (`x4`).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VariableId(u8);

impl VariableId {
    /// Creates a variable identity, rejecting out-of-range values.
    pub fn new(raw: u8) -> Option<Self> {
        if (1..=VARIABLE_COUNT).contains(&raw) {
            Some(Self(raw))
        } else {
            None
        }
    }

    /// Returns the underlying variable index.
    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    /// All variables in ascending order.
    pub fn all() -> impl Iterator<Item = VariableId> {
        (1..=VARIABLE_COUNT).map(VariableId)
    }

    /// Even-indexed variables are replicated at every site.
    #[inline]
    pub fn is_replicated(self) -> bool {
        self.0 % 2 == 0
    }

    /// The anchor site `1 + ((i - 1) mod 10)`.
    ///
    /// For a non-replicated variable this is its home site. For a replicated
    /// variable it is where read routing starts its scan.
    pub fn anchor_site(self) -> SiteId {
        SiteId(1 + ((self.0 - 1) % SITE_COUNT))
    }

    /// The home site of a non-replicated variable; None for replicated ones.
    pub fn home_site(self) -> Option<SiteId> {
        if self.is_replicated() {
            None
        } else {
            Some(self.anchor_site())
        }
    }

    /// The seeded value of this variable at logical time zero.
    #[inline]
    pub fn initial_value(self) -> i64 {
        10 * i64::from(self.0)
    }

    /// All sites that physically hold this variable, in ascending order.
    pub fn holding_sites(self) -> Vec<SiteId> {
        if self.is_replicated() {
            SiteId::all().collect()
        } else {
            vec![self.anchor_site()]
        }
    }

    /// Holding sites in read-routing order: the anchor site first, then the
    /// remaining sites ascending with wrap-around.
    pub fn preferred_site_order(self) -> Vec<SiteId> {
        if !self.is_replicated() {
            return vec![self.anchor_site()];
        }
        let anchor = self.anchor_site().value();
        (0..SITE_COUNT)
            .map(|offset| SiteId(1 + (anchor - 1 + offset) % SITE_COUNT))
            .collect()
    }
}

impl fmt::Display for VariableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}
