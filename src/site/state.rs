//! Site availability state machine
//!
//! A site is either Up, Failed, or Recovering. The transitions are driven by
//! `fail` and `recover` directives plus commit installs:
//!
//! - Up --fail--> Failed
//! - Failed --recover--> Recovering
//! - Recovering --all replicated variables re-enabled--> Up
//!
//! A Recovering site accepts writes and serves its non-replicated variables,
//! but each replicated variable stays read-disabled until a commit installs a
//! fresh version of it at this site.

use std::fmt;

/// Availability state of one site.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SiteState {
    /// Fully available.
    Up,

    /// Down. Holds no open uptime interval, accepts nothing.
    Failed,

    /// Back up, but replicated variables are read-disabled until rewritten.
    Recovering,
}

impl SiteState {
    /// A site participates in reads and writes unless it is Failed.
    #[inline]
    pub fn is_available(self) -> bool {
        !matches!(self, SiteState::Failed)
    }

    /// Whether the site is fully up.
    #[inline]
    pub fn is_up(self) -> bool {
        matches!(self, SiteState::Up)
    }

    /// Whether the site is down.
    #[inline]
    pub fn is_failed(self) -> bool {
        matches!(self, SiteState::Failed)
    }

    /// Whether the site is recovering.
    #[inline]
    pub fn is_recovering(self) -> bool {
        matches!(self, SiteState::Recovering)
    }

    /// Returns the string representation.
    pub fn as_str(self) -> &'static str {
        match self {
            SiteState::Up => "up",
            SiteState::Failed => "failed",
            SiteState::Recovering => "recovering",
        }
    }
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
