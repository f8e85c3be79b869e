//! Transaction records
//!
//! A transaction captures its snapshot at begin and buffers writes until
//! `end`. Invariants:
//! - `begin_ts` is immutable; `commit_ts` is set exactly once, at commit.
//! - Once Committed or Aborted, the record never changes again.
//! - A re-read after a local write is served from the buffer and does not
//!   touch the read set or the touched sites.
//! - All collections are ordered, so validation iterates variables and
//!   sites in ascending order and abort reasons are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::conflict::CommitRejection;
use crate::mvcc::Timestamp;
use crate::site::{SiteId, VariableId};

/// Lifecycle state of a transaction.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Running; may read, write, and end.
    Active,
    /// Validation passed and writes are installed.
    Committed,
    /// Finalized without installing anything.
    Aborted,
}

impl TransactionStatus {
    /// Whether the transaction is still running.
    #[inline]
    pub fn is_active(self) -> bool {
        matches!(self, TransactionStatus::Active)
    }
}

/// Where a read was served from: the source site and the version's commit
/// timestamp.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReadSource {
    site: SiteId,
    version_ts: Timestamp,
}

impl ReadSource {
    /// The serving site.
    pub fn site(self) -> SiteId {
        self.site
    }

    /// The commit timestamp of the version read.
    pub fn version_ts(self) -> Timestamp {
        self.version_ts
    }
}

/// A buffered write: the value and the sites it will install at, snapshotted
/// when the write was issued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteIntent {
    value: i64,
    targets: BTreeSet<SiteId>,
}

impl WriteIntent {
    /// The buffered value.
    pub fn value(&self) -> i64 {
        self.value
    }

    /// The target sites snapshotted at write time.
    pub fn targets(&self) -> &BTreeSet<SiteId> {
        &self.targets
    }
}

/// Why a transaction aborted. Display produces the exact report strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AbortReason {
    /// A touched site failed while the transaction was active.
    SiteFailed { site: SiteId },

    /// A touched site is down at end time.
    SiteFailureAfterAccess,

    /// Every target site of some buffered write is down at end time.
    NoAvailableSiteForWrite,

    /// Another transaction committed a written variable first.
    FirstCommitterWins {
        variable: VariableId,
        writer: String,
    },

    /// Committing would close a serialization cycle.
    SerializationCycle,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::SiteFailed { site } => write!(f, "site {} failed", site),
            AbortReason::SiteFailureAfterAccess => write!(f, "site failure after access"),
            AbortReason::NoAvailableSiteForWrite => write!(f, "no available site for write"),
            AbortReason::FirstCommitterWins { variable, writer } => {
                write!(
                    f,
                    "First-committer-wins conflict on {} with {}",
                    variable, writer
                )
            }
            AbortReason::SerializationCycle => write!(f, "Serialization cycle detected"),
        }
    }
}

impl From<CommitRejection> for AbortReason {
    fn from(rejection: CommitRejection) -> Self {
        match rejection {
            CommitRejection::FirstCommitterWins { variable, writer } => {
                AbortReason::FirstCommitterWins { variable, writer }
            }
            CommitRejection::SerializationCycle => AbortReason::SerializationCycle,
        }
    }
}

/// One transaction's state.
#[derive(Clone, Debug)]
pub struct Transaction {
    name: String,
    status: TransactionStatus,
    begin_ts: Timestamp,
    commit_ts: Option<Timestamp>,
    read_set: BTreeMap<VariableId, ReadSource>,
    write_set: BTreeMap<VariableId, WriteIntent>,
    touched_sites: BTreeSet<SiteId>,
}

impl Transaction {
    /// Creates an active transaction with its begin snapshot.
    pub fn new(name: impl Into<String>, begin_ts: Timestamp) -> Self {
        Self {
            name: name.into(),
            status: TransactionStatus::Active,
            begin_ts,
            commit_ts: None,
            read_set: BTreeMap::new(),
            write_set: BTreeMap::new(),
            touched_sites: BTreeSet::new(),
        }
    }

    /// The transaction identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The lifecycle state.
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Whether the transaction is still running.
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// The snapshot bound taken at begin.
    pub fn begin_ts(&self) -> Timestamp {
        self.begin_ts
    }

    /// The commit timestamp, once committed.
    pub fn commit_ts(&self) -> Option<Timestamp> {
        self.commit_ts
    }

    /// The buffered value for a variable this transaction has written.
    pub fn buffered_value(&self, variable: VariableId) -> Option<i64> {
        self.write_set.get(&variable).map(WriteIntent::value)
    }

    /// Records a read served from a site, marking the site touched.
    pub fn record_read(&mut self, variable: VariableId, site: SiteId, version_ts: Timestamp) {
        self.read_set.insert(variable, ReadSource { site, version_ts });
        self.touched_sites.insert(site);
    }

    /// Buffers a write with its target snapshot, marking every target
    /// touched. A second write to the same variable replaces value and
    /// targets; previously touched sites stay touched.
    pub fn record_write(&mut self, variable: VariableId, value: i64, targets: BTreeSet<SiteId>) {
        self.touched_sites.extend(targets.iter().copied());
        self.write_set.insert(variable, WriteIntent { value, targets });
    }

    /// The read set, ascending by variable.
    pub fn read_set(&self) -> &BTreeMap<VariableId, ReadSource> {
        &self.read_set
    }

    /// The write set, ascending by variable.
    pub fn write_set(&self) -> &BTreeMap<VariableId, WriteIntent> {
        &self.write_set
    }

    /// The variables this transaction intends to write, ascending.
    pub fn write_variables(&self) -> Vec<VariableId> {
        self.write_set.keys().copied().collect()
    }

    /// Every site this transaction read from or targeted with a write.
    pub fn touched_sites(&self) -> &BTreeSet<SiteId> {
        &self.touched_sites
    }

    /// Whether this transaction touched the given site.
    pub fn touched(&self, site: SiteId) -> bool {
        self.touched_sites.contains(&site)
    }

    /// Finalizes the transaction as committed.
    pub fn mark_committed(&mut self, commit_ts: Timestamp) {
        self.status = TransactionStatus::Committed;
        self.commit_ts = Some(commit_ts);
    }

    /// Finalizes the transaction as aborted.
    pub fn mark_aborted(&mut self) {
        self.status = TransactionStatus::Aborted;
    }
}
