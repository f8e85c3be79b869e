//! Conflict tracking - first-committer-wins and serializability
//!
//! The tracker records, across the whole run, who committed what and who read
//! what, and maintains the serialization graph those histories induce.
//! Commit validation combines two rules:
//!
//! - **First-committer-wins.** A transaction may not commit a write to a
//!   variable that another transaction committed after the writer began.
//!   Only committed writers participate: `last_writer` is updated at commit
//!   time and never speculatively.
//! - **Serializability.** Committing must not close a cycle in the
//!   serialization graph. The check adds the WW and RW edges the pending
//!   writes induce, then runs cycle detection from the committing
//!   transaction.
//!
//! Histories of committed transactions persist for the rest of the run; an
//! aborted transaction is purged completely.

use std::collections::{BTreeMap, BTreeSet};

use crate::mvcc::Timestamp;
use crate::site::VariableId;

use super::graph::{DependencyKind, SerializationGraph};

/// The committed writer of record for one variable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedWrite {
    writer: String,
    commit_ts: Timestamp,
}

impl CommittedWrite {
    /// The committing transaction's identity.
    pub fn writer(&self) -> &str {
        &self.writer
    }

    /// When the write committed.
    pub fn commit_ts(&self) -> Timestamp {
        self.commit_ts
    }
}

/// Why a commit was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitRejection {
    /// Another transaction committed the variable after this one began.
    FirstCommitterWins {
        variable: VariableId,
        writer: String,
    },

    /// Committing would close a cycle in the serialization graph.
    SerializationCycle,
}

/// Run-wide conflict state.
#[derive(Clone, Debug, Default)]
pub struct ConflictTracker {
    /// Most recent committed writer per variable.
    last_writer: BTreeMap<VariableId, CommittedWrite>,
    /// Committed writes per transaction: variable → commit timestamp.
    write_history: BTreeMap<String, BTreeMap<VariableId, Timestamp>>,
    /// Variables each live or committed transaction has read.
    read_history: BTreeMap<String, BTreeSet<VariableId>>,
    /// The serialization graph.
    graph: SerializationGraph,
}

impl ConflictTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ensures a graph node for the transaction.
    pub fn register_transaction(&mut self, txn: &str) {
        self.graph.ensure_node(txn);
        self.read_history.entry(txn.to_string()).or_default();
    }

    /// Records a read of `variable` at `version_ts`. If a tracked commit
    /// installed exactly that version, the reader picks up a WR edge from
    /// the writer. The seeded initial versions have no writer.
    pub fn record_read(&mut self, reader: &str, variable: VariableId, version_ts: Timestamp) {
        self.read_history
            .entry(reader.to_string())
            .or_default()
            .insert(variable);

        let writer = self
            .write_history
            .iter()
            .find(|(txn, history)| {
                txn.as_str() != reader && history.get(&variable) == Some(&version_ts)
            })
            .map(|(txn, _)| txn.clone());

        if let Some(writer) = writer {
            self.graph
                .add_edge(&writer, reader, DependencyKind::WriteRead);
        }
    }

    /// First-committer-wins: rejects if any variable the transaction intends
    /// to write was committed by someone else after `begin_ts`. Variables
    /// are checked in ascending order, so the surfaced conflict is
    /// deterministic.
    pub fn check_fcw(
        &self,
        txn: &str,
        begin_ts: Timestamp,
        writes: &[VariableId],
    ) -> Result<(), CommitRejection> {
        for &variable in writes {
            if let Some(last) = self.last_writer.get(&variable) {
                if last.writer() != txn && last.commit_ts() > begin_ts {
                    return Err(CommitRejection::FirstCommitterWins {
                        variable,
                        writer: last.writer().to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Adds the WW and RW edges the pending writes induce, then rejects if a
    /// cycle is reachable from the committing transaction.
    pub fn check_serializable(
        &mut self,
        txn: &str,
        writes: &[VariableId],
    ) -> Result<(), CommitRejection> {
        for &variable in writes {
            if let Some(last) = self.last_writer.get(&variable) {
                if last.writer() != txn {
                    let writer = last.writer().to_string();
                    self.graph
                        .add_edge(&writer, txn, DependencyKind::WriteWrite);
                }
            }
            let readers: Vec<String> = self
                .read_history
                .iter()
                .filter(|(reader, vars)| reader.as_str() != txn && vars.contains(&variable))
                .map(|(reader, _)| reader.clone())
                .collect();
            for reader in readers {
                self.graph.add_edge(&reader, txn, DependencyKind::ReadWrite);
            }
        }

        if self.graph.has_cycle_from(txn) {
            return Err(CommitRejection::SerializationCycle);
        }
        Ok(())
    }

    /// Records a successful commit: the transaction becomes the writer of
    /// record for each written variable.
    pub fn commit(&mut self, txn: &str, writes: &[VariableId], commit_ts: Timestamp) {
        let history = self.write_history.entry(txn.to_string()).or_default();
        for &variable in writes {
            history.insert(variable, commit_ts);
        }
        for &variable in writes {
            self.last_writer.insert(
                variable,
                CommittedWrite {
                    writer: txn.to_string(),
                    commit_ts,
                },
            );
        }
    }

    /// Purges an aborted transaction: graph node, inbound edges, and both
    /// histories.
    pub fn abort(&mut self, txn: &str) {
        self.graph.remove_node(txn);
        self.read_history.remove(txn);
        self.write_history.remove(txn);
    }

    /// The committed writer of record for a variable.
    pub fn last_writer(&self, variable: VariableId) -> Option<&CommittedWrite> {
        self.last_writer.get(&variable)
    }

    /// Read access to the serialization graph.
    pub fn graph(&self) -> &SerializationGraph {
        &self.graph
    }
}
