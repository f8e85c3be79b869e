//! TransactionManager - the begin/read/write/end protocol
//!
//! Owns the transaction table. The clock, version store, site table, and
//! conflict tracker are owned by the engine and passed in by borrow per
//! call, so ownership stays single-rooted and every mutation happens on the
//! directive loop.
//!
//! The commit protocol at `end` runs its checks in a fixed order:
//! 1. touched sites must all be available,
//! 2. every buffered write must retain at least one available target,
//! 3. first-committer-wins,
//! 4. serializability (cycle check),
//! and only then installs versions and publishes the commit. Failing any
//! check finalizes the transaction aborted with that check's reason.

use std::collections::HashMap;

use crate::conflict::ConflictTracker;
use crate::engine::{EngineError, EngineResult, LogicalClock, Report};
use crate::mvcc::VersionStore;
use crate::observability::{Event, EventLog};
use crate::routing::Router;
use crate::site::{SiteId, SiteManager, VariableId};

use super::transaction::{AbortReason, Transaction, TransactionStatus};

/// The transaction table plus begin-order bookkeeping.
#[derive(Clone, Debug, Default)]
pub struct TransactionManager {
    txns: HashMap<String, Transaction>,
    /// Names in begin order; drives deterministic cascade iteration.
    order: Vec<String>,
}

impl TransactionManager {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a transaction by name.
    pub fn get(&self, name: &str) -> Option<&Transaction> {
        self.txns.get(name)
    }

    /// Number of transactions ever begun.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no transaction has begun.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Begins a transaction: snapshot at the current instant, registration
    /// in the serialization graph, clock advance. A duplicate name is a
    /// user error reported on the transcript.
    pub fn begin(
        &mut self,
        name: &str,
        clock: &mut LogicalClock,
        conflicts: &mut ConflictTracker,
        events: &EventLog,
        report: &mut Report,
    ) {
        if self.txns.contains_key(name) {
            report.push(format!("{} already exists", name));
            return;
        }
        let begin_ts = clock.now();
        self.txns
            .insert(name.to_string(), Transaction::new(name, begin_ts));
        self.order.push(name.to_string());
        conflicts.register_transaction(name);
        events.emit(
            Event::TransactionBegun,
            &[("txn", name), ("begin_ts", &begin_ts.to_string())],
        );
        clock.advance();
    }

    /// Serves a read at the transaction's begin snapshot.
    ///
    /// A variable the transaction has written comes straight from the write
    /// buffer without touching the read set. Otherwise routing picks an
    /// eligible copy; if none exists the read is refused but the transaction
    /// stays active.
    pub fn read(
        &mut self,
        name: &str,
        variable: VariableId,
        store: &VersionStore,
        sites: &SiteManager,
        conflicts: &mut ConflictTracker,
        events: &EventLog,
        report: &mut Report,
    ) -> EngineResult<()> {
        let Some(txn) = self.txns.get(name) else {
            report.push(format!("{} does not exist", name));
            return Ok(());
        };
        if !txn.is_active() {
            report.push(format!("{} is not active", name));
            return Ok(());
        }

        if let Some(value) = txn.buffered_value(variable) {
            report.push(format!(
                "{}: R({}) -> {} (from write set)",
                name, variable, value
            ));
            events.emit(
                Event::ReadServed,
                &[
                    ("txn", name),
                    ("variable", &variable.to_string()),
                    ("source", "write_set"),
                ],
            );
            return Ok(());
        }

        let begin_ts = txn.begin_ts();
        let Some((site, version_ts)) = Router::select_read_site(variable, begin_ts, store, sites)?
        else {
            report.push(format!(
                "{}: R({}) -> cannot read (no eligible site)",
                name, variable
            ));
            events.emit(
                Event::ReadRefused,
                &[("txn", name), ("variable", &variable.to_string())],
            );
            return Ok(());
        };

        // Re-fetch and cross-check the routed version; a mismatch means the
        // router and store disagree, which is a bug, not user input.
        let version = store.get_version(site, variable, begin_ts)?;
        let version = match version {
            Some(v) if v.ts() == version_ts => v,
            other => {
                return Err(EngineError::SnapshotMismatch {
                    txn: name.to_string(),
                    variable,
                    site,
                    selected: version_ts,
                    found: other.map(|v| v.ts()),
                });
            }
        };

        if let Some(txn) = self.txns.get_mut(name) {
            txn.record_read(variable, site, version_ts);
        }
        conflicts.record_read(name, variable, version_ts);
        report.push(format!("{}: R({}) -> {}", name, variable, version.value()));
        events.emit(
            Event::ReadServed,
            &[
                ("txn", name),
                ("variable", &variable.to_string()),
                ("site", &site.to_string()),
            ],
        );
        Ok(())
    }

    /// Buffers a write. The target sites are snapshotted now; nothing is
    /// installed until commit.
    pub fn write(
        &mut self,
        name: &str,
        variable: VariableId,
        value: i64,
        sites: &SiteManager,
        events: &EventLog,
        report: &mut Report,
    ) {
        let Some(txn) = self.txns.get_mut(name) else {
            report.push(format!("{} does not exist", name));
            return;
        };
        if !txn.is_active() {
            report.push(format!("{} is not active", name));
            return;
        }

        let targets = Router::select_write_sites(variable, sites);
        events.emit(
            Event::WriteBuffered,
            &[
                ("txn", name),
                ("variable", &variable.to_string()),
                ("targets", &targets.len().to_string()),
            ],
        );
        txn.record_write(variable, value, targets.into_iter().collect());
    }

    /// Runs the commit protocol.
    pub fn end(
        &mut self,
        name: &str,
        clock: &mut LogicalClock,
        store: &mut VersionStore,
        sites: &mut SiteManager,
        conflicts: &mut ConflictTracker,
        events: &EventLog,
        report: &mut Report,
    ) -> EngineResult<()> {
        let Some(txn) = self.txns.get(name) else {
            report.push(format!("{} does not exist", name));
            return Ok(());
        };
        match txn.status() {
            TransactionStatus::Committed => {
                report.push(format!("{} already committed", name));
                return Ok(());
            }
            TransactionStatus::Aborted => {
                report.push(format!("{} already aborted", name));
                return Ok(());
            }
            TransactionStatus::Active => {}
        }

        // 1. Every touched site must still be available.
        let failed_touch = txn.touched_sites().iter().find(|&&s| !sites.is_available(s));
        if failed_touch.is_some() {
            self.abort(name, AbortReason::SiteFailureAfterAccess, conflicts, events, report);
            return Ok(());
        }

        // 2. Every buffered write must retain at least one available target.
        // A write issued while every holding site was down has an empty
        // snapshot and fails here.
        let orphaned_write = txn
            .write_set()
            .values()
            .any(|intent| !intent.targets().iter().any(|&s| sites.is_available(s)));
        if orphaned_write {
            self.abort(name, AbortReason::NoAvailableSiteForWrite, conflicts, events, report);
            return Ok(());
        }

        let begin_ts = txn.begin_ts();
        let writes = txn.write_variables();
        let entries: Vec<(VariableId, i64, Vec<SiteId>)> = txn
            .write_set()
            .iter()
            .map(|(&variable, intent)| {
                (
                    variable,
                    intent.value(),
                    intent.targets().iter().copied().collect(),
                )
            })
            .collect();

        // 3. First-committer-wins among committed writers.
        if let Err(rejection) = conflicts.check_fcw(name, begin_ts, &writes) {
            self.abort(name, rejection.into(), conflicts, events, report);
            return Ok(());
        }

        // 4. Committing must not close a serialization cycle.
        if let Err(rejection) = conflicts.check_serializable(name, &writes) {
            self.abort(name, rejection.into(), conflicts, events, report);
            return Ok(());
        }

        // Commit: install every buffered write at its still-available
        // targets. Installing at a recovering site re-enables the variable
        // there and may readmit the site to Up.
        let commit_ts = clock.now();
        for (variable, value, targets) in &entries {
            for &site in targets {
                if !sites.is_available(site) {
                    continue;
                }
                store.add_version(site, *variable, commit_ts, *value)?;
                events.emit(
                    Event::VersionInstalled,
                    &[
                        ("txn", name),
                        ("variable", &variable.to_string()),
                        ("site", &site.to_string()),
                        ("commit_ts", &commit_ts.to_string()),
                    ],
                );
                if variable.is_replicated() && sites.enable_replicated_read(site, *variable) {
                    events.emit(Event::SiteReadmitted, &[("site", &site.to_string())]);
                }
            }
        }

        conflicts.commit(name, &writes, commit_ts);
        if let Some(txn) = self.txns.get_mut(name) {
            txn.mark_committed(commit_ts);
        }
        report.push(format!("{} commits", name));
        events.emit(
            Event::TransactionCommitted,
            &[("txn", name), ("commit_ts", &commit_ts.to_string())],
        );
        clock.advance();
        Ok(())
    }

    /// Aborts every active transaction that touched the failed site, in
    /// begin order. Runs synchronously inside the fail directive, before the
    /// clock advances.
    pub fn handle_site_failure(
        &mut self,
        site: SiteId,
        conflicts: &mut ConflictTracker,
        events: &EventLog,
        report: &mut Report,
    ) {
        let victims: Vec<String> = self
            .order
            .iter()
            .filter(|name| {
                self.txns
                    .get(name.as_str())
                    .map(|t| t.is_active() && t.touched(site))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        for name in victims {
            self.abort(&name, AbortReason::SiteFailed { site }, conflicts, events, report);
        }
    }

    /// Finalizes a transaction aborted and purges its conflict state.
    fn abort(
        &mut self,
        name: &str,
        reason: AbortReason,
        conflicts: &mut ConflictTracker,
        events: &EventLog,
        report: &mut Report,
    ) {
        if let Some(txn) = self.txns.get_mut(name) {
            txn.mark_aborted();
        }
        conflicts.abort(name);
        report.push(format!("{} aborts ({})", name, reason));
        events.emit(
            Event::TransactionAborted,
            &[("txn", name), ("reason", &reason.to_string())],
        );
    }
}
