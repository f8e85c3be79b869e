//! Simulator - the single owner of all core state
//!
//! One `Simulator` aggregates the clock, version store, site table, conflict
//! tracker, and transaction table, and executes directives strictly in input
//! order. There is no other execution context: every mutation happens on
//! this loop, which is what makes a run reproducible.
//!
//! `run_script` is the whole-script facade: it splits the input into test
//! segments, runs each against a fresh simulator, reports parse warnings,
//! and appends the implicit end-of-segment dump when a segment contains no
//! explicit dump directive. The CLI and the integration tests are both thin
//! clients of this function.

use crate::conflict::ConflictTracker;
use crate::mvcc::{Version, VersionStore};
use crate::observability::{Event, EventLog};
use crate::script::{parse_line, test_marker, Directive};
use crate::site::{SiteId, SiteManager, VariableId};
use crate::txn::{Transaction, TransactionManager};

use super::clock::LogicalClock;
use super::errors::EngineResult;
use super::report::Report;

/// The simulator aggregate.
#[derive(Clone, Debug)]
pub struct Simulator {
    clock: LogicalClock,
    store: VersionStore,
    sites: SiteManager,
    conflicts: ConflictTracker,
    txns: TransactionManager,
    events: EventLog,
}

impl Simulator {
    /// Creates a fresh simulator with the seeded topology and no event
    /// logging.
    pub fn new() -> Self {
        Self::with_events(EventLog::disabled())
    }

    /// Creates a fresh simulator forwarding events to the given sink.
    pub fn with_events(events: EventLog) -> Self {
        Self {
            clock: LogicalClock::new(),
            store: VersionStore::seeded(),
            sites: SiteManager::new(),
            conflicts: ConflictTracker::new(),
            txns: TransactionManager::new(),
            events,
        }
    }

    /// Executes one directive, appending its report lines.
    pub fn execute(&mut self, directive: &Directive, report: &mut Report) -> EngineResult<()> {
        match directive {
            Directive::Begin { txn } => {
                self.txns.begin(
                    txn,
                    &mut self.clock,
                    &mut self.conflicts,
                    &self.events,
                    report,
                );
                Ok(())
            }
            Directive::End { txn } => self.txns.end(
                txn,
                &mut self.clock,
                &mut self.store,
                &mut self.sites,
                &mut self.conflicts,
                &self.events,
                report,
            ),
            Directive::Read { txn, variable } => self.txns.read(
                txn,
                *variable,
                &self.store,
                &self.sites,
                &mut self.conflicts,
                &self.events,
                report,
            ),
            Directive::Write {
                txn,
                variable,
                value,
            } => {
                self.txns
                    .write(txn, *variable, *value, &self.sites, &self.events, report);
                Ok(())
            }
            Directive::Fail { site } => {
                self.fail_site(*site, report);
                Ok(())
            }
            Directive::Recover { site } => {
                self.recover_site(*site);
                Ok(())
            }
            Directive::DumpAll => self.dump_all(report),
            Directive::DumpVariable { variable } => self.dump_variable(*variable, report),
            Directive::DumpSite { site } => self.dump_site(*site, report),
            Directive::Reset => {
                self.events.emit(Event::SimulatorReset, &[]);
                *self = Simulator::with_events(self.events);
                Ok(())
            }
        }
    }

    /// Read access to a transaction record (for tests and tooling).
    pub fn transaction(&self, name: &str) -> Option<&Transaction> {
        self.txns.get(name)
    }

    /// Read access to the site table.
    pub fn sites(&self) -> &SiteManager {
        &self.sites
    }

    /// Read access to the version store.
    pub fn store(&self) -> &VersionStore {
        &self.store
    }

    /// Fails a site and cascades aborts to every active transaction that
    /// touched it. The abort lines appear before the clock advances; a fail
    /// of an already-failed site is a no-op and leaves the clock alone.
    fn fail_site(&mut self, site: SiteId, report: &mut Report) {
        if !self.sites.fail(site, self.clock.now()) {
            return;
        }
        self.events.emit(Event::SiteFailed, &[("site", &site.to_string())]);
        self.txns
            .handle_site_failure(site, &mut self.conflicts, &self.events, report);
        self.clock.advance();
    }

    /// Recovers a failed site. A recover of a site that is not failed is a
    /// no-op and leaves the clock alone.
    fn recover_site(&mut self, site: SiteId) {
        if !self.sites.recover(site, self.clock.now()) {
            return;
        }
        self.events
            .emit(Event::SiteRecovered, &[("site", &site.to_string())]);
        self.clock.advance();
    }

    /// The newest committed version of a variable across the sites holding
    /// it. A copy that was down during a commit never has a newer version
    /// than an up-to-date copy, so this is the committed current value.
    fn current_version(&self, variable: VariableId) -> EngineResult<Option<Version>> {
        let mut newest: Option<Version> = None;
        for site in variable.holding_sites() {
            if let Some(version) = self.store.get_latest(site, variable)? {
                if newest.map_or(true, |n| version.ts() > n.ts()) {
                    newest = Some(version);
                }
            }
        }
        Ok(newest)
    }

    /// `dump()`: one line per variable whose current value differs from its
    /// initial value, then a summary line.
    fn dump_all(&self, report: &mut Report) -> EngineResult<()> {
        let mut changed = false;
        for variable in VariableId::all() {
            let Some(version) = self.current_version(variable)? else {
                continue;
            };
            if version.value() == variable.initial_value() {
                continue;
            }
            changed = true;
            if variable.is_replicated() {
                report.push(format!("{}: {} at all sites", variable, version.value()));
            } else {
                report.push(format!(
                    "{}: {} at site {}",
                    variable,
                    version.value(),
                    variable.anchor_site()
                ));
            }
        }
        report.push(if changed {
            "All other variables have their initial values."
        } else {
            "All variables have their initial values."
        });
        Ok(())
    }

    /// `dump(xN)`: the variable's newest stored value at each holding site.
    /// This reports physical store contents, not read eligibility, so failed
    /// and recovering copies appear too.
    fn dump_variable(&self, variable: VariableId, report: &mut Report) -> EngineResult<()> {
        let mut parts = Vec::new();
        for site in variable.holding_sites() {
            if let Some(version) = self.store.get_latest(site, variable)? {
                parts.push(format!("{} at site {}", version.value(), site));
            }
        }
        report.push(format!("{}: {}", variable, parts.join(", ")));
        Ok(())
    }

    /// `dump(S)`: every variable at the site, ascending by index.
    fn dump_site(&self, site: SiteId, report: &mut Report) -> EngineResult<()> {
        for variable in self.store.all_variables(site)? {
            if let Some(version) = self.store.get_latest(site, variable)? {
                report.push(format!("{}: {}", variable, version.value()));
            }
        }
        Ok(())
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

/// One script segment: the lines between two `// Test <id>` markers.
struct Segment {
    id: Option<String>,
    lines: Vec<String>,
}

fn split_segments(input: &str) -> Vec<Segment> {
    let mut segments = vec![Segment {
        id: None,
        lines: Vec::new(),
    }];
    for line in input.lines() {
        if let Some(id) = test_marker(line) {
            segments.push(Segment {
                id: Some(id),
                lines: Vec::new(),
            });
        } else if let Some(current) = segments.last_mut() {
            current.lines.push(line.to_string());
        }
    }

    // A leading unnamed segment with no effective content is dropped when
    // markers exist: blank lines or prose before the first marker are not a
    // run of their own.
    if segments.len() > 1 {
        let leading_effective = segments[0].lines.iter().any(|l| {
            let t = l.trim();
            !t.is_empty() && !t.starts_with("//")
        });
        if !leading_effective {
            segments.remove(0);
        }
    }
    segments
}

/// Executes a full script and returns the report text.
///
/// `// Test <id>` markers split the script into independent segments, each
/// run against a fresh simulator under a banner line. A segment without an
/// explicit dump directive ends with an implicit `dump()`.
pub fn run_script(input: &str) -> EngineResult<String> {
    run_script_with(input, EventLog::disabled())
}

/// `run_script` with event logging.
pub fn run_script_with(input: &str, events: EventLog) -> EngineResult<String> {
    events.emit(Event::RunStart, &[]);
    let mut report = Report::new();

    for segment in split_segments(input) {
        if let Some(id) = &segment.id {
            report.push("");
            report.push(format!("============== TEST {} ===============", id));
            events.emit(Event::SegmentStart, &[("id", id)]);
        }

        let mut simulator = Simulator::with_events(events);
        let mut saw_dump = false;
        for raw in &segment.lines {
            match parse_line(raw) {
                Ok(None) => {}
                Ok(Some(directive)) => {
                    if directive.is_dump() {
                        saw_dump = true;
                    }
                    simulator.execute(&directive, &mut report)?;
                }
                Err(err) => {
                    report.push(format!("Warning: Could not parse line: {}", raw.trim()));
                    events.emit(Event::ScriptWarning, &[("error", &err.to_string())]);
                }
            }
        }
        if !saw_dump {
            simulator.execute(&Directive::DumpAll, &mut report)?;
        }
    }

    events.emit(Event::RunComplete, &[]);
    Ok(report.text())
}
