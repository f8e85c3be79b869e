//! Observable events and the structured event log
//!
//! Events are explicit and typed: every observable step of a run - the
//! transaction lifecycle, site failures and readmissions, version installs,
//! script warnings - has a catalog entry carrying its log name and default
//! severity. The sink renders one admitted event as one JSON line on stderr,
//! synchronously, with deterministic key ordering (event name first, then
//! severity, then fields sorted by key).
//!
//! Event logging is strictly a side channel: it is off by default, stdout is
//! the report surface, and enabling tracing never alters a report line.

use std::fmt;
use std::io::{self, Write};
use std::str::FromStr;

/// Log severity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Per-directive detail (reads served, versions installed)
    Trace = 0,
    /// Normal lifecycle progress
    Info = 1,
    /// Aborts, refused reads, site failures, skipped script lines
    Warn = 2,
    /// Operation failures
    Error = 3,
    /// Unrecoverable, process exits
    Fatal = 4,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trace => "TRACE",
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trace" => Ok(Severity::Trace),
            "info" => Ok(Severity::Info),
            "warn" => Ok(Severity::Warn),
            "error" => Ok(Severity::Error),
            "fatal" => Ok(Severity::Fatal),
            other => Err(format!(
                "invalid severity '{}': expected trace|info|warn|error|fatal",
                other
            )),
        }
    }
}

/// Observable events in the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Run lifecycle
    /// Script execution begins
    RunStart,
    /// Script execution complete
    RunComplete,
    /// A test segment begins with a fresh simulator
    SegmentStart,
    /// The simulator was reset mid-script
    SimulatorReset,

    // Transaction lifecycle
    /// Transaction registered and snapshot taken
    TransactionBegun,
    /// Transaction passed validation and installed its writes
    TransactionCommitted,
    /// Transaction finalized aborted
    TransactionAborted,

    // Data plane
    /// A read was served from a copy or the local write buffer
    ReadServed,
    /// No copy was eligible to serve a read
    ReadRefused,
    /// A write was buffered with its target snapshot
    WriteBuffered,
    /// A commit installed a version at a site
    VersionInstalled,

    // Site lifecycle
    /// A site failed
    SiteFailed,
    /// A site re-entered as recovering
    SiteRecovered,
    /// A recovering site re-enabled its last variable and is up
    SiteReadmitted,

    // Input
    /// A script line could not be parsed and was skipped
    ScriptWarning,
}

impl Event {
    /// Returns the event name used in log lines.
    pub fn name(self) -> &'static str {
        match self {
            Event::RunStart => "RUN_START",
            Event::RunComplete => "RUN_COMPLETE",
            Event::SegmentStart => "SEGMENT_START",
            Event::SimulatorReset => "SIM_RESET",
            Event::TransactionBegun => "TXN_BEGIN",
            Event::TransactionCommitted => "TXN_COMMIT",
            Event::TransactionAborted => "TXN_ABORT",
            Event::ReadServed => "READ_SERVED",
            Event::ReadRefused => "READ_REFUSED",
            Event::WriteBuffered => "WRITE_BUFFERED",
            Event::VersionInstalled => "VERSION_INSTALL",
            Event::SiteFailed => "SITE_FAIL",
            Event::SiteRecovered => "SITE_RECOVER",
            Event::SiteReadmitted => "SITE_READMIT",
            Event::ScriptWarning => "SCRIPT_WARNING",
        }
    }

    /// Returns the severity this event is logged at.
    pub fn severity(self) -> Severity {
        match self {
            Event::RunStart
            | Event::RunComplete
            | Event::SegmentStart
            | Event::SimulatorReset
            | Event::TransactionBegun
            | Event::TransactionCommitted
            | Event::SiteRecovered
            | Event::SiteReadmitted => Severity::Info,
            Event::ReadServed | Event::WriteBuffered | Event::VersionInstalled => Severity::Trace,
            Event::TransactionAborted
            | Event::ReadRefused
            | Event::SiteFailed
            | Event::ScriptWarning => Severity::Warn,
        }
    }
}

/// A severity-gated event sink.
///
/// Disabled by default; when enabled it renders events at or above its
/// threshold as JSON lines on stderr. Copyable so every simulator instance
/// of a run shares the same configuration.
#[derive(Debug, Clone, Copy)]
pub struct EventLog {
    enabled: bool,
    min_severity: Severity,
}

impl EventLog {
    /// A sink that drops everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            min_severity: Severity::Fatal,
        }
    }

    /// An enabled sink emitting events at or above `min_severity`.
    pub fn with_threshold(min_severity: Severity) -> Self {
        Self {
            enabled: true,
            min_severity,
        }
    }

    /// Whether the sink forwards anything at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether an event passes the gate.
    fn admits(&self, event: Event) -> bool {
        self.enabled && event.severity() >= self.min_severity
    }

    /// Emits one event with structured fields.
    pub fn emit(&self, event: Event, fields: &[(&str, &str)]) {
        if self.admits(event) {
            let mut stderr = io::stderr();
            write_event(&mut stderr, event, fields);
        }
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Renders one event as one JSON line and writes it in a single call.
///
/// The event name comes first, then the severity, then the fields sorted
/// alphabetically by key, so identical runs log identical bytes.
fn write_event<W: Write>(writer: &mut W, event: Event, fields: &[(&str, &str)]) {
    let mut line = String::with_capacity(256);

    line.push_str("{\"event\":\"");
    line.push_str(event.name());
    line.push_str("\",\"severity\":\"");
    line.push_str(event.severity().as_str());
    line.push('"');

    let mut sorted_fields: Vec<_> = fields.iter().collect();
    sorted_fields.sort_by_key(|(k, _)| *k);

    for (key, value) in sorted_fields {
        line.push_str(",\"");
        escape_json(&mut line, key);
        line.push_str("\":\"");
        escape_json(&mut line, value);
        line.push('"');
    }

    line.push_str("}\n");

    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

/// Escape special characters for JSON strings
fn escape_json(line: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '"' => line.push_str("\\\""),
            '\\' => line.push_str("\\\\"),
            '\n' => line.push_str("\\n"),
            '\r' => line.push_str("\\r"),
            '\t' => line.push_str("\\t"),
            c if c.is_control() => {
                line.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => line.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(event: Event, fields: &[(&str, &str)]) -> String {
        let mut buffer = Vec::new();
        write_event(&mut buffer, event, fields);
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_event_names_are_stable() {
        assert_eq!(Event::TransactionBegun.name(), "TXN_BEGIN");
        assert_eq!(Event::SiteFailed.name(), "SITE_FAIL");
        assert_eq!(Event::ScriptWarning.name(), "SCRIPT_WARNING");
    }

    #[test]
    fn test_event_severities() {
        assert_eq!(Event::VersionInstalled.severity(), Severity::Trace);
        assert_eq!(Event::TransactionCommitted.severity(), Severity::Info);
        assert_eq!(Event::TransactionAborted.severity(), Severity::Warn);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Trace < Severity::Info);
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_severity_parse() {
        assert_eq!("trace".parse::<Severity>().unwrap(), Severity::Trace);
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warn);
        assert!("verbose".parse::<Severity>().is_err());
    }

    #[test]
    fn test_commit_event_renders_valid_json() {
        let line = render(
            Event::TransactionCommitted,
            &[("txn", "T1"), ("commit_ts", "4")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["event"], "TXN_COMMIT");
        assert_eq!(parsed["severity"], "INFO");
        assert_eq!(parsed["txn"], "T1");
        assert_eq!(parsed["commit_ts"], "4");
    }

    #[test]
    fn test_field_order_is_deterministic() {
        // Fields sort alphabetically regardless of emission order, so an
        // install event logs identical bytes on identical runs.
        let fields_a = [("variable", "x2"), ("commit_ts", "4"), ("site", "3")];
        let fields_b = [("site", "3"), ("variable", "x2"), ("commit_ts", "4")];

        let line_a = render(Event::VersionInstalled, &fields_a);
        let line_b = render(Event::VersionInstalled, &fields_b);
        assert_eq!(line_a, line_b);

        let commit_pos = line_a.find("commit_ts").unwrap();
        let site_pos = line_a.find("site").unwrap();
        let variable_pos = line_a.find("variable").unwrap();
        assert!(commit_pos < site_pos);
        assert!(site_pos < variable_pos);
    }

    #[test]
    fn test_event_name_leads_the_line() {
        let line = render(Event::SiteFailed, &[("site", "2")]);
        let event_pos = line.find("\"event\"").unwrap();
        let severity_pos = line.find("\"severity\"").unwrap();
        assert!(event_pos < severity_pos);
        assert!(line.starts_with('{'));
    }

    #[test]
    fn test_one_event_is_one_line() {
        let line = render(
            Event::TransactionAborted,
            &[("txn", "T2"), ("reason", "Serialization cycle detected")],
        );
        assert_eq!(line.chars().filter(|c| *c == '\n').count(), 1);
        assert!(line.ends_with('\n'));
    }

    #[test]
    fn test_abort_reason_is_escaped() {
        // A hostile transaction name must not break the JSON framing.
        let line = render(
            Event::TransactionAborted,
            &[("txn", "T\"1\""), ("reason", "site 2 failed")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed["txn"], "T\"1\"");
        assert_eq!(parsed["reason"], "site 2 failed");
    }

    #[test]
    fn test_disabled_sink_admits_nothing() {
        let sink = EventLog::disabled();
        assert!(!sink.is_enabled());
        assert!(!sink.admits(Event::TransactionAborted));
        // Emission on a disabled sink is a no-op; this verifies no panic.
        sink.emit(Event::RunStart, &[]);
    }

    #[test]
    fn test_threshold_gates_by_event_severity() {
        let sink = EventLog::with_threshold(Severity::Warn);
        assert!(sink.is_enabled());
        assert!(sink.admits(Event::TransactionAborted));
        assert!(sink.admits(Event::SiteFailed));
        assert!(!sink.admits(Event::TransactionCommitted));
        assert!(!sink.admits(Event::ReadServed));
    }

    #[test]
    fn test_trace_threshold_admits_everything() {
        let sink = EventLog::with_threshold(Severity::Trace);
        assert!(sink.admits(Event::ReadServed));
        assert!(sink.admits(Event::RunStart));
        assert!(sink.admits(Event::ScriptWarning));
    }
}
