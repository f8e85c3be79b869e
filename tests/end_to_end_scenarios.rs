//! End-to-end scenario tests
//!
//! Full scripts through `run_script`, compared byte for byte against the
//! expected report. Each scenario exercises one corner of the commit
//! protocol: first-committer-wins, failure cascades, recovery routing,
//! write-skew detection, and the no-eligible-site paths.

use replikv::engine::run_script;

fn run(script: &str) -> String {
    run_script(script).unwrap()
}

// =============================================================================
// Write-write conflicts
// =============================================================================

/// Two overlapping writers of the same variable: the first committer wins,
/// the second aborts.
#[test]
fn test_first_committer_wins() {
    let script = "\
begin(T1)
begin(T2)
W(T1,x1,101)
W(T2,x1,202)
end(T1)
end(T2)
";
    let expected = "\
T1 commits
T2 aborts (First-committer-wins conflict on x1 with T1)
x1: 101 at site 1
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// Sequential writers do not conflict: the second begins after the first
/// committed.
#[test]
fn test_sequential_writers_both_commit() {
    let script = "\
begin(T1)
W(T1,x2,1)
end(T1)
begin(T2)
W(T2,x2,2)
end(T2)
";
    let expected = "\
T1 commits
T2 commits
x2: 2 at all sites
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

// =============================================================================
// Site failure
// =============================================================================

/// Failing a site aborts the active transaction that read from it, before
/// the clock advances. The later end reports the existing status.
#[test]
fn test_site_failure_aborts_accessor() {
    let script = "\
begin(T1)
R(T1,x2)
fail(2)
end(T1)
";
    let expected = "\
T1: R(x2) -> 20
T1 aborts (site 2 failed)
T1 already aborted
All variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// A transaction that never touched the failed site is unaffected.
#[test]
fn test_unrelated_site_failure_is_harmless() {
    let script = "\
begin(T1)
R(T1,x2)
fail(9)
end(T1)
";
    let expected = "\
T1: R(x2) -> 20
T1 commits
All variables have their initial values.
";
    assert_eq!(run(script), expected);
}

// =============================================================================
// Recovery
// =============================================================================

/// After fail/recover the recovering copy is read-disabled; another copy
/// serves the committed value.
#[test]
fn test_recovery_routes_read_elsewhere() {
    let script = "\
begin(T1)
W(T1,x2,222)
end(T1)
fail(3)
recover(3)
begin(T2)
R(T2,x2)
end(T2)
";
    let expected = "\
T1 commits
T2: R(x2) -> 222
T2 commits
x2: 222 at all sites
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// Continuity rule: the recovering site has not been rewritten, so the read
/// is served by a site that stayed up, returning the committed value.
#[test]
fn test_continuity_after_recovery() {
    let script = "\
begin(T1)
W(T1,x4,44)
end(T1)
fail(5)
recover(5)
begin(T2)
R(T2,x4)
end(T2)
";
    let expected = "\
T1 commits
T2: R(x4) -> 44
T2 commits
x4: 44 at all sites
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

// =============================================================================
// Write-skew
// =============================================================================

/// Classic write-skew: both transactions read what the other writes. The
/// anti-dependency edges form a cycle, caught when the second commits.
#[test]
fn test_write_skew_rejected_by_cycle_detection() {
    let script = "\
begin(T1)
begin(T2)
R(T1,x1)
R(T2,x3)
W(T1,x3,77)
W(T2,x1,88)
end(T1)
end(T2)
";
    let expected = "\
T1: R(x1) -> 10
T2: R(x3) -> 30
T1 commits
T2 aborts (Serialization cycle detected)
x3: 77 at site 3
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

// =============================================================================
// No eligible site
// =============================================================================

/// A read of a variable whose only copy is down is refused, but the
/// transaction may still commit: a refused read touches nothing.
#[test]
fn test_unreadable_home_site_does_not_block_commit() {
    let script = "\
fail(1)
begin(T1)
R(T1,x1)
end(T1)
";
    let expected = "\
T1: R(x1) -> cannot read (no eligible site)
T1 commits
All variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// Failing a site that is not x1's home leaves the read unaffected.
#[test]
fn test_read_survives_unrelated_failure() {
    let script = "\
fail(2)
begin(T1)
R(T1,x1)
end(T1)
";
    let expected = "\
T1: R(x1) -> 10
T1 commits
All variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// A write buffered while every holding site is down has an empty target
/// snapshot and aborts at end.
#[test]
fn test_write_with_no_targets_aborts() {
    let script = "\
fail(1)
fail(2)
fail(3)
fail(4)
fail(5)
fail(6)
fail(7)
fail(8)
fail(9)
fail(10)
begin(T1)
W(T1,x2,5)
end(T1)
";
    let expected = "\
T1 aborts (no available site for write)
All variables have their initial values.
";
    assert_eq!(run(script), expected);
}

// =============================================================================
// Snapshot reads
// =============================================================================

/// A transaction reads at its begin snapshot: a commit that lands after the
/// reader began stays invisible to it.
#[test]
fn test_snapshot_isolation_hides_later_commits() {
    let script = "\
begin(T1)
begin(T2)
W(T2,x2,99)
end(T2)
R(T1,x2)
end(T1)
";
    let expected = "\
T2 commits
T1: R(x2) -> 20
T1 commits
x2: 99 at all sites
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}

/// A re-read after a local write is served from the write buffer.
#[test]
fn test_read_own_write() {
    let script = "\
begin(T1)
W(T1,x2,7)
R(T1,x2)
end(T1)
";
    let expected = "\
T1: R(x2) -> 7 (from write set)
T1 commits
x2: 7 at all sites
All other variables have their initial values.
";
    assert_eq!(run(script), expected);
}
