//! Script-level determinism tests
//!
//! The whole-script facade: byte-identical output on identical input, test
//! segmentation with fresh simulator instances, the implicit end-of-segment
//! dump, parse warnings, and reset.

use replikv::engine::run_script;

fn run(script: &str) -> String {
    run_script(script).unwrap()
}

// =============================================================================
// Determinism
// =============================================================================

/// Identical input yields byte-identical output.
#[test]
fn test_identical_runs_are_identical() {
    let script = "\
begin(T1)
W(T1,x2,222)
end(T1)
fail(3)
recover(3)
begin(T2)
R(T2,x2)
W(T2,x4,-5)
end(T2)
dump()
";
    assert_eq!(run(script), run(script));
}

// =============================================================================
// Segmentation
// =============================================================================

/// `// Test <id>` markers split the script into independent segments with
/// banner lines.
#[test]
fn test_segments_run_under_banners() {
    let script = "\
// Test 1
begin(T1)
end(T1)
// Test 2
dump()
";
    let expected = "\n============== TEST 1 ===============\n\
                    T1 commits\n\
                    All variables have their initial values.\n\
                    \n============== TEST 2 ===============\n\
                    All variables have their initial values.\n";
    assert_eq!(run(script), expected);
}

/// Segments never share state: a transaction begun in one segment does not
/// exist in the next, and neither do its writes.
#[test]
fn test_segments_are_isolated() {
    let script = "\
// Test a
begin(T1)
W(T1,x2,99)
end(T1)
// Test b
end(T1)
R(T2,x2)
";
    let output = run(script);
    assert!(output.contains("T1 commits"));
    assert!(output.contains("T1 does not exist"));
    // Segment b sees initial values only.
    assert!(output.ends_with("All variables have their initial values.\n"));
}

/// Directives before the first marker form their own unnamed segment.
#[test]
fn test_leading_directives_run_without_banner() {
    let script = "\
begin(T1)
end(T1)
// Test 1
dump()
";
    let output = run(script);
    assert!(output.starts_with("T1 commits\n"));
    assert!(output.contains("============== TEST 1 ==============="));
}

/// Prose comments before the first marker do not create an empty segment
/// (which would otherwise produce a spurious implicit dump).
#[test]
fn test_comment_preamble_is_not_a_segment() {
    let script = "\
// scripted scenario
// Test 1
dump()
";
    let expected = "\n============== TEST 1 ===============\n\
                    All variables have their initial values.\n";
    assert_eq!(run(script), expected);
}

// =============================================================================
// Implicit dump
// =============================================================================

/// A segment without an explicit dump ends with an implicit `dump()`.
#[test]
fn test_implicit_dump_on_missing_dump() {
    let output = run("begin(T1)\nW(T1,x1,111)\nend(T1)\n");
    assert_eq!(
        output,
        "T1 commits\nx1: 111 at site 1\nAll other variables have their initial values.\n"
    );
}

/// Any explicit dump form suppresses the implicit one.
#[test]
fn test_explicit_dump_suppresses_implicit() {
    let output = run("begin(T1)\nW(T1,x1,111)\nend(T1)\ndump(3)\n");
    // dump(3) lists site 3's variables; no trailing all-variables summary.
    assert!(output.contains("T1 commits"));
    assert!(!output.contains("initial values"));
}

/// Empty input still performs the implicit dump of the pristine state.
#[test]
fn test_empty_input_dumps_initial_state() {
    assert_eq!(run(""), "All variables have their initial values.\n");
}

// =============================================================================
// Parse warnings
// =============================================================================

/// Unparseable lines warn and are skipped; processing continues.
#[test]
fn test_bad_lines_warn_and_continue() {
    let output = run("garbage here\nbegin(T1)\nW(T1,x99,1)\nend(T1)\n");
    assert!(output.contains("Warning: Could not parse line: garbage here"));
    assert!(output.contains("Warning: Could not parse line: W(T1,x99,1)"));
    assert!(output.contains("T1 commits"));
}

/// Comments and blank lines produce no output at all.
#[test]
fn test_comments_and_blanks_ignored() {
    let output = run("\n// just a comment\n\nbegin(T1)\nend(T1)\n");
    assert_eq!(
        output,
        "T1 commits\nAll variables have their initial values.\n"
    );
}

// =============================================================================
// Reset
// =============================================================================

/// `reset()` discards all state mid-segment; later directives run against a
/// pristine simulator.
#[test]
fn test_reset_restores_initial_state() {
    let script = "\
begin(T1)
W(T1,x2,99)
end(T1)
fail(4)
reset()
begin(T1)
R(T1,x2)
end(T1)
";
    let output = run(script);
    // T1 can be begun again after reset, and x2 is back to its seed value.
    assert!(output.contains("T1: R(x2) -> 20"));
    assert!(output.ends_with("All variables have their initial values.\n"));
}
