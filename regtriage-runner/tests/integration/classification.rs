// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use maplit::btreeset;
use pretty_assertions::assert_eq;
use regtriage_metadata::OutcomeBucket;
use regtriage_runner::{
    classify::{NO_ERROR_LOG, buckets_for, representative_error},
    scanner::TestCase,
};

fn find<'a>(test_cases: &'a [TestCase], name: &str) -> &'a TestCase {
    test_cases
        .iter()
        .find(|test_case| test_case.name() == name)
        .unwrap_or_else(|| panic!("test case {name} not found"))
}

fn names<'a>(iter: impl Iterator<Item = &'a TestCase>) -> Vec<&'a str> {
    iter.map(|test_case| test_case.name()).collect()
}

#[test]
fn scenario_completed_with_error() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test(
        "test_t1",
        Some("Build successful\n"),
        Some(indoc! {"
            Running test test_t1
            reset done
            UVM_ERROR @ 10: bad
            TEST FAILED
        "}),
    );

    let (signatures, classification) = tree.triage();
    let t1 = find(classification.test_cases(), "test_t1");
    assert_eq!(
        buckets_for(t1).collect::<Vec<_>>(),
        [OutcomeBucket::SimulationCompleted]
    );
    assert_eq!(t1.first_simulation_error_line(), Some("UVM_ERROR @ 10: bad"));

    let summary = classification.to_summary(tree.root(), &signatures);
    let uvm_error = summary
        .tally
        .signatures
        .iter()
        .find(|entry| entry.name == "UVM_ERROR")
        .expect("UVM_ERROR is tallied");
    assert_eq!(uvm_error.total_occurrences, 1);
    assert_eq!(uvm_error.tests_affected, btreeset! {"test_t1".to_owned()});
    ensure!(
        summary.compilation_tally.signatures.iter().all(|entry| entry.total_occurrences == 0),
        "compilation tally is empty when the build succeeded"
    );

    Ok(())
}

#[test]
fn scenario_missing_logs() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test("test_t2", None, None);

    let (_, classification) = tree.triage();
    let t2 = find(classification.test_cases(), "test_t2");
    assert_eq!(buckets_for(t2).collect::<Vec<_>>(), [OutcomeBucket::MissingLogs]);
    assert!(classification.tally().is_empty());
    assert!(classification.compilation_tally().is_empty());
    assert_eq!(
        representative_error(OutcomeBucket::MissingLogs, t2).unwrap_or(NO_ERROR_LOG),
        NO_ERROR_LOG
    );

    Ok(())
}

#[test]
fn scenario_boot_error() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test(
        "test_t3",
        Some("Build successful\n"),
        Some("loading image\nUVM_FATAL @ 0: boot rom checksum\n"),
    )
    .add_test("test_t3_quiet", Some("Build successful\n"), Some("loading image\n"));

    let (_, classification) = tree.triage();
    assert_eq!(
        names(classification.bucket(OutcomeBucket::BootError)),
        ["test_t3", "test_t3_quiet"]
    );

    let t3 = find(classification.test_cases(), "test_t3");
    assert_eq!(
        representative_error(OutcomeBucket::BootError, t3),
        Some("UVM_FATAL @ 0: boot rom checksum")
    );
    let quiet = find(classification.test_cases(), "test_t3_quiet");
    assert_eq!(representative_error(OutcomeBucket::BootError, quiet), None);

    Ok(())
}

#[test]
fn overlapping_buckets() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test(
        "test_overlap",
        Some("elaborating\nUVM_ERROR @ 0: unresolved reference\n"),
        Some("simulator exited\n"),
    );

    let (signatures, classification) = tree.triage();
    let summary = classification.to_summary(tree.root(), &signatures);

    let compilation = summary.bucket(OutcomeBucket::CompilationFailed);
    assert_eq!(compilation.len(), 1);
    assert_eq!(
        compilation[0].representative_error.as_deref(),
        Some("UVM_ERROR @ 0: unresolved reference")
    );

    let boot = summary.bucket(OutcomeBucket::BootError);
    assert_eq!(boot.len(), 1);
    assert_eq!(boot[0].test_name, "test_overlap");
    assert_eq!(boot[0].representative_error, None);
    assert_eq!(
        boot[0].compilation_error.as_deref(),
        Some("UVM_ERROR @ 0: unresolved reference")
    );

    let uvm_error = &summary.compilation_tally.signatures[1];
    assert_eq!(uvm_error.name, "UVM_ERROR");
    assert_eq!(uvm_error.total_occurrences, 1);
    assert_eq!(summary.tally.signatures[1].total_occurrences, 0);

    Ok(())
}

#[test]
fn first_error_line_is_never_overwritten() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test(
        "test_first",
        Some("Build successful\n"),
        Some(indoc! {"
            Running test
            ASSERTION_ERROR @ 5: first
            UVM_FATAL @ 6: second
            ASSERTION_ERROR @ 7: third
        "}),
    );

    let (signatures, classification) = tree.triage();
    let test_case = find(classification.test_cases(), "test_first");
    assert_eq!(
        test_case.first_simulation_error_line(),
        Some("ASSERTION_ERROR @ 5: first")
    );
    assert_eq!(
        buckets_for(test_case).collect::<Vec<_>>(),
        [OutcomeBucket::Hung]
    );

    let summary = classification.to_summary(tree.root(), &signatures);
    let assertion = summary
        .tally
        .signatures
        .iter()
        .find(|entry| entry.name == "ASSERTION_ERROR")
        .expect("ASSERTION_ERROR is tallied");
    assert_eq!(assertion.total_occurrences, 2);
    assert_eq!(assertion.tests_affected.len(), 1);

    Ok(())
}

#[test]
fn wildcard_lines_across_tests() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    let log = "Running test\n*Error: bus timeout\nTEST PASSED\n";
    tree.add_test("test_b", Some("Build successful\n"), Some(log))
        .add_test("test_a", Some("Build successful\n"), Some(log));

    let (signatures, classification) = tree.triage();
    let summary = classification.to_summary(tree.root(), &signatures);
    assert_eq!(summary.tally.wildcard.len(), 1);
    let wildcard = &summary.tally.wildcard[0];
    assert_eq!(wildcard.line, "*Error: bus timeout");
    assert_eq!(wildcard.occurrence_count, 2);
    // Discovery order is sorted, so test_a is seen first.
    assert_eq!(wildcard.tests_affected, ["test_a", "test_b"]);

    for test_case in classification.test_cases() {
        assert!(test_case.observations().wildcard_error_seen);
    }

    Ok(())
}

#[test]
fn nested_directories_and_pattern() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.write_config(indoc! {r#"
        [discovery]
        directory-pattern = "^tc_"
    "#})
    .add_test("block_a/TC_smoke", Some("Build successful\n"), Some("Running test\nTEST PASSED\n"))
    .add_test("block_b/tc_stress", Some("Build successful\n"), Some("Running test\n"))
    .add_test("block_b/test_ignored", None, None);

    let (_, classification) = tree.triage();
    assert_eq!(
        names(classification.test_cases().iter()),
        ["TC_smoke", "tc_stress"]
    );
    assert_eq!(
        names(classification.bucket(OutcomeBucket::SimulationCompleted)),
        ["TC_smoke"]
    );
    assert_eq!(names(classification.bucket(OutcomeBucket::Hung)), ["tc_stress"]);
    assert_eq!(classification.bucket_len(OutcomeBucket::MissingLogs), 0);

    Ok(())
}

#[test]
fn triage_is_idempotent() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    tree.add_test(
        "test_1",
        Some("UVM_ERROR @ 0: lint\n"),
        Some("Running test\n*Error: x\nUVM_WARNING @ 1: w\n"),
    )
    .add_test("test_2", None, Some("Running test\nTEST PASSED\n"))
    .add_test("test_3", None, None);

    let (signatures, first) = tree.triage();
    let (_, second) = tree.triage();
    assert_eq!(
        first.to_summary(tree.root(), &signatures),
        second.to_summary(tree.root(), &signatures)
    );

    Ok(())
}
