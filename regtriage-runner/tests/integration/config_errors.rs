// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use color_eyre::eyre::Result;
use regtriage_runner::{
    config::TriageConfig,
    discovery::discover_test_dirs,
    errors::{ConfigurationError, DiscoveryError},
    signature::{SignatureSet, keys},
};
use test_case::test_case;

#[test_case(
    SIGNATURES.replace("TEST_START_SIGNATURE", "TEST_BEGIN_SIGNATURE"),
    "required signature `TEST_START_SIGNATURE` is missing"
    ; "missing key"
)]
#[test_case(
    SIGNATURES.replace("\"Build successful\"", "\"\""),
    "signature `COMPILATION_SUCCESSFUL_SIGNATURE` has an empty value"
    ; "empty value"
)]
#[test_case(
    SIGNATURES.replace("\"Running test\"", "\"Running (test\""),
    "signature `TEST_START_SIGNATURE` is not a valid pattern"
    ; "bad regex"
)]
#[test_case(
    format!(
        "{SIGNATURES}KNOWN_ERROR_A = \"A @ (?P<t>x)\"\nKNOWN_ERROR_B = \"B @ (?P<t>y)\"\n"
    ),
    "signatures `KNOWN_ERROR_A` and `KNOWN_ERROR_B` both define capture group `t`"
    ; "shared capture group"
)]
fn signature_file_errors(contents: String, message: &str) -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    std::fs::write(tree.signature_file(), contents)?;
    let err = SignatureSet::from_file(&tree.signature_file())
        .expect_err("signature file is invalid");
    assert_eq!(err.to_string(), message);

    Ok(())
}

#[test]
fn missing_signature_file() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    let err = SignatureSet::from_file(&tree.root().join("nope.log"))
        .expect_err("signature file is missing");
    assert!(
        matches!(err, ConfigurationError::SignatureFileRead { .. }),
        "unexpected error: {err}"
    );

    Ok(())
}

#[test]
fn known_error_keys_replace_defaults() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    std::fs::write(
        tree.signature_file(),
        format!("{SIGNATURES}KNOWN_ERROR_XPROP = \"X_PROPAGATION @\"\n"),
    )?;
    let signatures = SignatureSet::from_file(&tree.signature_file())?;
    let names: Vec<_> = signatures
        .known_errors()
        .iter()
        .map(|signature| signature.name())
        .collect();
    assert_eq!(names, ["X_PROPAGATION"]);

    Ok(())
}

#[test]
fn absent_finish_signature() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    let contents: String = SIGNATURES
        .lines()
        .filter(|line| !line.starts_with(keys::SIMULATION_FINISH))
        .map(|line| format!("{line}\n"))
        .collect();
    std::fs::write(tree.signature_file(), contents)?;
    tree.add_test(
        "test_finish",
        Some("Build successful\n"),
        Some("Running test\n$finish\n"),
    );

    let (signatures, classification) = tree.triage();
    assert!(signatures.simulation_finish().is_none());
    let test_case = &classification.test_cases()[0];
    assert!(!test_case.observations().simulation_finished);
    assert!(test_case.observations().test_started);

    Ok(())
}

#[test]
fn no_directories_found() -> Result<()> {
    test_init();

    let tree = RegressionTree::new();
    std::fs::create_dir(tree.root().join("logs"))?;

    let config = TriageConfig::from_sources(tree.root(), None)?;
    let err = discover_test_dirs(tree.root(), config.discovery())
        .expect_err("no test directories");
    assert!(
        matches!(err, DiscoveryError::NoDirectoriesFound { .. }),
        "unexpected error: {err}"
    );

    Ok(())
}
