// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from a classification.
//!
//! Each test directory becomes a `<testcase>` in a single `<testsuite>` named after the run. Test
//! cases that only completed simulation are reported as successes; any other bucket produces a
//! failure or an error with the representative error line as its message.

use crate::{
    classify::{Classification, NO_ERROR_LOG, buckets_for, representative_error},
    errors::WriteReportError,
    scanner::TestCase,
};
use camino::Utf8Path;
use chrono::{DateTime, FixedOffset};
use quick_junit::{NonSuccessKind, Report, TestCase as JunitTestCase, TestCaseStatus, TestSuite};
use regtriage_metadata::OutcomeBucket;
use std::fs::File;

/// Used as the status type for test cases that belong to no bucket: exactly one of the two logs
/// exists.
const PARTIAL_LOGS_TYPE: &str = "partial-logs";

/// Builds a JUnit report for `classification`.
pub fn junit_report(
    run_name: &str,
    classification: &Classification,
    timestamp: DateTime<FixedOffset>,
) -> Report {
    let mut test_suite = TestSuite::new(run_name);
    test_suite.set_timestamp(timestamp);
    for test_case in classification.test_cases() {
        test_suite.add_test_case(junit_test_case(run_name, test_case));
    }

    let mut report = Report::new(run_name);
    report.set_timestamp(timestamp).add_test_suites([test_suite]);
    report
}

/// Writes a JUnit report for `classification` to `path`, creating parent directories as needed.
pub fn write_junit(
    path: &Utf8Path,
    run_name: &str,
    classification: &Classification,
    timestamp: DateTime<FixedOffset>,
) -> Result<(), WriteReportError> {
    let report = junit_report(run_name, classification, timestamp);

    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|err| WriteReportError::CreateDir {
            dir: dir.to_owned(),
            err,
        })?;
    }
    let f = File::create(path).map_err(|err| WriteReportError::WriteFile {
        file: path.to_owned(),
        err,
    })?;
    report.serialize(f).map_err(|err| WriteReportError::Junit {
        file: path.to_owned(),
        err,
    })
}

fn junit_test_case(run_name: &str, test_case: &TestCase) -> JunitTestCase {
    let buckets: Vec<_> = buckets_for(test_case).collect();
    let failing = buckets
        .iter()
        .copied()
        .find(|&bucket| bucket != OutcomeBucket::SimulationCompleted);

    let status = match (failing, buckets.is_empty()) {
        (Some(bucket), _) => {
            let mut status = TestCaseStatus::non_success(non_success_kind(bucket));
            status
                .set_type(bucket.as_str())
                .set_message(representative_error(bucket, test_case).unwrap_or(NO_ERROR_LOG));
            if buckets.len() > 1 {
                let all: Vec<_> = buckets.iter().map(|bucket| bucket.as_str()).collect();
                status.set_description(format!("buckets: {}", all.join(", ")));
            }
            status
        }
        (None, false) => TestCaseStatus::success(),
        (None, true) => {
            let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
            status
                .set_type(PARTIAL_LOGS_TYPE)
                .set_message(if test_case.has_compilation_log() {
                    "simulation log is missing"
                } else {
                    "compilation log is missing"
                });
            status
        }
    };

    let mut junit_test_case = JunitTestCase::new(test_case.name(), status);
    junit_test_case.set_classname(run_name);
    junit_test_case
}

fn non_success_kind(bucket: OutcomeBucket) -> NonSuccessKind {
    match bucket {
        OutcomeBucket::CompilationFailed | OutcomeBucket::MissingLogs => NonSuccessKind::Error,
        OutcomeBucket::BootError | OutcomeBucket::Hung | OutcomeBucket::SimulationCompleted => {
            NonSuccessKind::Failure
        }
    }
}
