// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifying scanned test cases into outcome buckets.
//!
//! Buckets are not mutually exclusive. Each bucket has an independent predicate over a test
//! case's observations, and a test case is listed in every bucket whose predicate it satisfies.
//! For example, a test whose build failed and which never started is both
//! [`OutcomeBucket::CompilationFailed`] and [`OutcomeBucket::BootError`].

use crate::{
    scanner::{ScanOutput, TestCase, TestCaseScanner},
    signature::SignatureSet,
    tally::ErrorTally,
};
use camino::Utf8Path;
use regtriage_metadata::{BucketEntrySummary, OutcomeBucket, TriageSummary};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Displayed wherever a representative error is required but absent.
pub const NO_ERROR_LOG: &str = "No error log";

/// Returns true if `test_case` belongs to `bucket`.
pub fn is_member(bucket: OutcomeBucket, test_case: &TestCase) -> bool {
    let observations = test_case.observations();
    match bucket {
        OutcomeBucket::MissingLogs => {
            !test_case.has_compilation_log() && !test_case.has_simulation_log()
        }
        OutcomeBucket::CompilationFailed => {
            !observations.build_succeeded
                && test_case.has_compilation_log()
                && test_case.first_compilation_error_line().is_some()
        }
        OutcomeBucket::BootError => test_case.has_both_logs() && !observations.test_started,
        OutcomeBucket::Hung => {
            test_case.has_both_logs() && observations.test_started && !observations.pass_or_fail_seen
        }
        OutcomeBucket::SimulationCompleted => {
            test_case.has_both_logs() && observations.test_started && observations.pass_or_fail_seen
        }
    }
}

/// Returns the buckets `test_case` belongs to, in reporting order.
pub fn buckets_for(test_case: &TestCase) -> impl Iterator<Item = OutcomeBucket> + '_ {
    OutcomeBucket::ALL
        .into_iter()
        .filter(move |&bucket| is_member(bucket, test_case))
}

/// Returns the representative error of `test_case` in `bucket`, if any.
pub fn representative_error(bucket: OutcomeBucket, test_case: &TestCase) -> Option<&str> {
    if bucket.uses_compilation_error() {
        test_case.first_compilation_error_line()
    } else {
        test_case.first_simulation_error_line()
    }
}

/// The classification of a run.
#[derive(Clone, Debug)]
pub struct Classification {
    test_cases: Vec<TestCase>,
    // Indexes into `test_cases`, in traversal order.
    buckets: BTreeMap<OutcomeBucket, Vec<usize>>,
    tally: ErrorTally,
    compilation_tally: ErrorTally,
}

impl Classification {
    /// Returns all test cases, in traversal order.
    pub fn test_cases(&self) -> &[TestCase] {
        &self.test_cases
    }

    /// Iterates over the test cases in `bucket`, in traversal order.
    pub fn bucket(&self, bucket: OutcomeBucket) -> impl Iterator<Item = &TestCase> + '_ {
        self.buckets
            .get(&bucket)
            .into_iter()
            .flatten()
            .map(|&index| &self.test_cases[index])
    }

    /// Returns the number of test cases in `bucket`.
    pub fn bucket_len(&self, bucket: OutcomeBucket) -> usize {
        self.buckets.get(&bucket).map_or(0, |indexes| indexes.len())
    }

    /// Returns the run-wide simulation-log tally.
    pub fn tally(&self) -> &ErrorTally {
        &self.tally
    }

    /// Returns the run-wide compilation-log tally.
    pub fn compilation_tally(&self) -> &ErrorTally {
        &self.compilation_tally
    }

    /// Converts this classification into its serializable form.
    pub fn to_summary(&self, root: &Utf8Path, signatures: &SignatureSet) -> TriageSummary {
        let buckets = OutcomeBucket::ALL
            .into_iter()
            .map(|bucket| {
                let entries = self
                    .bucket(bucket)
                    .map(|test_case| {
                        BucketEntrySummary::new(
                            bucket,
                            test_case.name(),
                            test_case.first_simulation_error_line().map(str::to_owned),
                            test_case.first_compilation_error_line().map(str::to_owned),
                        )
                    })
                    .collect();
                (bucket, entries)
            })
            .collect();

        TriageSummary::new(
            root,
            self.test_cases.len(),
            buckets,
            self.tally.to_summary(signatures.known_errors()),
            self.compilation_tally.to_summary(signatures.known_errors()),
        )
    }
}

/// Combines scanned test cases into bucket memberships and run-wide tallies.
#[derive(Clone, Copy, Debug)]
pub struct ClassificationEngine<'a> {
    scanner: TestCaseScanner<'a>,
}

impl<'a> ClassificationEngine<'a> {
    /// Creates a new engine.
    pub fn new(signatures: &'a SignatureSet) -> Self {
        Self {
            scanner: TestCaseScanner::new(signatures),
        }
    }

    /// Scans every directory in `dirs`, in order, and classifies the results.
    pub fn run<I>(&self, dirs: I) -> Classification
    where
        I: IntoIterator,
        I::Item: AsRef<Utf8Path>,
    {
        let outputs = dirs
            .into_iter()
            .map(|dir| self.scanner.scan(dir.as_ref()));
        self.classify(outputs)
    }

    /// Classifies already-scanned test cases, merging their tallies in order.
    pub fn classify(&self, outputs: impl IntoIterator<Item = ScanOutput>) -> Classification {
        let signature_count = self.scanner.signatures().known_errors().len();
        let mut test_cases = Vec::new();
        let mut buckets: BTreeMap<_, Vec<usize>> = OutcomeBucket::ALL
            .into_iter()
            .map(|bucket| (bucket, Vec::new()))
            .collect();
        let mut tally = ErrorTally::new(signature_count);
        let mut compilation_tally = ErrorTally::new(signature_count);

        for output in outputs {
            let index = test_cases.len();
            for bucket in buckets_for(&output.test_case) {
                debug!("[{}] classified as {bucket}", output.test_case.name());
                buckets.entry(bucket).or_default().push(index);
            }
            tally.merge(output.tally);
            compilation_tally.merge(output.compilation_tally);
            test_cases.push(output.test_case);
        }

        info!(
            "classified {} test {}",
            test_cases.len(),
            if test_cases.len() == 1 { "case" } else { "cases" },
        );

        Classification {
            test_cases,
            buckets,
            tally,
            compilation_tally,
        }
    }
}
