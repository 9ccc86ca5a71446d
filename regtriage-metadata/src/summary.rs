// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

/// Summary of a triage run, as produced by `regtriage run --message-format json`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TriageSummary {
    /// The root directory that was searched for test directories.
    pub root: Utf8PathBuf,

    /// The number of test directories that were scanned.
    pub test_count: usize,

    /// Test cases per outcome bucket.
    ///
    /// Buckets are not mutually exclusive: a test case can appear in more than one bucket. Every
    /// bucket is present, possibly with an empty list.
    pub buckets: BTreeMap<OutcomeBucket, Vec<BucketEntrySummary>>,

    /// Error signature occurrences across all simulation logs.
    pub tally: ErrorTallySummary,

    /// Error signature occurrences across the compilation logs of test cases whose build was not
    /// detected as successful.
    pub compilation_tally: ErrorTallySummary,
}

impl TriageSummary {
    /// Creates a new summary.
    pub fn new(
        root: impl Into<Utf8PathBuf>,
        test_count: usize,
        buckets: BTreeMap<OutcomeBucket, Vec<BucketEntrySummary>>,
        tally: ErrorTallySummary,
        compilation_tally: ErrorTallySummary,
    ) -> Self {
        Self {
            root: root.into(),
            test_count,
            buckets,
            tally,
            compilation_tally,
        }
    }

    /// Parses JSON output from `regtriage run --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Returns the entries for the given bucket.
    pub fn bucket(&self, bucket: OutcomeBucket) -> &[BucketEntrySummary] {
        self.buckets.get(&bucket).map_or(&[], |entries| entries)
    }
}

/// An outcome category that a test case can belong to.
///
/// The order of the variants is the order in which buckets are reported.
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeBucket {
    /// The build was not detected as successful and the compilation log contains a known error.
    CompilationFailed,

    /// Both logs exist, but the test never started.
    BootError,

    /// Both logs exist and the test started, but neither a pass nor a fail marker was seen.
    Hung,

    /// Neither the compilation log nor the simulation log exists.
    MissingLogs,

    /// Both logs exist, the test started and a pass or fail marker was seen.
    SimulationCompleted,
}

impl OutcomeBucket {
    /// All buckets, in reporting order.
    pub const ALL: [Self; 5] = [
        Self::CompilationFailed,
        Self::BootError,
        Self::Hung,
        Self::MissingLogs,
        Self::SimulationCompleted,
    ];

    /// Returns the kebab-case identifier for this bucket.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CompilationFailed => "compilation-failed",
            Self::BootError => "boot-error",
            Self::Hung => "hung",
            Self::MissingLogs => "missing-logs",
            Self::SimulationCompleted => "simulation-completed",
        }
    }

    /// Returns a human-readable heading for this bucket.
    pub fn heading(self) -> &'static str {
        match self {
            Self::CompilationFailed => "compilation error",
            Self::BootError => "boot error",
            Self::Hung => "test hung",
            Self::MissingLogs => "no test logs",
            Self::SimulationCompleted => "simulation completed",
        }
    }

    /// Returns true if test cases in this bucket report the compilation-log error as their
    /// representative error. All other buckets use the first simulation-log error.
    pub fn uses_compilation_error(self) -> bool {
        matches!(self, Self::CompilationFailed)
    }
}

impl fmt::Display for OutcomeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A test case's membership in a bucket.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct BucketEntrySummary {
    /// The name of the test case (the base name of its directory).
    pub test_name: String,

    /// The representative error for this bucket, if any.
    pub representative_error: Option<String>,

    /// The first simulation-log line matching a known error signature.
    pub simulation_error: Option<String>,

    /// The first compilation-log line matching a known error signature, if the build was not
    /// detected as successful.
    pub compilation_error: Option<String>,
}

impl BucketEntrySummary {
    /// Creates a new entry, selecting the representative error based on `bucket`.
    pub fn new(
        bucket: OutcomeBucket,
        test_name: impl Into<String>,
        simulation_error: Option<String>,
        compilation_error: Option<String>,
    ) -> Self {
        let representative_error = if bucket.uses_compilation_error() {
            compilation_error.clone()
        } else {
            simulation_error.clone()
        };
        Self {
            test_name: test_name.into(),
            representative_error,
            simulation_error,
            compilation_error,
        }
    }
}

/// Error signature occurrences.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct ErrorTallySummary {
    /// One entry per named signature, in configuration order.
    pub signatures: Vec<SignatureTallySummary>,

    /// One entry per distinct wildcard error line, in first-seen order.
    pub wildcard: Vec<WildcardTallySummary>,
}

impl ErrorTallySummary {
    /// Creates a new summary.
    pub fn new(
        signatures: Vec<SignatureTallySummary>,
        wildcard: Vec<WildcardTallySummary>,
    ) -> Self {
        Self {
            signatures,
            wildcard,
        }
    }
}

/// Occurrences of a single named error signature.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct SignatureTallySummary {
    /// The display name of the signature, e.g. `UVM_ERROR`.
    pub name: String,

    /// The pattern the signature was configured with, e.g. `UVM_ERROR @`.
    pub pattern: String,

    /// The number of matching lines.
    pub total_occurrences: u64,

    /// The test cases with at least one matching line.
    pub tests_affected: BTreeSet<String>,
}

impl SignatureTallySummary {
    /// Creates a new signature summary.
    pub fn new(
        name: impl Into<String>,
        pattern: impl Into<String>,
        total_occurrences: u64,
        tests_affected: BTreeSet<String>,
    ) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            total_occurrences,
            tests_affected,
        }
    }
}

/// Occurrences of a wildcard error line: a line matching the generic `*Error` marker.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct WildcardTallySummary {
    /// The exact text of the line.
    pub line: String,

    /// The number of times the line occurred.
    pub occurrence_count: u64,

    /// The test case for each occurrence, in first-seen order. A test case appears once per
    /// occurrence.
    pub tests_affected: Vec<String>,
}

impl WildcardTallySummary {
    /// Creates a new wildcard summary. The occurrence count is the number of affected tests.
    pub fn new(line: impl Into<String>, tests_affected: Vec<String>) -> Self {
        Self {
            line: line.into(),
            occurrence_count: tests_affected.len() as u64,
            tests_affected,
        }
    }
}
