// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scanning the logs of a single test case.

use crate::{
    errors::{DisplayErrorChain, LogReadError},
    signature::SignatureSet,
    tally::ErrorTally,
};
use bstr::{ByteSlice, io::BufReadExt};
use camino::{Utf8Path, Utf8PathBuf};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
};
use tracing::{debug, warn};

/// The kind of log file a test directory contains.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LogKind {
    /// The compilation (build) log.
    Compilation,

    /// The simulation log.
    Simulation,
}

impl fmt::Display for LogKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compilation => f.write_str("compilation"),
            Self::Simulation => f.write_str("simulation"),
        }
    }
}

/// Boolean observations collected while scanning a test case's logs.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct Observations {
    /// The build-success signature was seen in either log.
    pub build_succeeded: bool,

    /// The test start signature was seen in the simulation log.
    pub test_started: bool,

    /// The pass or fail marker was seen in the simulation log.
    pub pass_or_fail_seen: bool,

    /// The simulation finish signature was seen in the simulation log.
    pub simulation_finished: bool,

    /// A line matching the generic error marker was seen in the simulation log.
    pub wildcard_error_seen: bool,
}

/// A scanned test case.
///
/// Test cases are produced by [`TestCaseScanner::scan`] and are read-only afterwards.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCase {
    name: String,
    dir: Utf8PathBuf,
    has_compilation_log: bool,
    has_simulation_log: bool,
    observations: Observations,
    first_simulation_error_line: Option<String>,
    first_compilation_error_line: Option<String>,
}

impl TestCase {
    /// The name of the test case: the base name of its directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The test directory.
    pub fn dir(&self) -> &Utf8Path {
        &self.dir
    }

    /// Whether the compilation log exists.
    pub fn has_compilation_log(&self) -> bool {
        self.has_compilation_log
    }

    /// Whether the simulation log exists.
    pub fn has_simulation_log(&self) -> bool {
        self.has_simulation_log
    }

    /// Whether both logs exist.
    pub fn has_both_logs(&self) -> bool {
        self.has_compilation_log && self.has_simulation_log
    }

    /// The observations collected while scanning.
    pub fn observations(&self) -> &Observations {
        &self.observations
    }

    /// The first simulation-log line matching a known error signature.
    pub fn first_simulation_error_line(&self) -> Option<&str> {
        self.first_simulation_error_line.as_deref()
    }

    /// The first compilation-log line matching a known error signature. Only set if the build was
    /// not detected as successful.
    pub fn first_compilation_error_line(&self) -> Option<&str> {
        self.first_compilation_error_line.as_deref()
    }
}

/// The result of scanning a single test case.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    /// The scanned test case.
    pub test_case: TestCase,

    /// This test case's contribution to the simulation-log tally.
    pub tally: ErrorTally,

    /// This test case's contribution to the compilation-log tally.
    pub compilation_tally: ErrorTally,
}

/// Scans test directories using a [`SignatureSet`].
#[derive(Clone, Copy, Debug)]
pub struct TestCaseScanner<'a> {
    signatures: &'a SignatureSet,
}

impl<'a> TestCaseScanner<'a> {
    /// Creates a new scanner.
    pub fn new(signatures: &'a SignatureSet) -> Self {
        Self { signatures }
    }

    /// Returns the signatures used by this scanner.
    pub fn signatures(&self) -> &'a SignatureSet {
        self.signatures
    }

    /// Scans the logs in `dir`.
    ///
    /// Each log is read at most once. A missing log is not an error. A log that fails to open or
    /// read partway through produces a warning, and whatever was observed before the failure is
    /// kept.
    pub fn scan(&self, dir: &Utf8Path) -> ScanOutput {
        let name = dir.file_name().unwrap_or(dir.as_str()).to_owned();
        let compilation_log = dir.join(self.signatures.compilation_log_file());
        let simulation_log = dir.join(self.signatures.simulation_log_file());
        let has_compilation_log = compilation_log.is_file();
        let has_simulation_log = simulation_log.is_file();

        let mut state = ScanState::new(self.signatures, name);

        if has_simulation_log {
            debug!("[{}] scanning simulation log {simulation_log}", state.name);
            let res = open_log(LogKind::Simulation, &simulation_log)
                .and_then(|reader| state.read_simulation_log(&simulation_log, reader));
            if let Err(error) = res {
                warn!("[{}] {}", state.name, DisplayErrorChain::new(error));
            }
        }

        if has_compilation_log {
            debug!("[{}] scanning compilation log {compilation_log}", state.name);
            let res = open_log(LogKind::Compilation, &compilation_log)
                .and_then(|reader| state.read_compilation_log(&compilation_log, reader));
            if let Err(error) = res {
                warn!("[{}] {}", state.name, DisplayErrorChain::new(error));
            }
        }

        state.finish(dir, has_compilation_log, has_simulation_log)
    }
}

/// Observations and tallies for one test case, while its logs are being read.
#[derive(Debug)]
struct ScanState<'a> {
    signatures: &'a SignatureSet,
    name: String,
    observations: Observations,
    tally: ErrorTally,
    compilation_tally: ErrorTally,
    first_simulation_error_line: Option<String>,
    // Build success may appear after the errors, or only in the simulation log, so compilation
    // error lines are held back until both logs have been read.
    pending_compilation_errors: Vec<(usize, String)>,
}

impl<'a> ScanState<'a> {
    fn new(signatures: &'a SignatureSet, name: String) -> Self {
        let signature_count = signatures.known_errors().len();
        Self {
            signatures,
            name,
            observations: Observations::default(),
            tally: ErrorTally::new(signature_count),
            compilation_tally: ErrorTally::new(signature_count),
            first_simulation_error_line: None,
            pending_compilation_errors: Vec::new(),
        }
    }

    fn read_simulation_log(
        &mut self,
        path: &Utf8Path,
        reader: impl BufRead,
    ) -> Result<(), LogReadError> {
        read_lines(LogKind::Simulation, path, reader, |line| {
            self.scan_simulation_line(line)
        })
    }

    fn read_compilation_log(
        &mut self,
        path: &Utf8Path,
        reader: impl BufRead,
    ) -> Result<(), LogReadError> {
        read_lines(LogKind::Compilation, path, reader, |line| {
            if self.signatures.compilation_success().is_match(line) {
                self.observations.build_succeeded = true;
            }
            if let Some(index) = self.signatures.match_known_error(line) {
                self.pending_compilation_errors
                    .push((index, line.to_owned()));
            }
        })
    }

    fn scan_simulation_line(&mut self, line: &str) {
        let signatures = self.signatures;
        let observations = &mut self.observations;
        if signatures.test_start().is_match(line) {
            observations.test_started = true;
        }
        if signatures.pass_or_fail().is_match(line) {
            observations.pass_or_fail_seen = true;
        }
        if signatures
            .simulation_finish()
            .is_some_and(|finish| finish.is_match(line))
        {
            observations.simulation_finished = true;
        }
        if signatures.compilation_success().is_match(line) {
            observations.build_succeeded = true;
        }
        if let Some(index) = signatures.match_known_error(line) {
            self.tally.record_signature(index, &self.name);
            if self.first_simulation_error_line.is_none() {
                self.first_simulation_error_line = Some(line.to_owned());
            }
        }
        if signatures.is_error_marker(line) {
            self.tally.record_wildcard(line, &self.name);
            observations.wildcard_error_seen = true;
        }
    }

    /// Commits held-back compilation errors unless the build succeeded, and produces the output.
    fn finish(
        mut self,
        dir: &Utf8Path,
        has_compilation_log: bool,
        has_simulation_log: bool,
    ) -> ScanOutput {
        let mut first_compilation_error_line = None;
        if !self.observations.build_succeeded {
            for (index, line) in std::mem::take(&mut self.pending_compilation_errors) {
                self.compilation_tally.record_signature(index, &self.name);
                if first_compilation_error_line.is_none() {
                    first_compilation_error_line = Some(line);
                }
            }
        }

        debug!("[{}] observations: {:?}", self.name, self.observations);

        ScanOutput {
            test_case: TestCase {
                name: self.name,
                dir: dir.to_owned(),
                has_compilation_log,
                has_simulation_log,
                observations: self.observations,
                first_simulation_error_line: self.first_simulation_error_line,
                first_compilation_error_line,
            },
            tally: self.tally,
            compilation_tally: self.compilation_tally,
        }
    }
}

fn open_log(kind: LogKind, path: &Utf8Path) -> Result<BufReader<File>, LogReadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|err| LogReadError::new(kind, path, err))
}

/// Calls `f` with each line read from `reader`, with line terminators removed and invalid UTF-8
/// replaced.
///
/// Lines read before an error have already been passed to `f` when the error is returned.
fn read_lines(
    kind: LogKind,
    path: &Utf8Path,
    mut reader: impl BufRead,
    mut f: impl FnMut(&str),
) -> Result<(), LogReadError> {
    reader
        .for_byte_line(|line| {
            f(&line.to_str_lossy());
            Ok::<_, io::Error>(true)
        })
        .map_err(|err| LogReadError::new(kind, path, err))
}
