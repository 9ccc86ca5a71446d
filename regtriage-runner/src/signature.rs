// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Textual signatures used to classify log lines.
//!
//! Signatures are read from a signature file containing `KEY = "value"` lines. Every pattern
//! matches case-insensitively. See [`SignatureSet`] for the recognized keys.

use crate::errors::ConfigurationError;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Keys recognized in a signature file.
pub mod keys {
    /// Marks the start of the test in the simulation log. Required.
    pub const TEST_START: &str = "TEST_START_SIGNATURE";

    /// Marks a successful build. Required.
    pub const COMPILATION_SUCCESS: &str = "COMPILATION_SUCCESSFUL_SIGNATURE";

    /// Literal pass marker. Required.
    pub const TEST_PASS: &str = "TEST_PASS";

    /// Literal fail marker. Required.
    pub const TEST_FAIL: &str = "TEST_FAIL";

    /// Marks the end of simulation. Optional.
    pub const SIMULATION_FINISH: &str = "SIMULATION_FINISH_SIGNATURE";

    /// The simulation log's file name, relative to a test directory. Required.
    pub const SIMULATION_LOG_FILE: &str = "SIMULATION_LOG_FILE_NAME";

    /// The compilation log's file name, relative to a test directory. Required.
    pub const COMPILATION_LOG_FILE: &str = "COMPILATION_LOG_FILE_NAME";

    /// Prefix for known-error signatures, e.g. `KNOWN_ERROR_UVM = "UVM_ERROR @"`.
    pub const KNOWN_ERROR_PREFIX: &str = "KNOWN_ERROR_";
}

/// Known-error patterns used when the signature file doesn't list any.
pub const DEFAULT_KNOWN_ERRORS: &[&str] = &[
    "UVM_WARNING @",
    "UVM_ERROR @",
    "UVM_FATAL @",
    "ASSERTION_ERROR @",
    "SIMULATION_TIMEOUT @",
    "CONSTRAINT_ERROR @",
    "RUNTIME_ERROR @",
];

/// The generic error marker: a literal asterisk followed by `Error`.
///
/// Lines matching this pattern are tallied by their exact text as wildcard errors.
pub const ERROR_MARKER_PATTERN: &str = r"\*Error";

static SIGNATURE_LINE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(\w+)\s*=\s*"([^"]*)""#).expect("signature line regex is valid")
});

static ERROR_MARKER_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    RegexBuilder::new(ERROR_MARKER_PATTERN)
        .case_insensitive(true)
        .build()
        .expect("error marker regex is valid")
});

/// A named pattern identifying a log event of interest.
#[derive(Clone, Debug)]
pub struct Signature {
    name: String,
    pattern: String,
    regex: Regex,
}

impl Signature {
    /// Creates a new signature, compiling `pattern` case-insensitively.
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let regex = RegexBuilder::new(&pattern).case_insensitive(true).build()?;
        Ok(Self {
            name: name.into(),
            pattern,
            regex,
        })
    }

    /// Creates a known-error signature. Its name is the part of the pattern preceding the first
    /// `@`, so `UVM_ERROR @` is named `UVM_ERROR`.
    pub fn known_error(pattern: impl Into<String>) -> Result<Self, regex::Error> {
        let pattern = pattern.into();
        let name = known_error_name(&pattern).to_owned();
        Self::new(name, pattern)
    }

    /// Returns the name of this signature.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the pattern this signature was created with.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true if the line matches this signature.
    pub fn is_match(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Known errors are matched with a single alternation, in which each named capture group may only
/// appear once.
fn check_capture_groups(known_errors: &[(&str, Signature)]) -> Result<(), ConfigurationError> {
    let mut groups: IndexMap<&str, &str> = IndexMap::new();
    for (key, signature) in known_errors {
        for group in signature.regex.capture_names().flatten() {
            if let Some(first_key) = groups.insert(group, *key) {
                return Err(ConfigurationError::DuplicateCaptureGroup {
                    group: group.to_owned(),
                    first_key: first_key.to_owned(),
                    second_key: (*key).to_owned(),
                });
            }
        }
    }
    Ok(())
}

fn known_error_name(pattern: &str) -> &str {
    let name = pattern.split('@').next().unwrap_or(pattern).trim();
    if name.is_empty() { pattern } else { name }
}

/// The validated set of signatures for a run.
///
/// | key | required | meaning |
/// |---|---|---|
/// | `TEST_START_SIGNATURE` | yes | regex marking the start of the test |
/// | `COMPILATION_SUCCESSFUL_SIGNATURE` | yes | regex marking a successful build |
/// | `TEST_PASS`, `TEST_FAIL` | yes | literal pass and fail markers |
/// | `SIMULATION_LOG_FILE_NAME` | yes | simulation log file name |
/// | `COMPILATION_LOG_FILE_NAME` | yes | compilation log file name |
/// | `SIMULATION_FINISH_SIGNATURE` | no | regex marking the end of simulation |
/// | `KNOWN_ERROR_*` | no | known-error regexes, replacing [`DEFAULT_KNOWN_ERRORS`] |
///
/// Unknown keys are ignored.
#[derive(Clone, Debug)]
pub struct SignatureSet {
    test_start: Signature,
    compilation_success: Signature,
    pass_or_fail: Signature,
    simulation_finish: Option<Signature>,
    simulation_log_file: Utf8PathBuf,
    compilation_log_file: Utf8PathBuf,
    known_errors: Vec<Signature>,
    // One named group per known error, in order.
    known_errors_regex: Option<Regex>,
    known_error_groups: Vec<String>,
}

impl SignatureSet {
    /// The default location of the signature file, relative to the current directory.
    pub const DEFAULT_PATH: &'static str = "input_error.log";

    /// Reads and validates the signature file at `path`.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigurationError> {
        let contents =
            std::fs::read_to_string(path).map_err(|err| ConfigurationError::SignatureFileRead {
                file: path.to_owned(),
                err,
            })?;
        debug!("read signature file {path}");
        Self::parse(&contents)
    }

    /// Parses and validates the contents of a signature file.
    ///
    /// Every `KEY = "value"` occurrence is recognized, wherever it appears. If a key occurs more
    /// than once, the last value wins.
    pub fn parse(contents: &str) -> Result<Self, ConfigurationError> {
        let mut values: IndexMap<&str, &str> = IndexMap::new();
        for captures in SIGNATURE_LINE_REGEX.captures_iter(contents) {
            let (_, [key, value]) = captures.extract();
            if let Some(previous) = values.insert(key, value) {
                warn!("signature `{key}` defined more than once, overriding `{previous}` with `{value}`");
            }
        }
        Self::from_pairs(values)
    }

    /// Builds a signature set from key-value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConfigurationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut values: IndexMap<String, String> = IndexMap::new();
        for (key, value) in pairs {
            values.insert(key.as_ref().to_owned(), value.as_ref().to_owned());
        }

        let test_start = required_signature(&values, keys::TEST_START)?;
        let compilation_success = required_signature(&values, keys::COMPILATION_SUCCESS)?;

        let pass = required_value(&values, keys::TEST_PASS)?;
        let fail = required_value(&values, keys::TEST_FAIL)?;
        let pass_or_fail = Signature::new(
            "TEST_PASS|TEST_FAIL",
            format!("{}|{}", regex::escape(pass), regex::escape(fail)),
        )
        .map_err(|err| ConfigurationError::invalid_pattern(keys::TEST_PASS, err))?;

        let simulation_finish = match values.get(keys::SIMULATION_FINISH) {
            Some(_) => Some(required_signature(&values, keys::SIMULATION_FINISH)?),
            None => None,
        };

        let simulation_log_file = required_value(&values, keys::SIMULATION_LOG_FILE)?.into();
        let compilation_log_file = required_value(&values, keys::COMPILATION_LOG_FILE)?.into();

        let mut known_errors = Vec::new();
        for (key, value) in &values {
            if key.starts_with(keys::KNOWN_ERROR_PREFIX) {
                let value = non_empty(key, value)?;
                let signature = Signature::known_error(value)
                    .map_err(|err| ConfigurationError::invalid_pattern(key.clone(), err))?;
                known_errors.push((key.as_str(), signature));
            } else if !is_known_key(key) {
                debug!("ignoring unknown signature key `{key}`");
            }
        }
        check_capture_groups(&known_errors)?;
        let mut known_errors: Vec<_> = known_errors
            .into_iter()
            .map(|(_, signature)| signature)
            .collect();
        if known_errors.is_empty() {
            known_errors = DEFAULT_KNOWN_ERRORS
                .iter()
                .map(|pattern| {
                    Signature::known_error(*pattern)
                        .map_err(|err| ConfigurationError::invalid_pattern(*pattern, err))
                })
                .collect::<Result<_, _>>()?;
        }

        Self::new(
            test_start,
            compilation_success,
            pass_or_fail,
            simulation_finish,
            simulation_log_file,
            compilation_log_file,
            known_errors,
        )
    }

    fn new(
        test_start: Signature,
        compilation_success: Signature,
        pass_or_fail: Signature,
        simulation_finish: Option<Signature>,
        simulation_log_file: Utf8PathBuf,
        compilation_log_file: Utf8PathBuf,
        known_errors: Vec<Signature>,
    ) -> Result<Self, ConfigurationError> {
        let known_error_groups: Vec<_> = (0..known_errors.len())
            .map(|index| format!("__known_error_{index}"))
            .collect();

        // Each pattern compiled on its own above, so wrapping them in groups is valid.
        let known_errors_regex = if known_errors.is_empty() {
            None
        } else {
            let alternation = known_errors
                .iter()
                .zip(&known_error_groups)
                .map(|(signature, group)| format!("(?P<{group}>{})", signature.pattern()))
                .collect::<Vec<_>>()
                .join("|");
            let regex = RegexBuilder::new(&alternation)
                .case_insensitive(true)
                .build()
                .map_err(|err| ConfigurationError::invalid_pattern(keys::KNOWN_ERROR_PREFIX, err))?;
            Some(regex)
        };

        Ok(Self {
            test_start,
            compilation_success,
            pass_or_fail,
            simulation_finish,
            simulation_log_file,
            compilation_log_file,
            known_errors,
            known_errors_regex,
            known_error_groups,
        })
    }

    /// Returns the test start signature.
    pub fn test_start(&self) -> &Signature {
        &self.test_start
    }

    /// Returns the build success signature.
    pub fn compilation_success(&self) -> &Signature {
        &self.compilation_success
    }

    /// Returns the combined pass-or-fail signature.
    pub fn pass_or_fail(&self) -> &Signature {
        &self.pass_or_fail
    }

    /// Returns the simulation finish signature, if configured.
    pub fn simulation_finish(&self) -> Option<&Signature> {
        self.simulation_finish.as_ref()
    }

    /// Returns the simulation log's file name, relative to a test directory.
    pub fn simulation_log_file(&self) -> &Utf8Path {
        &self.simulation_log_file
    }

    /// Returns the compilation log's file name, relative to a test directory.
    pub fn compilation_log_file(&self) -> &Utf8Path {
        &self.compilation_log_file
    }

    /// Returns the known-error signatures in configuration order.
    pub fn known_errors(&self) -> &[Signature] {
        &self.known_errors
    }

    /// Returns the index of the known error matching `line`.
    ///
    /// The known errors are tried as a single alternation: the leftmost match in the line wins,
    /// and among matches starting at the same position the earlier signature wins.
    pub fn match_known_error(&self, line: &str) -> Option<usize> {
        let captures = self.known_errors_regex.as_ref()?.captures(line)?;
        self.known_error_groups
            .iter()
            .position(|group| captures.name(group).is_some())
    }

    /// Returns true if the line contains the generic `*Error` marker.
    pub fn is_error_marker(&self, line: &str) -> bool {
        ERROR_MARKER_REGEX.is_match(line)
    }
}

fn is_known_key(key: &str) -> bool {
    matches!(
        key,
        keys::TEST_START
            | keys::COMPILATION_SUCCESS
            | keys::TEST_PASS
            | keys::TEST_FAIL
            | keys::SIMULATION_FINISH
            | keys::SIMULATION_LOG_FILE
            | keys::COMPILATION_LOG_FILE
    )
}

fn required_value<'a>(
    values: &'a IndexMap<String, String>,
    key: &'static str,
) -> Result<&'a str, ConfigurationError> {
    let value = values
        .get(key)
        .ok_or(ConfigurationError::MissingSignature { key })?;
    non_empty(key, value)
}

fn non_empty<'a>(key: &str, value: &'a str) -> Result<&'a str, ConfigurationError> {
    if value.trim().is_empty() {
        Err(ConfigurationError::EmptySignature {
            key: key.to_owned(),
        })
    } else {
        Ok(value)
    }
}

fn required_signature(
    values: &IndexMap<String, String>,
    key: &'static str,
) -> Result<Signature, ConfigurationError> {
    let pattern = required_value(values, key)?;
    Signature::new(key, pattern).map_err(|err| ConfigurationError::invalid_pattern(key, err))
}
