// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by regtriage.

use crate::scanner::LogKind;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error, fmt, io};
use thiserror::Error;

/// An error that occurred while loading configuration: either the signature file or the tool
/// config.
///
/// Configuration errors are fatal and abort the run before any log is scanned.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    /// The signature file could not be read.
    #[error("failed to read signature file `{file}`")]
    SignatureFileRead {
        /// The signature file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// A required signature was not present.
    #[error("required signature `{key}` is missing")]
    MissingSignature {
        /// The key of the missing signature.
        key: &'static str,
    },

    /// A signature was present, but its value was empty.
    #[error("signature `{key}` has an empty value")]
    EmptySignature {
        /// The key of the empty signature.
        key: String,
    },

    /// A signature's value could not be compiled into a regular expression.
    #[error("signature `{key}` is not a valid pattern")]
    InvalidPattern {
        /// The key of the signature.
        key: String,

        /// The underlying error.
        #[source]
        err: Box<regex::Error>,
    },

    /// Two known-error signatures define the same named capture group, so they can't be matched
    /// together.
    #[error("signatures `{first_key}` and `{second_key}` both define capture group `{group}`")]
    DuplicateCaptureGroup {
        /// The name of the capture group.
        group: String,

        /// The key of the first signature defining the group.
        first_key: String,

        /// The key of the second signature defining the group.
        second_key: String,
    },

    /// The directory pattern in the tool config could not be compiled.
    #[error("invalid directory pattern `{pattern}`")]
    InvalidDirectoryPattern {
        /// The pattern that failed to compile.
        pattern: String,

        /// The underlying error.
        #[source]
        err: Box<regex::Error>,
    },

    /// The tool config could not be read or parsed.
    #[error("failed to parse regtriage config at `{config_file}`")]
    ToolConfig {
        /// The config file.
        config_file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: ToolConfigErrorKind,
    },
}

impl ConfigurationError {
    pub(crate) fn invalid_pattern(key: impl Into<String>, err: regex::Error) -> Self {
        Self::InvalidPattern {
            key: key.into(),
            err: Box::new(err),
        }
    }

    pub(crate) fn tool_config(
        config_file: impl Into<Utf8PathBuf>,
        err: ToolConfigErrorKind,
    ) -> Self {
        Self::ToolConfig {
            config_file: config_file.into(),
            err,
        }
    }
}

/// The kind of error that occurred while reading the tool config.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ToolConfigErrorKind {
    /// An error occurred while building the layered config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error that occurred while discovering test directories.
///
/// Discovery errors are not fatal: they mean that there is nothing to report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DiscoveryError {
    /// The root directory does not exist.
    #[error("root directory `{root}` does not exist")]
    RootNotFound {
        /// The root directory.
        root: Utf8PathBuf,
    },

    /// No directory under the root matched the directory pattern.
    #[error("no test directories found under `{root}` (pattern: `{pattern}`)")]
    NoDirectoriesFound {
        /// The root directory.
        root: Utf8PathBuf,

        /// The directory pattern.
        pattern: String,
    },
}

/// An error that occurred while reading a log file.
///
/// These errors are recovered from locally: observations from the rest of the file are treated
/// as absent and the scan continues with the next file.
#[derive(Debug, Error)]
#[error("failed to read {kind} log `{path}`")]
pub struct LogReadError {
    kind: LogKind,
    path: Utf8PathBuf,
    #[source]
    err: io::Error,
}

impl LogReadError {
    pub(crate) fn new(kind: LogKind, path: impl Into<Utf8PathBuf>, err: io::Error) -> Self {
        Self {
            kind,
            path: path.into(),
            err,
        }
    }

    /// Returns the kind of log that failed to read.
    pub fn kind(&self) -> LogKind {
        self.kind
    }

    /// Returns the path of the log.
    pub fn path(&self) -> &Utf8PathBuf {
        &self.path
    }
}

/// An error that occurred while writing a report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// Writing to stdout or another writer failed.
    #[error("error writing report output")]
    Io(#[from] io::Error),

    /// Serializing the summary to JSON failed.
    #[error("error serializing summary to JSON")]
    Json(#[from] serde_json::Error),

    /// Creating the report directory failed.
    #[error("error creating report directory `{dir}`")]
    CreateDir {
        /// The directory.
        dir: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Writing a report file failed.
    #[error("error writing report file `{file}`")]
    WriteFile {
        /// The file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: io::Error,
    },

    /// Serializing the JUnit report failed.
    #[error("error writing JUnit report to `{file}`")]
    Junit {
        /// The file.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        err: quick_junit::SerializeError,
    },
}

/// Displays an error along with its chain of sources.
///
/// ```text
/// failed to read signature file `input_error.log`
///   caused by:
///   - No such file or directory (os error 2)
/// ```
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(cause) = source {
            write!(f, "\n  - {cause}")?;
            source = cause.source();
        }

        Ok(())
    }
}
