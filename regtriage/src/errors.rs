// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use owo_colors::OwoColorize;
use regtriage_metadata::RegtriageExitCode;
use regtriage_runner::errors::{ConfigurationError, DiscoveryError, WriteReportError};
use std::error::Error;
use thiserror::Error;
use tracing::{error, warn};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected error: a problem with the input or environment rather than a bug in regtriage.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("configuration error")]
    Configuration {
        #[from]
        err: ConfigurationError,
    },
    #[error("no test directories found")]
    Discovery {
        #[from]
        err: DiscoveryError,
    },
    #[error("error writing report")]
    WriteReport {
        #[from]
        err: WriteReportError,
    },
}

impl ExpectedError {
    pub(crate) fn write_output(err: std::io::Error) -> Self {
        Self::WriteReport {
            err: WriteReportError::Io(err),
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::Configuration { .. } => RegtriageExitCode::SETUP_ERROR,
            Self::Discovery { .. } => RegtriageExitCode::NO_DIRECTORIES_FOUND,
            Self::WriteReport { .. } => RegtriageExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::Configuration { err } => {
                error!("{}", err.style(styles.bold));
                err.source()
            }
            Self::Discovery { err } => {
                // Discovery errors mean there's nothing to report.
                warn!("{err}; no report generated");
                None
            }
            Self::WriteReport { err } => {
                error!("{}", err.style(styles.bold));
                err.source()
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING_TARGET, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
