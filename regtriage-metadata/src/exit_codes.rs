// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `regtriage` failures.
///
/// `regtriage` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum RegtriageExitCode {}

impl RegtriageExitCode {
    /// No errors occurred and regtriage exited normally.
    ///
    /// Note that this is returned even if some test cases were classified as failing: the
    /// triage itself succeeded.
    pub const OK: i32 = 0;

    /// No test directories were found under the requested root, so no report was produced.
    pub const NO_DIRECTORIES_FOUND: i32 = 4;

    /// A user issue happened while setting up a regtriage invocation, e.g. a required signature
    /// was missing from the signature file.
    pub const SETUP_ERROR: i32 = 96;

    /// Writing data to stdout, stderr or a report file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
