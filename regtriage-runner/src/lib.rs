// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [regtriage](https://crates.io/crates/regtriage): classifying the logs of
//! a hardware regression run.
//!
//! The flow of a run is:
//!
//! 1. [`config::TriageConfig`] reads the tool config, and [`signature::SignatureSet`] reads the
//!    signature file it points to.
//! 2. [`discovery::discover_test_dirs`] finds the test directories under the regression root.
//! 3. [`classify::ClassificationEngine`] scans every directory with a
//!    [`scanner::TestCaseScanner`], assigns each test case to its outcome buckets and merges the
//!    per-test [`tally::ErrorTally`] contributions.
//! 4. The [`reporter`] module renders the result.

pub mod classify;
pub mod config;
pub mod discovery;
pub mod errors;
pub mod reporter;
pub mod scanner;
pub mod signature;
pub mod tally;
