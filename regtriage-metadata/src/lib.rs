// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [regtriage](https://crates.io/crates/regtriage).
//!
//! `regtriage run --message-format json` prints a [`TriageSummary`] to stdout. Report files
//! written with `--report-dir` use the same format. The types in this crate can be used to
//! deserialize that output.

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
