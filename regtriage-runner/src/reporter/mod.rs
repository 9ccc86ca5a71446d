// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report the results of a triage run in human and machine-readable formats.
//!
//! * [`TriageDisplayer`] renders a human-readable summary.
//! * [`structured`] serializes the summary as JSON and stores it in a date-stamped directory.
//! * [`junit`] exports one JUnit test case per test directory.

mod displayer;
pub mod junit;
pub mod structured;

pub use displayer::*;
