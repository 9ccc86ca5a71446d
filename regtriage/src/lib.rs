// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Classifies the logs of a hardware regression run.
//!
//! This crate contains the `regtriage` command-line interface. The classification logic lives in
//! [`regtriage_runner`], and the machine-readable output format in [`regtriage_metadata`].

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputWriter;
