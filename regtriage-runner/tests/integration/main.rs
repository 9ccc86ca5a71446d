// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod classification;
mod config_errors;
mod fixtures;
