// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable output for [catchtest](https://crates.io/crates/catchtest).
//!
//! `catchtest list --message-format json` emits a [`TestListSummary`], and
//! `catchtest run --message-format json` emits a [`RunSummary`]. Exit codes are documented in
//! [`CatchTestExitCode`].

mod exit_codes;
mod summary;

pub use exit_codes::*;
pub use summary::*;
