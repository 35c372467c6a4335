// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for [catchtest](https://crates.io/crates/catchtest): run test binaries
//! written against the [Catch](https://github.com/catchorg/Catch2) C++ test framework, one
//! process per test case, and reconcile their XML reports into per-test outcomes.
//!
//! The basic flow is:
//!
//! 1. A [`TestDiscoverer`](list::TestDiscoverer) produces an ordered list of
//!    [`TestCaseDescriptor`](list::TestCaseDescriptor)s.
//! 2. A [`TestExecutor`](executor::TestExecutor) walks the list. For each test case it asks a
//!    [`TestBinaryRunner`](runner::TestBinaryRunner) for the raw XML output, and parses it with
//!    the functions in [`parse`].
//! 3. Progress and results are sent to a [`Reporter`](reporter::Reporter).

pub mod args;
pub mod config;
pub mod errors;
pub mod executor;
pub mod launcher;
pub mod list;
pub mod parse;
pub mod reporter;
pub mod runner;
mod stopwatch;
