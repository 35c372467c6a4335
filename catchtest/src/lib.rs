// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A command-line runner for test binaries written against the
//! [Catch](https://github.com/catchorg/Catch2) C++ test framework.
//!
//! `catchtest list` queries test binaries for the test cases they contain, and `catchtest run`
//! runs each test case in its own process, optionally under a debugger, and reports outcomes
//! along with the source location of each failure.
//!
//! Exit codes are documented in
//! [`CatchTestExitCode`](catchtest_metadata::CatchTestExitCode).

#![warn(missing_docs)]

mod dispatch;
mod displayer;
mod errors;
mod output;
mod reporter;
mod signal;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
#[doc(hidden)]
pub use output::OutputContext;
