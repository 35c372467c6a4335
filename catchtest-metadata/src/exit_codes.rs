// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `catchtest` failures.
///
/// `catchtest` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum CatchTestExitCode {}

impl CatchTestExitCode {
    /// No errors occurred and catchtest exited normally.
    pub const OK: i32 = 0;

    /// No tests were selected to run, but no other errors occurred.
    pub const NO_TESTS_RUN: i32 = 4;

    /// A user issue happened while setting up a catchtest invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// One or more tests failed, or had an outcome that could not be determined.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// Creating a test list produced an error.
    pub const TEST_LIST_CREATION_FAILED: i32 = 104;

    /// The run was cancelled before every selected test was started.
    pub const RUN_CANCELLED: i32 = 107;

    /// Writing data to stdout or stderr produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;
}
