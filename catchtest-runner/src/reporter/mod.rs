// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reporting the progress and results of a test run.
//!
//! The executor drives a [`Reporter`] through three calls per test case, always in this order:
//! [`record_start`](Reporter::record_start), [`record_end`](Reporter::record_end) and
//! [`record_result`](Reporter::record_result).

mod junit;

pub use junit::JunitReporter;

use crate::{
    list::TestCaseDescriptor,
    parse::{ParsedResult, TestOutcome},
};
use catchtest_metadata::TestResultSummary;
use chrono::{DateTime, Local};
use std::time::Duration;

/// Receives progress notifications and results from a
/// [`TestExecutor`](crate::executor::TestExecutor).
pub trait Reporter {
    /// Called just before a test case is run.
    fn record_start(&mut self, test_case: &TestCaseDescriptor);

    /// Called once the outcome of a test case is known, before any failure details are gathered.
    fn record_end(&mut self, test_case: &TestCaseDescriptor, outcome: TestOutcome);

    /// Called with the complete result of a test case.
    fn record_result(&mut self, result: TestResult);
}

/// The complete result of running a single test case.
#[derive(Clone, Debug)]
pub struct TestResult {
    /// The test case that was run.
    pub test_case: TestCaseDescriptor,

    /// The interpreted result.
    pub result: ParsedResult,

    /// When the test case was started.
    pub start_time: DateTime<Local>,

    /// How long the test case took to run, including parsing its report.
    pub duration: Duration,
}

impl TestResult {
    /// Returns the outcome of the test case.
    pub fn outcome(&self) -> TestOutcome {
        self.result.outcome
    }

    /// Converts this result into its serializable form.
    pub fn to_summary(&self) -> TestResultSummary {
        let mut summary = TestResultSummary::new(
            self.test_case.name(),
            self.test_case.binary_path(),
            self.result.outcome.into(),
            self.duration.as_secs_f64(),
        );
        summary.error_message = self.result.error_message.clone();
        summary.failure_location = self.result.failure_location.clone().map(Into::into);
        summary
    }
}
