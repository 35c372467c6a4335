// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{displayer::TestDisplayer, errors::ExpectedError};
use camino::Utf8Path;
use catchtest_metadata::{RunSummary, TestResultSummary};
use catchtest_runner::{
    executor::RunStats,
    list::TestCaseDescriptor,
    parse::TestOutcome,
    reporter::{JunitReporter, Reporter, TestResult},
};
use std::{io::Write, time::Instant};

/// Fans test events out to the terminal, an optional JUnit report and the machine-readable
/// summary.
#[derive(Debug)]
pub(crate) struct CliReporter<W> {
    displayer: TestDisplayer<W>,
    junit: Option<JunitReporter>,
    results: Vec<TestResultSummary>,
    start: Instant,
    write_error: Option<std::io::Error>,
}

impl<W: Write> CliReporter<W> {
    pub(crate) fn new(displayer: TestDisplayer<W>, junit: Option<JunitReporter>) -> Self {
        Self {
            displayer,
            junit,
            results: Vec::new(),
            start: Instant::now(),
            write_error: None,
        }
    }

    pub(crate) fn run_started(
        &mut self,
        test_count: usize,
        binary_count: usize,
    ) -> Result<(), ExpectedError> {
        self.displayer
            .write_run_start(test_count, binary_count)
            .map_err(ExpectedError::write_output_error)
    }

    /// Writes the summary and the JUnit report, and returns the machine-readable summary.
    pub(crate) fn finish(
        mut self,
        stats: &RunStats,
        junit_path: Option<&Utf8Path>,
    ) -> Result<RunSummary, ExpectedError> {
        if let Some(error) = self.write_error.take() {
            return Err(ExpectedError::write_output_error(error));
        }
        self.displayer
            .write_summary(stats, self.start.elapsed())
            .map_err(ExpectedError::write_output_error)?;

        if let (Some(junit), Some(path)) = (self.junit, junit_path) {
            junit.finish(path)?;
            tracing::debug!("wrote JUnit report to {path}");
        }

        let mut summary = RunSummary::default();
        summary.results = self.results;
        summary.initial_run_count = stats.initial_run_count;
        summary.cancelled = stats.cancelled;
        Ok(summary)
    }

    fn record_write(&mut self, result: std::io::Result<()>) {
        // Keep the first error: later ones are usually a consequence of it.
        if let Err(error) = result {
            self.write_error.get_or_insert(error);
        }
    }
}

impl<W: Write> Reporter for CliReporter<W> {
    fn record_start(&mut self, test_case: &TestCaseDescriptor) {
        let result = self.displayer.write_test_start(test_case);
        self.record_write(result);
    }

    fn record_end(&mut self, _test_case: &TestCaseDescriptor, _outcome: TestOutcome) {}

    fn record_result(&mut self, result: TestResult) {
        let write_result = self.displayer.write_result(&result);
        self.record_write(write_result);
        self.results.push(result.to_summary());
        if let Some(junit) = &mut self.junit {
            junit.record_result(result);
        }
    }
}
