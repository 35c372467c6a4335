// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Code to generate JUnit XML reports from test results.

use super::{Reporter, TestResult};
use crate::{
    errors::JunitWriteError,
    list::TestCaseDescriptor,
    parse::TestOutcome,
    stopwatch::{StopwatchStart, stopwatch},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::fs::File;

/// Aggregates test results into a JUnit report, with one test suite per test binary.
#[derive(Debug)]
pub struct JunitReporter {
    report_name: String,
    stopwatch: StopwatchStart,
    test_suites: IndexMap<Utf8PathBuf, TestSuite>,
}

impl JunitReporter {
    /// Creates a new reporter. The run is considered started at this point.
    pub fn new(report_name: impl Into<String>) -> Self {
        Self {
            report_name: report_name.into(),
            stopwatch: stopwatch(),
            test_suites: IndexMap::new(),
        }
    }

    /// Builds the report from the results recorded so far.
    pub fn report(&self) -> Report {
        let snapshot = self.stopwatch.snapshot();
        let mut report = Report::new(self.report_name.as_str());
        report
            .set_timestamp(snapshot.start_time)
            .set_time(snapshot.duration)
            .add_test_suites(self.test_suites.values().cloned());
        report
    }

    /// Writes the report to `path`, creating parent directories as required.
    pub fn finish(self, path: &Utf8Path) -> Result<(), JunitWriteError> {
        if let Some(dir) = path.parent().filter(|dir| !dir.as_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|error| JunitWriteError::Fs {
                file: dir.to_owned(),
                error,
            })?;
        }

        let f = File::create(path).map_err(|error| JunitWriteError::Fs {
            file: path.to_owned(),
            error,
        })?;
        self.report()
            .serialize(f)
            .map_err(|error| JunitWriteError::Serialize {
                file: path.to_owned(),
                error,
            })
    }

    fn testsuite_for(&mut self, binary_path: &Utf8Path) -> &mut TestSuite {
        self.test_suites
            .entry(binary_path.to_owned())
            .or_insert_with(|| TestSuite::new(binary_path.as_str()))
    }
}

impl Reporter for JunitReporter {
    fn record_start(&mut self, _test_case: &TestCaseDescriptor) {}

    fn record_end(&mut self, _test_case: &TestCaseDescriptor, _outcome: TestOutcome) {}

    fn record_result(&mut self, result: TestResult) {
        let message = result
            .result
            .error_message
            .as_deref()
            .filter(|message| !message.is_empty());

        let status = match result.outcome() {
            TestOutcome::Passed => TestCaseStatus::success(),
            TestOutcome::Failed => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                status.set_type("test failure");
                if let Some(message) = message {
                    status.set_message(message);
                }
                if let Some(location) = &result.result.failure_location {
                    status.set_description(location.to_string());
                }
                status
            }
            TestOutcome::Unknown => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Error);
                status.set_type("unknown outcome");
                if let Some(message) = message {
                    status.set_message(message);
                }
                status
            }
        };

        let binary_path = result.test_case.binary_path();
        let mut testcase = TestCase::new(result.test_case.name(), status);
        testcase
            .set_classname(binary_path.as_str())
            .set_timestamp(result.start_time)
            .set_time(result.duration);

        self.testsuite_for(binary_path).add_test_case(testcase);
    }
}
