// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Root element for a serializable list of tests generated by catchtest.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestListSummary {
    /// Number of tests across all binaries.
    pub test_count: usize,

    /// Test binaries, keyed by their path.
    pub binaries: BTreeMap<Utf8PathBuf, BinaryListSummary>,
}

impl TestListSummary {
    /// Creates a new, empty `TestListSummary`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a test case to the binary it belongs to.
    pub fn push(&mut self, binary_path: impl Into<Utf8PathBuf>, name: impl Into<String>) {
        self.binaries
            .entry(binary_path.into())
            .or_default()
            .testcases
            .push(name.into());
        self.test_count += 1;
    }

    /// Parse JSON output from `catchtest list --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }
}

/// The test cases found in a single binary, in discovery order.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct BinaryListSummary {
    /// The fully-qualified test case names.
    pub testcases: Vec<String>,
}

/// The outcome of a single test case, as recorded in machine-readable output.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeSummary {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The outcome could not be determined.
    Unknown,
}

/// A source location where a test failed.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FailureLocationSummary {
    /// The source file, as reported by the test binary.
    pub file: Utf8PathBuf,

    /// The 1-based line number.
    pub line: u32,
}

/// The result of a single test case.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct TestResultSummary {
    /// The fully-qualified test case name.
    pub name: String,

    /// The binary the test case belongs to.
    pub binary_path: Utf8PathBuf,

    /// The outcome of the test case.
    pub outcome: OutcomeSummary,

    /// A human-readable error message, if one was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Where the test failed, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_location: Option<FailureLocationSummary>,

    /// The time taken by the test, in seconds.
    pub time_taken_secs: f64,
}

impl TestResultSummary {
    /// Creates a new `TestResultSummary` with no diagnostics.
    pub fn new(
        name: impl Into<String>,
        binary_path: impl Into<Utf8PathBuf>,
        outcome: OutcomeSummary,
        time_taken_secs: f64,
    ) -> Self {
        Self {
            name: name.into(),
            binary_path: binary_path.into(),
            outcome,
            error_message: None,
            failure_location: None,
            time_taken_secs,
        }
    }
}

/// Root element for the results of a `catchtest run`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub struct RunSummary {
    /// Results in the order they were reported.
    pub results: Vec<TestResultSummary>,

    /// The number of tests that were selected to run.
    pub initial_run_count: usize,

    /// True if the run was cancelled before every selected test was started.
    pub cancelled: bool,
}

impl RunSummary {
    /// Parse JSON output from `catchtest run --message-format json`.
    pub fn parse_json(json: impl AsRef<str>) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json.as_ref())
    }

    /// Returns the number of results with the given outcome.
    pub fn count(&self, outcome: OutcomeSummary) -> usize {
        self.results
            .iter()
            .filter(|result| result.outcome == outcome)
            .count()
    }
}
