// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Discovering the test cases within test binaries.

use crate::errors::TestListError;
use camino::{Utf8Path, Utf8PathBuf};
use catchtest_metadata::TestListSummary;
use std::collections::HashSet;

/// Identifies a single test case: its fully-qualified name and the binary that contains it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TestCaseDescriptor {
    name: String,
    binary_path: Utf8PathBuf,
}

impl TestCaseDescriptor {
    /// Creates a new descriptor.
    pub fn new(name: impl Into<String>, binary_path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            name: name.into(),
            binary_path: binary_path.into(),
        }
    }

    /// Returns the fully-qualified name of the test case.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the path to the binary containing the test case.
    pub fn binary_path(&self) -> &Utf8Path {
        &self.binary_path
    }
}

/// Produces the ordered list of test cases contained within a set of binaries.
pub trait TestDiscoverer {
    /// Lists the test cases within `binaries`, in binary order and then in the order each binary
    /// reports them.
    fn discover(&self, binaries: &[Utf8PathBuf])
    -> Result<Vec<TestCaseDescriptor>, TestListError>;
}

/// Lists test cases by running each binary with `--list-test-names-only`.
#[derive(Clone, Debug, Default)]
pub struct CatchTestLister {
    _private: (),
}

impl CatchTestLister {
    /// Creates a new lister.
    pub fn new() -> Self {
        Self::default()
    }

    fn exec(&self, binary: &Utf8Path) -> Result<String, TestListError> {
        // Catch exits with the number of listed tests, so the exit status carries no error
        // information.
        let output = duct::cmd(binary.as_std_path(), ["--list-test-names-only"])
            .stdout_capture()
            .stderr_null()
            .unchecked()
            .run()
            .map_err(|error| TestListError::CommandExec {
                binary: binary.to_owned(),
                error,
            })?;

        String::from_utf8(output.stdout).map_err(|error| TestListError::NonUtf8 {
            binary: binary.to_owned(),
            error,
        })
    }
}

impl TestDiscoverer for CatchTestLister {
    fn discover(
        &self,
        binaries: &[Utf8PathBuf],
    ) -> Result<Vec<TestCaseDescriptor>, TestListError> {
        let mut test_cases = Vec::new();
        for binary in binaries {
            let list_output = self.exec(binary)?;
            let names = parse_list_output(binary, &list_output);
            tracing::debug!("found {} test cases in {binary}", names.len());
            test_cases.extend(
                names
                    .into_iter()
                    .map(|name| TestCaseDescriptor::new(name, binary.clone())),
            );
        }
        Ok(test_cases)
    }
}

/// Parses the output of `--list-test-names-only`: one name per line, blank lines ignored.
fn parse_list_output<'a>(binary: &Utf8Path, list_output: &'a str) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    list_output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|&name| {
            let is_new = seen.insert(name);
            if !is_new {
                tracing::warn!("ignoring duplicate test case `{name}` in {binary}");
            }
            is_new
        })
        .collect()
}

/// Builds a serializable summary of a list of test cases.
pub fn to_summary(test_cases: &[TestCaseDescriptor]) -> TestListSummary {
    let mut summary = TestListSummary::new();
    for test_case in test_cases {
        summary.push(test_case.binary_path(), test_case.name());
    }
    summary
}
