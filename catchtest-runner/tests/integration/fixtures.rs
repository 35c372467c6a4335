// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use camino::{Utf8Path, Utf8PathBuf};
use catchtest_runner::{
    executor::{ExecutionContext, RunStats, TestExecutor},
    list::{CatchTestLister, TestCaseDescriptor, TestDiscoverer},
    parse::TestOutcome,
    reporter::{Reporter, TestResult},
    runner::ProcessRunner,
};
use std::{os::unix::fs::PermissionsExt, sync::LazyLock};

/// A stand-in for a Catch test binary.
///
/// It supports `--list-test-names-only`, and `<name> --reporter xml [--break] [--out <path>]`.
/// `Environment` passes if `CATCHTEST_EXECUTION_MODE` matches the `fixture_marker` variable.
static FAKE_CATCH: &str = r#"#!/bin/sh
if [ "$1" = "--list-test-names-only" ]; then
    printf '%s\n' "Vectors can be sized" "Strings compare" "Division by zero" "Environment"
    exit 4
fi

name="$1"
shift
out=""
while [ $# -gt 0 ]; do
    case "$1" in
        --out) out="$2"; shift 2 ;;
        *) shift ;;
    esac
done

case "$name" in
    "Vectors can be sized")
        body='<OverallResult success="true"/>'
        ;;
    "Strings compare")
        body='<Expression success="true" type="REQUIRE" filename="strings.cpp" line="12"/>
<Expression success="false" type="REQUIRE" filename="strings.cpp" line="17"><Original>a == b</Original></Expression>
<OverallResult success="false"/>'
        ;;
    "Environment")
        if [ "$CATCHTEST" = "1" ] && [ "$CATCHTEST_EXECUTION_MODE" = "$fixture_marker" ]; then
            body='<OverallResult success="true"/>'
        else
            body='<Expression success="false" filename="environment.cpp" line="1"/>
<OverallResult success="false"/>'
        fi
        ;;
    *)
        # Simulate a crash before any output is written.
        exit 134
        ;;
esac

report="<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<Catch name=\"fake-catch\">
<Group name=\"fake-catch\">
<TestCase name=\"$name\" filename=\"tests.cpp\" line=\"1\">
$body
</TestCase>
</Group>
</Catch>"

if [ -n "$out" ]; then
    printf '%s\n' "$report" > "$out"
else
    printf '%s\n' "$report"
fi

case "$body" in
    *'success="false"'*) exit 1 ;;
esac
"#;

/// The fixture binary, written once per test process.
///
/// Writing an executable while other threads may be spawning processes can make `exec` fail with
/// `ETXTBSY`, so every test shares a single copy that is written before anything is spawned.
pub(crate) static FIXTURE_BINARY: LazyLock<Utf8PathBuf> = LazyLock::new(|| {
    let dir = Utf8Path::new(env!("CARGO_TARGET_TMPDIR")).join("catchtest-fixtures");
    std::fs::create_dir_all(&dir).expect("created fixture dir");
    let path = dir.join("fake-catch");
    std::fs::write(&path, FAKE_CATCH).expect("wrote fixture binary");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("made fixture binary executable");
    path
});

pub(crate) const EXPECTED_TESTS: [&str; 4] = [
    "Vectors can be sized",
    "Strings compare",
    "Division by zero",
    "Environment",
];

pub(crate) fn list_fixture() -> Vec<TestCaseDescriptor> {
    CatchTestLister::new()
        .discover(&[FIXTURE_BINARY.clone()])
        .expect("listed fixture binary")
}

/// Collects every result, in order.
#[derive(Debug, Default)]
pub(crate) struct CollectingReporter {
    pub(crate) started: Vec<String>,
    pub(crate) results: Vec<TestResult>,
}

impl CollectingReporter {
    pub(crate) fn result(&self, name: &str) -> &TestResult {
        self.results
            .iter()
            .find(|result| result.test_case.name() == name)
            .unwrap_or_else(|| panic!("no result for `{name}`"))
    }

    pub(crate) fn outcomes(&self) -> Vec<(&str, TestOutcome)> {
        self.results
            .iter()
            .map(|result| (result.test_case.name(), result.outcome()))
            .collect()
    }
}

impl Reporter for CollectingReporter {
    fn record_start(&mut self, test_case: &TestCaseDescriptor) {
        self.started.push(test_case.name().to_owned());
    }

    fn record_end(&mut self, _test_case: &TestCaseDescriptor, _outcome: TestOutcome) {}

    fn record_result(&mut self, result: TestResult) {
        self.results.push(result);
    }
}

pub(crate) fn run_fixture(
    runner: ProcessRunner,
    cx: &ExecutionContext<'_>,
) -> (RunStats, CollectingReporter) {
    let test_cases = list_fixture();
    let executor = TestExecutor::new(runner);
    let mut reporter = CollectingReporter::default();
    let stats = executor
        .run_all(&test_cases, cx, &mut reporter)
        .expect("executor is idle");
    (stats, reporter)
}

pub(crate) fn expected_outcomes() -> Vec<(&'static str, TestOutcome)> {
    vec![
        ("Vectors can be sized", TestOutcome::Passed),
        ("Strings compare", TestOutcome::Failed),
        ("Division by zero", TestOutcome::Unknown),
        ("Environment", TestOutcome::Passed),
    ]
}
