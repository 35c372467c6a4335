// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use camino::Utf8PathBuf;
use catchtest_runner::{
    config::{CatchTestConfig, WorkingDir},
    errors::TestListError,
    executor::{CancellationToken, ExecutionContext, TestExecutor},
    list::{self, CatchTestLister, TestDiscoverer},
    parse::{FailureLocation, TestOutcome},
    reporter::JunitReporter,
    runner::ProcessRunner,
};
use color_eyre::eyre::{Result, ensure};
use indoc::indoc;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

#[test]
fn test_list_fixture() -> Result<()> {
    let test_cases = list_fixture();
    let names: Vec<_> = test_cases.iter().map(|test_case| test_case.name()).collect();
    assert_eq!(names, EXPECTED_TESTS);
    for test_case in &test_cases {
        ensure!(
            test_case.binary_path() == FIXTURE_BINARY.as_path(),
            "unexpected binary for {}",
            test_case.name()
        );
    }

    let summary = list::to_summary(&test_cases);
    assert_eq!(summary.test_count, 4);
    assert_eq!(summary.binaries.len(), 1);
    Ok(())
}

#[test]
fn test_list_missing_binary() {
    let binary = Utf8PathBuf::from(env!("CARGO_TARGET_TMPDIR")).join("does-not-exist");
    let error = CatchTestLister::new()
        .discover(&[FIXTURE_BINARY.clone(), binary.clone()])
        .expect_err("missing binary cannot be listed");
    match error {
        TestListError::CommandExec { binary: failed, .. } => assert_eq!(failed, binary),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_run_direct() -> Result<()> {
    let env = BTreeMap::from([("fixture_marker".to_owned(), "direct".to_owned())]);
    let runner = ProcessRunner::new(WorkingDir::BinaryDir, env);
    let cx = ExecutionContext::direct(CancellationToken::new());
    let (stats, reporter) = run_fixture(runner, &cx);

    assert_eq!(reporter.outcomes(), expected_outcomes());
    assert_eq!(stats.initial_run_count, 4);
    assert_eq!(stats.final_run_count, 4);
    assert_eq!((stats.passed, stats.failed, stats.unknown), (2, 1, 1));
    ensure!(!stats.cancelled, "run was not cancelled");

    let failed = &reporter.result("Strings compare").result;
    assert_eq!(
        failed.failure_location,
        Some(FailureLocation {
            file: "strings.cpp".into(),
            line: 17,
        })
    );
    assert_eq!(failed.error_message.as_deref(), Some(""));

    let crashed = &reporter.result("Division by zero").result;
    assert_eq!(crashed.error_message.as_deref(), Some("test output is empty"));
    assert_eq!(crashed.failure_location, None);

    Ok(())
}

#[test]
fn test_run_with_profile() -> Result<()> {
    let workspace = camino_tempfile::tempdir()?;
    let config_dir = workspace.path().join(".config");
    std::fs::create_dir_all(&config_dir)?;
    std::fs::write(
        config_dir.join("catchtest.toml"),
        indoc! {r#"
            [profile.default.env]
            fixture_marker = "debugger"

            [profile.ci]
            working-dir = "inherit"

            [profile.ci.env]
            fixture_marker = "direct"

            [profile.ci.junit]
            path = "target/catchtest/junit.xml"
        "#},
    )?;

    let config = CatchTestConfig::from_sources(workspace.path(), None)?;
    let profile = config.profile("ci")?;
    assert_eq!(profile.working_dir(), WorkingDir::Inherit);

    let test_cases = list_fixture();
    let executor = TestExecutor::new(ProcessRunner::from_profile(&profile));
    let mut junit = JunitReporter::new("catchtest-run");
    let stats = executor.run_all(
        &test_cases,
        &ExecutionContext::direct(CancellationToken::new()),
        &mut junit,
    )?;
    assert_eq!((stats.passed, stats.failed, stats.unknown), (2, 1, 1));

    let junit_path = profile.junit_path().expect("junit path is configured");
    assert_eq!(
        junit_path,
        workspace.path().join("target/catchtest/junit.xml")
    );
    junit.finish(&junit_path)?;

    let contents = std::fs::read_to_string(&junit_path)?;
    ensure!(
        contents.contains(r#"name="Strings compare""#),
        "report contains failing test: {contents}"
    );
    ensure!(
        contents.contains("strings.cpp:17"),
        "report contains failure location: {contents}"
    );
    Ok(())
}

#[test]
fn test_run_cancelled_by_token() -> Result<()> {
    let token = CancellationToken::new();
    token.cancel();
    let cx = ExecutionContext::direct(token);
    let (stats, reporter) = run_fixture(ProcessRunner::default(), &cx);

    ensure!(stats.cancelled, "run was cancelled");
    assert_eq!(stats.final_run_count, 0);
    ensure!(reporter.started.is_empty(), "no tests were started");
    Ok(())
}

#[test]
fn test_outcome_mismatch_is_failure() {
    // Without the marker, `Environment` fails.
    let cx = ExecutionContext::direct(CancellationToken::new());
    let (_, reporter) = run_fixture(ProcessRunner::default(), &cx);
    let environment = &reporter.result("Environment").result;
    assert_eq!(environment.outcome, TestOutcome::Failed);
    assert_eq!(
        environment.failure_location,
        Some(FailureLocation {
            file: "environment.cpp".into(),
            line: 1,
        })
    );
}
