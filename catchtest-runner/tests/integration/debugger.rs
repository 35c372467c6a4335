// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use catchtest_runner::{
    config::WorkingDir,
    executor::{CancellationToken, ExecutionContext},
    launcher::{DebuggerCommand, DebuggerCommandLauncher},
    parse::{FailureLocation, TestOutcome},
    runner::ProcessRunner,
};
use color_eyre::eyre::{Result, ensure};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;

fn debugger_runner() -> ProcessRunner {
    let env = BTreeMap::from([("fixture_marker".to_owned(), "debugger".to_owned())]);
    ProcessRunner::new(WorkingDir::BinaryDir, env)
}

#[test]
fn test_run_under_debugger() -> Result<()> {
    // `env` runs the test binary as-is, which is all a debugger needs to do here.
    let launcher = DebuggerCommandLauncher::new("env".parse::<DebuggerCommand>()?);
    let cx = ExecutionContext::under_debugger(&launcher, CancellationToken::new());
    ensure!(cx.is_debugging(), "context has a launcher");

    let (stats, reporter) = run_fixture(debugger_runner(), &cx);
    assert_eq!(reporter.outcomes(), expected_outcomes());
    assert_eq!(stats.final_run_count, 4);

    assert_eq!(
        reporter.result("Strings compare").result.failure_location,
        Some(FailureLocation {
            file: "strings.cpp".into(),
            line: 17,
        })
    );
    Ok(())
}

#[test]
fn test_debugger_not_found() {
    let launcher = DebuggerCommandLauncher::new(DebuggerCommand::new(
        "catchtest-no-such-debugger",
        ["--args"],
    ));
    let cx = ExecutionContext::under_debugger(&launcher, CancellationToken::new());

    let (stats, reporter) = run_fixture(debugger_runner(), &cx);
    assert_eq!(stats.unknown, 4);
    for result in &reporter.results {
        assert_eq!(result.outcome(), TestOutcome::Unknown);
        let message = result.result.error_message.as_deref().unwrap_or_default();
        assert!(
            message.contains("failed to spawn debugger `catchtest-no-such-debugger`"),
            "{message}"
        );
    }
}
