// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The test executor.
//!
//! The main structure in this module is [`TestExecutor`], which runs a batch of test cases one at
//! a time and reports on them as it goes.

use crate::{
    errors::{DisplayErrorChain, ExecutorBusy},
    launcher::Launcher,
    list::TestCaseDescriptor,
    parse::{self, Document, Element, ParsedResult, TestOutcome},
    reporter::{Reporter, TestResult},
    runner::TestBinaryRunner,
    stopwatch::stopwatch,
};
use std::{
    error::Error,
    fmt,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU8, Ordering},
    },
};

/// The state of a [`TestExecutor`].
///
/// Within a batch the state only moves forward: `Running`, then optionally `Cancelling` and
/// `Cancelled`. A new batch may start once the previous one is `Stopped` or `Cancelled`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[repr(u8)]
pub enum ExecutorState {
    /// No batch is running.
    Stopped = 0,

    /// A batch is running.
    Running = 1,

    /// Cancellation was requested. The test case currently running will be allowed to finish.
    Cancelling = 2,

    /// The last batch stopped early because it was cancelled.
    Cancelled = 3,
}

impl ExecutorState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ExecutorState::Stopped,
            1 => ExecutorState::Running,
            2 => ExecutorState::Cancelling,
            3 => ExecutorState::Cancelled,
            other => unreachable!("invalid executor state {other}"),
        }
    }
}

impl fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExecutorState::Stopped => "stopped",
            ExecutorState::Running => "running",
            ExecutorState::Cancelling => "cancelling",
            ExecutorState::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Default)]
struct SharedState(AtomicU8);

impl SharedState {
    fn load(&self) -> ExecutorState {
        ExecutorState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: ExecutorState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn transition(&self, from: ExecutorState, to: ExecutorState) -> Result<(), ExecutorState> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(ExecutorState::from_u8)
    }

    fn cancel(&self) {
        // Only a running batch can be cancelled. Requests in any other state are ignored.
        if self
            .transition(ExecutorState::Running, ExecutorState::Cancelling)
            .is_ok()
        {
            tracing::debug!("test run cancellation requested");
        }
    }
}

/// A cancellation signal shared across a batch of test cases.
///
/// Cloning a token produces another handle to the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// Returns true if cancellation was signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

/// Run-time configuration for a batch of test cases.
#[derive(Clone)]
pub struct ExecutionContext<'a> {
    launcher: Option<&'a dyn Launcher>,
    token: CancellationToken,
}

impl<'a> ExecutionContext<'a> {
    /// Runs test binaries directly, capturing their standard output.
    pub fn direct(token: CancellationToken) -> Self {
        Self {
            launcher: None,
            token,
        }
    }

    /// Runs test binaries through `launcher`, with a debugger attached.
    pub fn under_debugger(launcher: &'a dyn Launcher, token: CancellationToken) -> Self {
        Self {
            launcher: Some(launcher),
            token,
        }
    }

    /// Returns true if test binaries are run under a debugger.
    pub fn is_debugging(&self) -> bool {
        self.launcher.is_some()
    }

    /// Returns the debugger launcher, if test binaries are run under a debugger.
    pub fn launcher(&self) -> Option<&'a dyn Launcher> {
        self.launcher
    }

    /// Returns the cancellation token for this batch.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl fmt::Debug for ExecutionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("is_debugging", &self.is_debugging())
            .field("token", &self.token)
            .finish()
    }
}

/// Runs test cases one at a time through a [`TestBinaryRunner`], reporting on each one.
#[derive(Debug)]
pub struct TestExecutor<R> {
    runner: R,
    state: Arc<SharedState>,
}

impl<R: TestBinaryRunner> TestExecutor<R> {
    /// Creates a new executor.
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            state: Arc::new(SharedState::default()),
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ExecutorState {
        self.state.load()
    }

    /// Requests cancellation of the running batch.
    ///
    /// The test case currently running is allowed to finish, and no further test cases are
    /// started. Has no effect unless a batch is running.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Returns a handle that can cancel batches on this executor from other threads.
    pub fn cancel_handle(&self) -> ExecutorCancelHandle {
        ExecutorCancelHandle {
            state: self.state.clone(),
        }
    }

    /// Runs `test_cases` in order.
    ///
    /// Failures to run or interpret an individual test case are reported as an
    /// [`Unknown`](TestOutcome::Unknown) outcome for that test case and don't stop the batch. The
    /// batch only stops early if it is cancelled, either through [`Self::cancel`] or through the
    /// context's cancellation token.
    pub fn run_all(
        &self,
        test_cases: &[TestCaseDescriptor],
        cx: &ExecutionContext<'_>,
        reporter: &mut dyn Reporter,
    ) -> Result<RunStats, ExecutorBusy> {
        self.start_batch()?;

        let mut stats = RunStats {
            initial_run_count: test_cases.len(),
            ..RunStats::default()
        };

        for test_case in test_cases {
            if cx.token().is_cancelled() {
                self.cancel();
            }
            if self.state.load() == ExecutorState::Cancelling {
                self.state.store(ExecutorState::Cancelled);
                break;
            }

            let result = self.run_one(test_case, cx, reporter);
            stats.on_outcome(result.outcome());
        }

        let final_state = match self
            .state
            .transition(ExecutorState::Running, ExecutorState::Stopped)
        {
            Ok(()) => ExecutorState::Stopped,
            Err(ExecutorState::Cancelling) => {
                // Cancelled while the last test case was running.
                self.state.store(ExecutorState::Cancelled);
                ExecutorState::Cancelled
            }
            Err(other) => other,
        };
        stats.cancelled = final_state == ExecutorState::Cancelled;
        if stats.cancelled {
            tracing::debug!(
                "test run cancelled after {} of {} test cases",
                stats.final_run_count,
                stats.initial_run_count,
            );
        }

        Ok(stats)
    }

    fn start_batch(&self) -> Result<(), ExecutorBusy> {
        for from in [ExecutorState::Stopped, ExecutorState::Cancelled] {
            match self.state.transition(from, ExecutorState::Running) {
                Ok(()) => return Ok(()),
                Err(ExecutorState::Running | ExecutorState::Cancelling) => return Err(ExecutorBusy),
                Err(_) => {}
            }
        }
        Err(ExecutorBusy)
    }

    /// Runs a single test case and reports on it.
    ///
    /// The reporter sees [`record_start`](Reporter::record_start), then
    /// [`record_end`](Reporter::record_end) once the outcome is known, then
    /// [`record_result`](Reporter::record_result) with failure details filled in.
    pub fn run_one(
        &self,
        test_case: &TestCaseDescriptor,
        cx: &ExecutionContext<'_>,
        reporter: &mut dyn Reporter,
    ) -> TestResult {
        reporter.record_start(test_case);
        let stopwatch = stopwatch();

        let document = self.run_and_parse(test_case, cx);
        let snapshot = stopwatch.snapshot();
        let test_case_element = document.as_ref().map_err(Clone::clone).and_then(|document| {
            parse::locate(document, test_case.name())
                .map_err(|error| describe_error(test_case, "interpret report for", error))
        });

        let mut result = match &test_case_element {
            Ok(element) => ParsedResult::new(parse::classify(element)),
            Err(message) => ParsedResult {
                outcome: TestOutcome::Unknown,
                error_message: Some(message.clone()),
                failure_location: None,
            },
        };
        reporter.record_end(test_case, result.outcome);

        if let (TestOutcome::Failed, Ok(element)) = (result.outcome, &test_case_element) {
            enrich(test_case, element, &mut result);
        }

        let result = TestResult {
            test_case: test_case.clone(),
            result,
            start_time: snapshot.start_time,
            duration: snapshot.duration,
        };
        reporter.record_result(result.clone());
        result
    }

    fn run_and_parse(
        &self,
        test_case: &TestCaseDescriptor,
        cx: &ExecutionContext<'_>,
    ) -> Result<Document, String> {
        let output = self
            .runner
            .run(test_case, cx)
            .map_err(|error| describe_error(test_case, "run", error))?;
        Document::parse(output.as_str())
            .map_err(|error| describe_error(test_case, "interpret report for", error))
    }
}

/// Renders a per-test-case error into the message reported for that test case.
fn describe_error(test_case: &TestCaseDescriptor, action: &str, error: impl Error) -> String {
    let message = DisplayErrorChain::new(error).to_string();
    tracing::debug!(
        "failed to {action} `{}` in {}: {message}",
        test_case.name(),
        test_case.binary_path(),
    );
    message
}

/// Fills in the error message and failure location of a failed test case.
///
/// Errors are logged and otherwise ignored: the outcome is already known at this point.
fn enrich(test_case: &TestCaseDescriptor, element: &Element, result: &mut ParsedResult) {
    result.error_message = Some(parse::extract_error_message(element));
    match parse::locate_failure(element) {
        Ok(location) => result.failure_location = Some(location),
        Err(error) => {
            tracing::warn!(
                "could not determine where `{}` failed: {}",
                test_case.name(),
                DisplayErrorChain::new(error),
            );
        }
    }
}

/// A handle to cancel batches on a [`TestExecutor`].
///
/// Returned by [`TestExecutor::cancel_handle`]. Handles can be cloned and sent to other threads,
/// for example to a signal handler.
#[derive(Clone, Debug)]
pub struct ExecutorCancelHandle {
    state: Arc<SharedState>,
}

impl ExecutorCancelHandle {
    /// Requests cancellation of the running batch. Equivalent to [`TestExecutor::cancel`].
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Returns the current state of the executor.
    pub fn state(&self) -> ExecutorState {
        self.state.load()
    }
}

/// Statistics for a batch of test cases.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq)]
pub struct RunStats {
    /// The total number of test cases that were expected to be run at the beginning.
    ///
    /// If the batch is cancelled, this will be more than `final_run_count`.
    pub initial_run_count: usize,

    /// The total number of test cases that were actually run.
    pub final_run_count: usize,

    /// The number of test cases that passed.
    pub passed: usize,

    /// The number of test cases that failed.
    pub failed: usize,

    /// The number of test cases whose outcome could not be determined.
    pub unknown: usize,

    /// True if the batch was cancelled.
    pub cancelled: bool,
}

impl RunStats {
    /// Returns true if every test case was run and passed.
    pub fn is_success(&self) -> bool {
        self.initial_run_count == self.final_run_count && self.failed == 0 && self.unknown == 0
    }

    fn on_outcome(&mut self, outcome: TestOutcome) {
        self.final_run_count += 1;
        match outcome {
            TestOutcome::Passed => self.passed += 1,
            TestOutcome::Failed => self.failed += 1,
            TestOutcome::Unknown => self.unknown += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        errors::{ProcessRunError, ResultParseError},
        parse::FailureLocation,
        runner::RawOutput,
    };
    use pretty_assertions::assert_eq;
    use std::{
        collections::HashMap,
        sync::{Barrier, Mutex},
    };

    #[derive(Clone, Debug, Eq, PartialEq)]
    enum Event {
        Start(String),
        End(String, TestOutcome),
        Result(String, ParsedResult),
    }

    #[derive(Debug, Default)]
    struct RecordingReporter {
        events: Vec<Event>,
    }

    impl RecordingReporter {
        fn started(&self) -> Vec<&str> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::Start(name) => Some(name.as_str()),
                    _ => None,
                })
                .collect()
        }

        fn results(&self) -> Vec<(&str, &ParsedResult)> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::Result(name, result) => Some((name.as_str(), result)),
                    _ => None,
                })
                .collect()
        }
    }

    impl Reporter for RecordingReporter {
        fn record_start(&mut self, test_case: &TestCaseDescriptor) {
            self.events.push(Event::Start(test_case.name().to_owned()));
        }

        fn record_end(&mut self, test_case: &TestCaseDescriptor, outcome: TestOutcome) {
            self.events
                .push(Event::End(test_case.name().to_owned(), outcome));
        }

        fn record_result(&mut self, result: TestResult) {
            self.events.push(Event::Result(
                result.test_case.name().to_owned(),
                result.result,
            ));
        }
    }

    /// Returns canned output per test name. Names without canned output fail to launch.
    #[derive(Default)]
    struct FakeRunner {
        outputs: HashMap<String, String>,
        on_run: Option<Box<dyn Fn(&TestCaseDescriptor) + Send + Sync>>,
    }

    impl FakeRunner {
        fn with_output(mut self, name: &str, xml: &str) -> Self {
            self.outputs.insert(name.to_owned(), xml.to_owned());
            self
        }
    }

    impl TestBinaryRunner for FakeRunner {
        fn run(
            &self,
            test_case: &TestCaseDescriptor,
            _cx: &ExecutionContext<'_>,
        ) -> Result<RawOutput, ProcessRunError> {
            if let Some(on_run) = &self.on_run {
                on_run(test_case);
            }
            match self.outputs.get(test_case.name()) {
                Some(xml) => Ok(RawOutput::new(xml.as_str())),
                None => Err(ProcessRunError::ProcessLaunch {
                    binary: test_case.binary_path().to_owned(),
                    error: std::io::Error::new(std::io::ErrorKind::NotFound, "no such binary"),
                }),
            }
        }
    }

    fn passing(name: &str) -> String {
        format!(r#"<TestCase name="{name}"><OverallResult success="true"/></TestCase>"#)
    }

    fn test_cases(names: &[&str]) -> Vec<TestCaseDescriptor> {
        names
            .iter()
            .map(|name| TestCaseDescriptor::new(*name, "/build/tests"))
            .collect()
    }

    fn direct() -> ExecutionContext<'static> {
        ExecutionContext::direct(CancellationToken::new())
    }

    #[test]
    fn passed_test_case() {
        let executor = TestExecutor::new(FakeRunner::default().with_output(
            "T1",
            r#"<TestCase name="T1"><OverallResult success="true"/></TestCase>"#,
        ));
        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
            .expect("executor is idle");

        assert_eq!(
            reporter.events,
            vec![
                Event::Start("T1".to_owned()),
                Event::End("T1".to_owned(), TestOutcome::Passed),
                Event::Result("T1".to_owned(), ParsedResult::new(TestOutcome::Passed)),
            ],
        );
        assert_eq!(
            stats,
            RunStats {
                initial_run_count: 1,
                final_run_count: 1,
                passed: 1,
                ..RunStats::default()
            }
        );
        assert!(stats.is_success());
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }

    #[test]
    fn failed_test_case_is_enriched() {
        let executor = TestExecutor::new(FakeRunner::default().with_output(
            "T2",
            r#"<TestCase name="T2"><OverallResult success="false"/><Expression success="false" filename="foo.cpp" line="42"/></TestCase>"#,
        ));
        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(&test_cases(&["T2"]), &direct(), &mut reporter)
            .expect("executor is idle");

        assert_eq!(
            reporter.events,
            vec![
                Event::Start("T2".to_owned()),
                Event::End("T2".to_owned(), TestOutcome::Failed),
                Event::Result(
                    "T2".to_owned(),
                    ParsedResult {
                        outcome: TestOutcome::Failed,
                        error_message: Some(String::new()),
                        failure_location: Some(FailureLocation {
                            file: "foo.cpp".into(),
                            line: 42,
                        }),
                    }
                ),
            ],
        );
        assert_eq!(stats.failed, 1);
        assert!(!stats.is_success());
    }

    #[test]
    fn enrichment_failure_keeps_outcome() {
        let executor = TestExecutor::new(FakeRunner::default().with_output(
            "T3",
            r#"<TestCase name="T3"><Expression success="false" filename="foo.cpp" line="forty-two"/><OverallResult success="false"/></TestCase>"#,
        ));
        let mut reporter = RecordingReporter::default();
        executor
            .run_all(&test_cases(&["T3"]), &direct(), &mut reporter)
            .expect("executor is idle");

        assert_eq!(
            reporter.results(),
            vec![(
                "T3",
                &ParsedResult {
                    outcome: TestOutcome::Failed,
                    error_message: Some(String::new()),
                    failure_location: None,
                }
            )],
        );
    }

    #[test]
    fn per_test_errors_do_not_stop_the_batch() {
        let executor = TestExecutor::new(
            FakeRunner::default()
                // T2's report doesn't mention T2.
                .with_output("T2", &passing("T1"))
                .with_output("T3", "<TestCase name=")
                .with_output("T4", &passing("T4")),
        );
        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(
                &test_cases(&["T1", "T2", "T3", "T4"]),
                &direct(),
                &mut reporter,
            )
            .expect("executor is idle");

        assert_eq!(
            stats,
            RunStats {
                initial_run_count: 4,
                final_run_count: 4,
                passed: 1,
                unknown: 3,
                ..RunStats::default()
            }
        );

        let results = reporter.results();
        let outcomes: Vec<_> = results
            .iter()
            .map(|(name, result)| (*name, result.outcome))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("T1", TestOutcome::Unknown),
                ("T2", TestOutcome::Unknown),
                ("T3", TestOutcome::Unknown),
                ("T4", TestOutcome::Passed),
            ],
        );

        // The error chain is reported as the message.
        let launch_message = results[0].1.error_message.as_deref().unwrap();
        assert!(
            launch_message.starts_with("failed to start test binary `/build/tests`"),
            "{launch_message}"
        );
        assert!(launch_message.contains("no such binary"), "{launch_message}");
        assert_eq!(
            results[1].1.error_message.as_deref(),
            Some(
                ResultParseError::TestCaseNotFound {
                    name: "T2".to_owned()
                }
                .to_string()
                .as_str()
            ),
        );
        assert_eq!(results[1].1.failure_location, None);
    }

    #[test]
    fn unknown_outcome_without_overall_result() {
        let executor = TestExecutor::new(
            FakeRunner::default().with_output("T1", r#"<TestCase name="T1"/>"#),
        );
        let mut reporter = RecordingReporter::default();
        executor
            .run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
            .expect("executor is idle");
        assert_eq!(
            reporter.results(),
            vec![("T1", &ParsedResult::new(TestOutcome::Unknown))],
        );
    }

    #[test]
    fn cancel_while_running() {
        let names = ["T0", "T1", "T2", "T3", "T4"];
        for cancel_at in 0..names.len() {
            let handle_slot: Arc<Mutex<Option<ExecutorCancelHandle>>> = Arc::default();
            let slot = handle_slot.clone();
            let cancel_name = names[cancel_at];

            let mut runner = FakeRunner::default();
            for name in names {
                runner = runner.with_output(name, &passing(name));
            }
            runner.on_run = Some(Box::new(move |test_case| {
                if test_case.name() == cancel_name {
                    let handle = slot.lock().unwrap();
                    let handle = handle.as_ref().unwrap();
                    handle.cancel();
                    // Repeated requests are harmless.
                    handle.cancel();
                    assert_eq!(handle.state(), ExecutorState::Cancelling);
                }
            }));

            let executor = TestExecutor::new(runner);
            *handle_slot.lock().unwrap() = Some(executor.cancel_handle());

            let mut reporter = RecordingReporter::default();
            let stats = executor
                .run_all(&test_cases(&names), &direct(), &mut reporter)
                .expect("executor is idle");

            assert_eq!(reporter.started(), &names[..=cancel_at], "cancel at {cancel_at}");
            // The test case that was running when cancellation was requested still completes.
            assert_eq!(reporter.results().len(), cancel_at + 1);
            assert_eq!(stats.final_run_count, cancel_at + 1);
            assert!(stats.cancelled);
            assert_eq!(executor.state(), ExecutorState::Cancelled);
        }
    }

    #[test]
    fn cancel_through_token() {
        let token = CancellationToken::new();
        let token_in_runner = token.clone();
        let runner = FakeRunner {
            on_run: Some(Box::new(move |_| token_in_runner.cancel())),
            ..FakeRunner::default()
        }
        .with_output("T1", &passing("T1"))
        .with_output("T2", &passing("T2"));

        let executor = TestExecutor::new(runner);
        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(
                &test_cases(&["T1", "T2"]),
                &ExecutionContext::direct(token),
                &mut reporter,
            )
            .expect("executor is idle");

        assert_eq!(reporter.started(), vec!["T1"]);
        assert!(stats.cancelled);
        assert!(!stats.is_success());
        assert_eq!(executor.state(), ExecutorState::Cancelled);
    }

    #[test]
    fn cancel_when_idle_is_ignored() {
        let executor = TestExecutor::new(FakeRunner::default().with_output("T1", &passing("T1")));
        executor.cancel();
        assert_eq!(executor.state(), ExecutorState::Stopped);

        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
            .expect("executor is idle");
        assert!(stats.is_success());
        assert!(!stats.cancelled);
    }

    #[test]
    fn rerun_after_cancel() {
        let executor = TestExecutor::new(FakeRunner::default().with_output("T1", &passing("T1")));
        let token = CancellationToken::new();
        token.cancel();

        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(
                &test_cases(&["T1"]),
                &ExecutionContext::direct(token),
                &mut reporter,
            )
            .expect("executor is idle");
        assert!(stats.cancelled);
        assert_eq!(stats.final_run_count, 0);
        assert!(reporter.events.is_empty());
        assert_eq!(executor.state(), ExecutorState::Cancelled);

        // A new batch with a fresh token runs normally.
        let stats = executor
            .run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
            .expect("cancelled executor can start a new batch");
        assert!(stats.is_success());
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }

    #[test]
    fn empty_batch() {
        let executor = TestExecutor::new(FakeRunner::default());
        let mut reporter = RecordingReporter::default();
        let stats = executor
            .run_all(&[], &direct(), &mut reporter)
            .expect("executor is idle");
        assert_eq!(stats, RunStats::default());
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }

    #[test]
    fn concurrent_batch_is_rejected() {
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        let (started_in_runner, release_in_runner) = (started.clone(), release.clone());
        let runner = FakeRunner {
            on_run: Some(Box::new(move |_| {
                started_in_runner.wait();
                release_in_runner.wait();
            })),
            ..FakeRunner::default()
        }
        .with_output("T1", &passing("T1"));
        let executor = TestExecutor::new(runner);

        std::thread::scope(|s| {
            let batch = s.spawn(|| {
                let mut reporter = RecordingReporter::default();
                executor.run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
            });

            started.wait();
            assert_eq!(executor.state(), ExecutorState::Running);
            let mut reporter = RecordingReporter::default();
            executor
                .run_all(&test_cases(&["T1"]), &direct(), &mut reporter)
                .expect_err("a batch is already running");
            assert!(reporter.events.is_empty());
            release.wait();

            let stats = batch
                .join()
                .expect("batch thread did not panic")
                .expect("first batch ran");
            assert!(stats.is_success());
        });
        assert_eq!(executor.state(), ExecutorState::Stopped);
    }
}
