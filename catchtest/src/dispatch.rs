// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    displayer::TestDisplayer,
    errors::ExpectedError,
    output::{OutputContext, OutputOpts, clap_styles},
    reporter::CliReporter,
    signal,
};
use camino::{Utf8Path, Utf8PathBuf};
use catchtest_metadata::{CatchTestExitCode, TestListSummary};
use catchtest_runner::{
    config::CatchTestConfig,
    executor::{CancellationToken, ExecutionContext, TestExecutor},
    launcher::DebuggerCommandLauncher,
    list::{self, CatchTestLister, TestCaseDescriptor, TestDiscoverer},
    reporter::JunitReporter,
    runner::ProcessRunner,
};
use clap::{Args, Parser, Subcommand, ValueEnum};
use owo_colors::{OwoColorize, Style, style};
use serde::Serialize;
use std::{
    collections::BTreeSet,
    io::{BufWriter, Write},
};
use supports_color::Stream;

/// Runs test binaries written against the Catch C++ test framework.
#[derive(Debug, Parser)]
#[command(version, styles = clap_styles::style())]
pub struct CatchTestApp {
    #[command(flatten)]
    output: OutputOpts,

    #[command(flatten)]
    config_opts: ConfigOpts,

    #[command(subcommand)]
    command: Command,
}

impl CatchTestApp {
    /// Initializes logging and color support.
    pub fn init_output(&self) -> OutputContext {
        self.output.init()
    }

    /// Executes the app, returning the process exit code.
    pub fn exec(self, output: OutputContext) -> Result<i32, ExpectedError> {
        match self.command {
            Command::List {
                build_filter,
                message_format,
            } => {
                let test_cases = build_filter.compute()?;
                write_test_list(&test_cases, message_format, output)?;
                Ok(CatchTestExitCode::OK)
            }
            Command::Run {
                profile,
                debug,
                build_filter,
                message_format,
            } => {
                let workspace_root = self.config_opts.workspace_root()?;
                let config = CatchTestConfig::from_sources(
                    workspace_root,
                    self.config_opts.config_file.as_deref(),
                )?;
                let profile = config.profile(
                    profile
                        .as_deref()
                        .unwrap_or(CatchTestConfig::DEFAULT_PROFILE),
                )?;

                let test_cases = build_filter.compute()?;
                if test_cases.is_empty() {
                    return Err(ExpectedError::NoTestsRun);
                }

                let executor = TestExecutor::new(ProcessRunner::from_profile(&profile));
                let token = CancellationToken::new();
                signal::install_handler(executor.cancel_handle(), token.clone())?;

                let launcher = debug.then(|| {
                    let command = profile.debugger().clone();
                    tracing::debug!("running tests under debugger `{command}`");
                    DebuggerCommandLauncher::new(command)
                });
                let cx = match &launcher {
                    Some(launcher) => ExecutionContext::under_debugger(launcher, token),
                    None => ExecutionContext::direct(token),
                };

                let junit_path = profile.junit_path();
                let junit = junit_path
                    .as_ref()
                    .map(|_| JunitReporter::new(format!("catchtest-run-{}", profile.name())));

                let mut displayer =
                    TestDisplayer::new(std::io::stderr(), debug || output.verbose);
                if output.color.should_colorize(Stream::Stderr) {
                    displayer.colorize();
                }
                let mut reporter = CliReporter::new(displayer, junit);
                reporter.run_started(test_cases.len(), binary_count(&test_cases))?;

                let stats = executor
                    .run_all(&test_cases, &cx, &mut reporter)
                    .expect("a newly created executor is idle");
                let summary = reporter.finish(&stats, junit_path.as_deref())?;

                if let Some(format) = message_format.serializable() {
                    write_json(&summary, format)?;
                }

                if stats.cancelled {
                    Err(ExpectedError::RunCancelled)
                } else if !stats.is_success() {
                    Err(ExpectedError::TestRunFailed)
                } else {
                    Ok(CatchTestExitCode::OK)
                }
            }
        }
    }
}

#[derive(Debug, Args)]
struct ConfigOpts {
    /// Workspace root, used to find the config file and resolve JUnit paths [default: current
    /// directory]
    #[arg(long, global = true, value_name = "DIR")]
    workspace_root: Option<Utf8PathBuf>,

    /// Config file [default: workspace-root/.config/catchtest.toml]
    #[arg(long, global = true, value_name = "PATH")]
    config_file: Option<Utf8PathBuf>,
}

impl ConfigOpts {
    fn workspace_root(&self) -> Result<Utf8PathBuf, ExpectedError> {
        match &self.workspace_root {
            Some(root) => Ok(root.clone()),
            None => {
                let current_dir = std::env::current_dir()
                    .map_err(|err| ExpectedError::CurrentDirFailed { err })?;
                Utf8PathBuf::try_from(current_dir)
                    .map_err(|err| ExpectedError::CurrentDirInvalidUtf8 { err })
            }
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List tests in test binaries
    ///
    /// Each binary is queried with `--list-test-names-only`. Use --message-format json to get
    /// machine-readable output.
    List {
        #[command(flatten)]
        build_filter: TestBuildFilter,

        /// Output format
        #[arg(
            short = 'T',
            long,
            value_enum,
            default_value_t,
            help_heading = "Output options",
            value_name = "FMT"
        )]
        message_format: MessageFormat,
    },

    /// Run tests
    ///
    /// Each test case is run in its own process, one at a time. Press Ctrl-C to cancel the run
    /// once the current test case finishes.
    Run {
        /// Configuration profile to use
        #[arg(long, short = 'P', env = "CATCHTEST_PROFILE")]
        profile: Option<String>,

        /// Run each test case under the debugger configured in the profile
        #[arg(long)]
        debug: bool,

        #[command(flatten)]
        build_filter: TestBuildFilter,

        /// Format for a machine-readable summary written to stdout after the run
        #[arg(
            short = 'T',
            long,
            value_enum,
            default_value_t,
            help_heading = "Output options",
            value_name = "FMT"
        )]
        message_format: MessageFormat,
    },
}

#[derive(Debug, Args)]
struct TestBuildFilter {
    /// Test binary to query for tests (may be specified multiple times)
    #[arg(short = 'b', long = "binary", value_name = "PATH", required = true)]
    binaries: Vec<Utf8PathBuf>,

    /// Only include tests whose names contain one of these strings
    #[arg(value_name = "FILTERS")]
    filters: Vec<String>,
}

impl TestBuildFilter {
    fn compute(&self) -> Result<Vec<TestCaseDescriptor>, ExpectedError> {
        // Binaries may be run from their own directory, so relative paths must be resolved first.
        let binaries = self
            .binaries
            .iter()
            .map(|binary| {
                binary
                    .canonicalize_utf8()
                    .map_err(|err| ExpectedError::binary_not_found(binary, err))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let test_cases = CatchTestLister::new().discover(&binaries)?;
        Ok(test_cases
            .into_iter()
            .filter(|test_case| self.matches(test_case.name()))
            .collect())
    }

    fn matches(&self, name: &str) -> bool {
        self.filters.is_empty() || self.filters.iter().any(|filter| name.contains(filter.as_str()))
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
enum MessageFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON with no whitespace
    Json,
    /// JSON, prettified
    JsonPretty,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum SerializableFormat {
    Json,
    JsonPretty,
}

impl MessageFormat {
    fn serializable(self) -> Option<SerializableFormat> {
        match self {
            MessageFormat::Human => None,
            MessageFormat::Json => Some(SerializableFormat::Json),
            MessageFormat::JsonPretty => Some(SerializableFormat::JsonPretty),
        }
    }
}

fn binary_count(test_cases: &[TestCaseDescriptor]) -> usize {
    test_cases
        .iter()
        .map(|test_case| test_case.binary_path())
        .collect::<BTreeSet<_>>()
        .len()
}

fn write_test_list(
    test_cases: &[TestCaseDescriptor],
    message_format: MessageFormat,
    output: OutputContext,
) -> Result<(), ExpectedError> {
    let summary = list::to_summary(test_cases);
    if let Some(format) = message_format.serializable() {
        return write_json(&summary, format);
    }

    let binary_style = if output.color.should_colorize(Stream::Stdout) {
        style().magenta().bold()
    } else {
        Style::new()
    };
    let mut writer = BufWriter::new(std::io::stdout().lock());
    write_human_list(&mut writer, &summary, binary_style)
        .and_then(|()| writer.flush())
        .map_err(ExpectedError::write_output_error)
}

fn write_human_list(
    writer: &mut impl Write,
    summary: &TestListSummary,
    binary_style: Style,
) -> std::io::Result<()> {
    for (binary, binary_summary) in &summary.binaries {
        writeln!(writer, "{}:", binary.style(binary_style))?;
        for name in &binary_summary.testcases {
            writeln!(writer, "    {name}")?;
        }
    }
    Ok(())
}

fn write_json(value: &impl Serialize, format: SerializableFormat) -> Result<(), ExpectedError> {
    let mut writer = BufWriter::new(std::io::stdout().lock());
    match format {
        SerializableFormat::Json => serde_json::to_writer(&mut writer, value),
        SerializableFormat::JsonPretty => serde_json::to_writer_pretty(&mut writer, value),
    }
    .map_err(ExpectedError::write_json_error)?;
    writeln!(writer)
        .and_then(|()| writer.flush())
        .map_err(ExpectedError::write_output_error)
}
