// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by catchtest.

use crate::launcher::ProcessId;
use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error::Error, fmt, num::ParseIntError, string::FromUtf8Error};
use thiserror::Error;

/// Displays an error along with the chain of errors that caused it.
///
/// Used for log lines and for diagnostic messages attached to test results.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut cause = self.error.source();
        if cause.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(error) = cause {
            write!(f, "\n  - {error}")?;
            cause = error.source();
        }

        Ok(())
    }
}

/// An error that occurred while obtaining the raw output of a single test case.
///
/// Errors of this kind are local to one test case: the executor reports the test case with an
/// [`Unknown`](crate::parse::TestOutcome::Unknown) outcome and moves on to the next one.
#[derive(Debug, Error)]
pub enum ProcessRunError {
    /// The test binary could not be started.
    #[error("failed to start test binary `{binary}`")]
    ProcessLaunch {
        /// The binary that was being started.
        binary: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The output of the test binary could not be captured.
    #[error("failed to capture output of test binary `{binary}`")]
    ProcessOutput {
        /// The binary whose output was being captured.
        binary: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The debugger could not be started.
    #[error("failed to start test binary `{binary}` under the debugger")]
    DebuggerLaunch {
        /// The binary that was being started.
        binary: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: DebuggerLaunchError,
    },

    /// Waiting for the debugged process to exit failed.
    #[error("failed to wait for debugged process {pid} (test binary `{binary}`)")]
    DebuggerWait {
        /// The binary that was being debugged.
        binary: Utf8PathBuf,

        /// The process that was being waited on.
        pid: ProcessId,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The temporary file used to collect output in debugger mode could not be created.
    #[error("failed to create temporary output file")]
    OutputFileCreate {
        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The temporary file used to collect output in debugger mode could not be read.
    #[error("failed to read test output from `{path}`")]
    OutputFileRead {
        /// The path to the output file.
        path: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },
}

/// An error returned by a [`Launcher`](crate::launcher::Launcher) when a debugger-attached launch
/// could not be started.
#[derive(Debug, Error)]
pub enum DebuggerLaunchError {
    /// Spawning the debugger process failed.
    #[error("failed to spawn debugger `{program}`")]
    Spawn {
        /// The debugger program.
        program: String,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// A host-specific launcher refused the launch.
    #[error("{message}")]
    Refused {
        /// A description of why the launch was refused.
        message: String,
    },
}

/// An error that occurred while interpreting the XML output of a test binary.
#[derive(Debug, Error)]
pub enum ResultParseError {
    /// The output is not well-formed XML.
    #[error("test output is not well-formed XML")]
    Malformed {
        /// The underlying error.
        #[source]
        error: quick_xml::Error,
    },

    /// The output ended while an element was still open.
    #[error("test output ended before `<{element}>` was closed")]
    Truncated {
        /// The innermost element that was still open.
        element: String,
    },

    /// The output does not contain any elements.
    #[error("test output is empty")]
    Empty,

    /// No `TestCase` element with the expected name was found.
    #[error("no TestCase element named `{name}` found in test output")]
    TestCaseNotFound {
        /// The name that was searched for.
        name: String,
    },

    /// No `Expression` element marked as failing was found.
    #[error("no failing Expression element found in test case")]
    NoFailureExpressionFound,

    /// An element is missing a required attribute.
    #[error("`<{element}>` is missing the `{attribute}` attribute")]
    MissingAttribute {
        /// The element's tag name.
        element: String,

        /// The missing attribute.
        attribute: &'static str,
    },

    /// A `line` attribute could not be parsed as a line number.
    #[error("invalid line number `{value}`")]
    InvalidLine {
        /// The attribute value.
        value: String,

        /// The underlying error.
        #[source]
        error: ParseIntError,
    },
}

/// Returned by [`TestExecutor::run_all`](crate::executor::TestExecutor::run_all) if a batch is
/// already running on the same executor.
#[derive(Clone, Debug, Error)]
#[error("a test run is already in progress on this executor")]
#[non_exhaustive]
pub struct ExecutorBusy;

/// An error that occurred while listing the test cases in a binary.
#[derive(Debug, Error)]
pub enum TestListError {
    /// Running the binary in list mode failed.
    #[error("failed to run `{binary} --list-test-names-only`")]
    CommandExec {
        /// The binary being listed.
        binary: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// The list output is not valid UTF-8.
    #[error("test list output for `{binary}` is not valid UTF-8")]
    NonUtf8 {
        /// The binary being listed.
        binary: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: FromUtf8Error,
    },
}

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse catchtest config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    kind: ConfigParseErrorKind,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, kind: ConfigParseErrorKind) -> Self {
        Self {
            config_file: config_file.into(),
            kind,
        }
    }

    /// Returns the config file for this error.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }

    /// Returns the kind of error this is.
    pub fn kind(&self) -> &ConfigParseErrorKind {
        &self.kind
    }
}

/// The kind of error that occurred while parsing a config.
///
/// Returned by [`ConfigParseError::kind`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigParseErrorKind {
    /// An error occurred while building the config.
    #[error(transparent)]
    BuildError(Box<ConfigError>),

    /// An error occurred while deserializing the config.
    #[error(transparent)]
    DeserializeError(Box<serde_path_to_error::Error<ConfigError>>),
}

/// An error which indicates that a profile was requested but not known to catchtest.
#[derive(Clone, Debug, Error)]
#[error("profile `{profile}` not found (known profiles: {})", .all_profiles.join(", "))]
pub struct ProfileNotFound {
    profile: String,
    all_profiles: Vec<String>,
}

impl ProfileNotFound {
    pub(crate) fn new(
        profile: impl Into<String>,
        all_profiles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut all_profiles: Vec<_> = all_profiles.into_iter().map(|s| s.into()).collect();
        all_profiles.sort_unstable();
        Self {
            profile: profile.into(),
            all_profiles,
        }
    }
}

/// An error that occurred while parsing a debugger command.
#[derive(Debug, Error)]
pub enum DebuggerCommandParseError {
    /// The command could not be split into words.
    #[error("failed to split debugger command `{input}`")]
    ShellWords {
        /// The input that failed to parse.
        input: String,

        /// The underlying error.
        #[source]
        error: shell_words::ParseError,
    },

    /// The command is empty.
    #[error("debugger command is empty")]
    Empty,
}

/// An error that occurred while writing a JUnit report.
#[derive(Debug, Error)]
pub enum JunitWriteError {
    /// A filesystem operation failed.
    #[error("error writing JUnit output to `{file}`")]
    Fs {
        /// The file or directory being written to.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: std::io::Error,
    },

    /// Serializing the report failed.
    #[error("error serializing JUnit report to `{file}`")]
    Serialize {
        /// The file being written to.
        file: Utf8PathBuf,

        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },
}
