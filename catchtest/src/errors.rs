// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING_TARGET, StderrStyles};
use camino::Utf8PathBuf;
use catchtest_metadata::CatchTestExitCode;
use catchtest_runner::errors::{
    ConfigParseError, ConfigParseErrorKind, JunitWriteError, ProfileNotFound, TestListError,
};
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;

// The #[error()] strings are placeholders: errors are printed out with display_to_stderr, which
// colorizes them.

/// An error that catchtest expects to encounter, mapped to a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine the current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 {
        #[source]
        err: camino::FromPathBufError,
    },
    #[error("test binary not found")]
    BinaryNotFound {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("profile not found")]
    ProfileNotFound {
        #[from]
        err: ProfileNotFound,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to set up Ctrl-C handler")]
    SignalHandlerSetupError {
        #[from]
        err: ctrlc::Error,
    },
    #[error("create test list error")]
    CreateTestListError {
        #[from]
        err: TestListError,
    },
    #[error("no tests to run")]
    NoTestsRun,
    #[error("test run failed")]
    TestRunFailed,
    #[error("test run cancelled")]
    RunCancelled,
    #[error("writing output failed")]
    WriteOutputError {
        #[source]
        err: std::io::Error,
    },
    #[error("writing JSON output failed")]
    WriteJsonError {
        #[source]
        err: serde_json::Error,
    },
    #[error("writing JUnit report failed")]
    JunitWriteError {
        #[from]
        err: JunitWriteError,
    },
}

impl ExpectedError {
    pub(crate) fn binary_not_found(path: impl Into<Utf8PathBuf>, err: std::io::Error) -> Self {
        Self::BinaryNotFound {
            path: path.into(),
            err,
        }
    }

    pub(crate) fn write_output_error(err: std::io::Error) -> Self {
        Self::WriteOutputError { err }
    }

    pub(crate) fn write_json_error(err: serde_json::Error) -> Self {
        Self::WriteJsonError { err }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::BinaryNotFound { .. }
            | Self::ProfileNotFound { .. }
            | Self::ConfigParseError { .. }
            | Self::SignalHandlerSetupError { .. } => CatchTestExitCode::SETUP_ERROR,
            Self::CreateTestListError { .. } => CatchTestExitCode::TEST_LIST_CREATION_FAILED,
            Self::NoTestsRun => CatchTestExitCode::NO_TESTS_RUN,
            Self::TestRunFailed => CatchTestExitCode::TEST_RUN_FAILED,
            Self::RunCancelled => CatchTestExitCode::RUN_CANCELLED,
            Self::WriteOutputError { .. }
            | Self::WriteJsonError { .. }
            | Self::JunitWriteError { .. } => CatchTestExitCode::WRITE_OUTPUT_ERROR,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { err } => {
                tracing::error!("could not determine the current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { err } => {
                tracing::error!(
                    "current directory `{}` is not valid UTF-8",
                    err.as_path().display().style(styles.bold)
                );
                None
            }
            Self::BinaryNotFound { path, err } => {
                tracing::error!("test binary `{}` not found", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::ProfileNotFound { err } => {
                tracing::error!("{err}");
                err.source()
            }
            Self::ConfigParseError { err } => {
                match err.kind() {
                    ConfigParseErrorKind::BuildError(error) => {
                        tracing::error!(
                            "failed to parse catchtest config at `{}`",
                            err.config_file().style(styles.bold)
                        );
                        Some(error.as_ref() as &dyn Error)
                    }
                    ConfigParseErrorKind::DeserializeError(error) => {
                        tracing::error!(
                            "failed to parse catchtest config at `{}`: error at `{}`",
                            err.config_file().style(styles.bold),
                            error.path().style(styles.bold),
                        );
                        Some(error.inner() as &dyn Error)
                    }
                    _ => {
                        tracing::error!("{err}");
                        err.source()
                    }
                }
            }
            Self::SignalHandlerSetupError { err } => {
                tracing::error!("failed to set up Ctrl-C handler");
                Some(err as &dyn Error)
            }
            Self::CreateTestListError { err } => {
                tracing::error!("creating test list failed");
                Some(err as &dyn Error)
            }
            Self::NoTestsRun => {
                tracing::error!("no tests to run");
                None
            }
            Self::TestRunFailed => {
                tracing::error!("test run failed");
                None
            }
            Self::RunCancelled => {
                tracing::error!("test run cancelled");
                None
            }
            Self::WriteOutputError { err } => {
                tracing::error!("failed to write output");
                Some(err as &dyn Error)
            }
            Self::WriteJsonError { err } => {
                tracing::error!("failed to write JSON output");
                Some(err as &dyn Error)
            }
            Self::JunitWriteError { err } => {
                tracing::error!("{err}");
                err.source()
            }
        };

        while let Some(err) = next_error {
            tracing::error!(
                target: NO_HEADING_TARGET,
                "\n{}\n  {}",
                "caused by:".style(styles.warning_text),
                err,
            );
            next_error = err.source();
        }
    }
}
