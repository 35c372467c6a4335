// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Running a single test case and capturing its XML report.
//!
//! Each test case is run in its own process. Outside a debugger, the report is read from standard
//! output. Under a debugger, the process is started by a [`Launcher`], which may not give access
//! to standard output, so the report is written to a temporary file instead.

use crate::{
    args::escape_args,
    config::{CatchTestProfile, WorkingDir},
    errors::ProcessRunError,
    executor::ExecutionContext,
    launcher::{DebuggeeLaunch, Launcher},
    list::TestCaseDescriptor,
};
use camino::Utf8Path;
use camino_tempfile::Utf8TempPath;
use std::collections::BTreeMap;

#[cfg(unix)]
#[path = "unix.rs"]
mod os;

#[cfg(windows)]
#[path = "windows.rs"]
mod os;

/// The XML report produced by running one test case.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RawOutput {
    xml: String,
}

impl RawOutput {
    /// Wraps captured report text.
    pub fn new(xml: impl Into<String>) -> Self {
        Self { xml: xml.into() }
    }

    /// Returns the report text.
    pub fn as_str(&self) -> &str {
        &self.xml
    }

    /// Consumes `self`, returning the report text.
    pub fn into_string(self) -> String {
        self.xml
    }
}

/// Runs a single test case and returns its raw report.
///
/// [`ProcessRunner`] is the implementation used in practice.
pub trait TestBinaryRunner {
    /// Runs `test_case`, under a debugger if `cx` has a launcher.
    fn run(
        &self,
        test_case: &TestCaseDescriptor,
        cx: &ExecutionContext<'_>,
    ) -> Result<RawOutput, ProcessRunError>;
}

/// Runs test binaries as child processes.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    working_dir: WorkingDir,
    env: BTreeMap<String, String>,
}

impl ProcessRunner {
    /// Creates a new runner.
    ///
    /// `env` is applied on top of the environment inherited from this process.
    pub fn new(working_dir: WorkingDir, env: BTreeMap<String, String>) -> Self {
        Self { working_dir, env }
    }

    /// Creates a runner configured by a profile.
    pub fn from_profile(profile: &CatchTestProfile<'_>) -> Self {
        Self::new(profile.working_dir(), profile.env())
    }

    fn cwd<'a>(&self, binary: &'a Utf8Path) -> Option<&'a Utf8Path> {
        match self.working_dir {
            WorkingDir::BinaryDir => binary.parent().filter(|dir| !dir.as_str().is_empty()),
            WorkingDir::Inherit => None,
        }
    }

    fn env_for(&self, mode: &'static str) -> BTreeMap<String, String> {
        let mut env = self.env.clone();
        env.insert("CATCHTEST".to_owned(), "1".to_owned());
        env.insert("CATCHTEST_EXECUTION_MODE".to_owned(), mode.to_owned());
        env
    }

    fn run_direct(&self, test_case: &TestCaseDescriptor) -> Result<RawOutput, ProcessRunError> {
        let binary = test_case.binary_path();
        tracing::debug!("running `{binary} {} --reporter xml`", test_case.name());

        let mut cmd = duct::cmd(
            binary.as_std_path(),
            [test_case.name(), "--reporter", "xml"],
        )
        .stdin_null()
        .stdout_capture()
        .stderr_capture()
        // A failing test exits with a non-zero code, which is reported through the XML instead.
        .unchecked()
        // Ctrl-C cancels the run, but the running test case is allowed to finish. A debugger keeps
        // the terminal's process group, so this only applies to direct runs.
        .before_spawn(|cmd| {
            os::set_process_group(cmd);
            Ok(())
        });
        for (key, value) in self.env_for("direct") {
            cmd = cmd.env(key, value);
        }
        if let Some(cwd) = self.cwd(binary) {
            cmd = cmd.dir(cwd.as_std_path());
        }

        let handle = cmd.start().map_err(|error| ProcessRunError::ProcessLaunch {
            binary: binary.to_owned(),
            error,
        })?;
        let output = handle
            .into_output()
            .map_err(|error| ProcessRunError::ProcessOutput {
                binary: binary.to_owned(),
                error,
            })?;

        tracing::debug!(
            "`{binary} {}` exited with {}",
            test_case.name(),
            output.status,
        );
        if !output.stderr.is_empty() {
            tracing::debug!(
                "stderr of `{binary} {}`:\n{}",
                test_case.name(),
                String::from_utf8_lossy(&output.stderr),
            );
        }

        let xml = String::from_utf8(output.stdout).map_err(|error| {
            ProcessRunError::ProcessOutput {
                binary: binary.to_owned(),
                error: std::io::Error::new(std::io::ErrorKind::InvalidData, error),
            }
        })?;
        Ok(RawOutput::new(xml))
    }

    fn run_debugger(
        &self,
        test_case: &TestCaseDescriptor,
        launcher: &dyn Launcher,
    ) -> Result<RawOutput, ProcessRunError> {
        let binary = test_case.binary_path();
        let output_file = OutputFile::create()?;
        let args = escape_args([
            test_case.name(),
            "--reporter",
            "xml",
            "--break",
            "--out",
            output_file.path().as_str(),
        ]);
        let env = self.env_for("debugger");

        let pid = launcher
            .launch_debuggee(DebuggeeLaunch {
                program: binary,
                cwd: self.cwd(binary),
                args: &args,
                env: &env,
            })
            .map_err(|error| ProcessRunError::DebuggerLaunch {
                binary: binary.to_owned(),
                error,
            })?;
        let exit = launcher
            .wait_for_exit(pid)
            .map_err(|error| ProcessRunError::DebuggerWait {
                binary: binary.to_owned(),
                pid,
                error,
            })?;
        tracing::debug!(
            "debugged process {pid} (`{binary} {}`) exited with code {:?}",
            test_case.name(),
            exit.code,
        );

        let xml = std::fs::read_to_string(output_file.path()).map_err(|error| {
            ProcessRunError::OutputFileRead {
                path: output_file.path().to_owned(),
                error,
            }
        })?;
        Ok(RawOutput::new(xml))
    }
}

impl TestBinaryRunner for ProcessRunner {
    fn run(
        &self,
        test_case: &TestCaseDescriptor,
        cx: &ExecutionContext<'_>,
    ) -> Result<RawOutput, ProcessRunError> {
        match cx.launcher() {
            Some(launcher) => self.run_debugger(test_case, launcher),
            None => self.run_direct(test_case),
        }
    }
}

/// A temporary file that a debugged test binary writes its report to.
///
/// The file is deleted when this is dropped. Failures to delete it are logged.
#[derive(Debug)]
struct OutputFile {
    path: Option<Utf8TempPath>,
}

impl OutputFile {
    fn create() -> Result<Self, ProcessRunError> {
        let file = camino_tempfile::Builder::new()
            .prefix("catchtest-")
            .suffix(".xml")
            .tempfile()
            .map_err(|error| ProcessRunError::OutputFileCreate { error })?;
        // Close our handle so that the test binary can open the file for writing on all
        // platforms.
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    fn path(&self) -> &Utf8Path {
        self.path
            .as_deref()
            .expect("path is only taken on drop")
    }
}

impl Drop for OutputFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let path_buf = path.to_path_buf();
            if let Err(error) = path.close() {
                // The test binary may not have created the file, or something else removed it.
                if error.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("failed to remove temporary output file {path_buf}: {error}");
                }
            }
        }
    }
}
