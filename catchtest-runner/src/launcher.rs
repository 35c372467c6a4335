// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Launching test binaries with a debugger attached.
//!
//! How a debugger gets attached is up to the host: an IDE might start the process suspended and
//! attach its own debugger, while the command-line runner wraps the test binary in a debugger
//! command such as `gdb --args`. The [`Launcher`] trait abstracts over the two.

use crate::errors::{DebuggerCommandParseError, DebuggerLaunchError};
use camino::Utf8Path;
use serde::Deserialize;
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    process::{Child, Command},
    str::FromStr,
    sync::{Mutex, PoisonError},
};

/// An identifier for a process started by a [`Launcher`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A request to start a process with a debugger attached.
#[derive(Clone, Copy, Debug)]
pub struct DebuggeeLaunch<'a> {
    /// The test binary.
    pub program: &'a Utf8Path,

    /// The working directory, or `None` to inherit the current directory.
    pub cwd: Option<&'a Utf8Path>,

    /// The arguments to the test binary, escaped into a single string with
    /// [`escape_args`](crate::args::escape_args).
    pub args: &'a str,

    /// Environment variables to set in addition to the inherited environment.
    pub env: &'a BTreeMap<String, String>,
}

/// Information about how a debugged process exited.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ExitInfo {
    /// The exit code, or `None` if the process was terminated by a signal or the exit code is
    /// not known to the launcher.
    pub code: Option<i32>,
}

/// A debugger-launch primitive provided by the host.
///
/// Implementations must be usable from the thread running the executor.
pub trait Launcher: Send + Sync {
    /// Starts a process with a debugger attached, returning an identifier to wait on.
    fn launch_debuggee(&self, launch: DebuggeeLaunch<'_>)
    -> Result<ProcessId, DebuggerLaunchError>;

    /// Blocks until the process started by [`Self::launch_debuggee`] exits.
    fn wait_for_exit(&self, pid: ProcessId) -> std::io::Result<ExitInfo>;
}

/// A debugger command, for example `gdb --args` or `lldb --`.
///
/// The test binary and its arguments are appended to this command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebuggerCommand {
    program: String,
    args: Vec<String>,
}

impl DebuggerCommand {
    /// Creates a new debugger command from a program and arguments.
    pub fn new(
        program: impl Into<String>,
        args: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the debugger program.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments passed to the debugger before the test binary.
    pub fn args(&self) -> &[String] {
        &self.args
    }
}

impl FromStr for DebuggerCommand {
    type Err = DebuggerCommandParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = shell_words::split(s)
            .map_err(|error| DebuggerCommandParseError::ShellWords {
                input: s.to_owned(),
                error,
            })?
            .into_iter();
        let program = words.next().ok_or(DebuggerCommandParseError::Empty)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }
}

impl fmt::Display for DebuggerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let words = std::iter::once(&self.program).chain(&self.args);
        write!(f, "{}", shell_words::join(words))
    }
}

impl<'de> Deserialize<'de> for DebuggerCommand {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A [`Launcher`] that runs test binaries under a [`DebuggerCommand`].
///
/// The debugger inherits standard input, output and error so that it can be driven
/// interactively.
#[derive(Debug)]
pub struct DebuggerCommandLauncher {
    command: DebuggerCommand,
    children: Mutex<HashMap<ProcessId, Child>>,
}

impl DebuggerCommandLauncher {
    /// Creates a new launcher for the given debugger command.
    pub fn new(command: DebuggerCommand) -> Self {
        Self {
            command,
            children: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the debugger command.
    pub fn command(&self) -> &DebuggerCommand {
        &self.command
    }
}

impl Launcher for DebuggerCommandLauncher {
    fn launch_debuggee(
        &self,
        launch: DebuggeeLaunch<'_>,
    ) -> Result<ProcessId, DebuggerLaunchError> {
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args).arg(launch.program);
        push_escaped_args(&mut cmd, launch.args);
        if let Some(cwd) = launch.cwd {
            cmd.current_dir(cwd);
        }
        cmd.envs(launch.env);

        tracing::info!(
            "executing debugger command: {} {}",
            shell_words::join(
                std::iter::once(self.command.program.as_str())
                    .chain(self.command.args.iter().map(String::as_str))
                    .chain(std::iter::once(launch.program.as_str())),
            ),
            launch.args,
        );

        let child = cmd.spawn().map_err(|error| DebuggerLaunchError::Spawn {
            program: self.command.program.clone(),
            error,
        })?;
        let pid = ProcessId(child.id());
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(pid, child);
        Ok(pid)
    }

    fn wait_for_exit(&self, pid: ProcessId) -> std::io::Result<ExitInfo> {
        let child = self
            .children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&pid);
        let Some(mut child) = child else {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("process {pid} was not started by this launcher"),
            ));
        };
        let status = child.wait()?;
        Ok(ExitInfo {
            code: status.code(),
        })
    }
}

fn push_escaped_args(cmd: &mut Command, escaped: &str) {
    cfg_if::cfg_if! {
        if #[cfg(windows)] {
            // The string is already escaped for the Windows argument parser.
            use std::os::windows::process::CommandExt;
            if !escaped.is_empty() {
                cmd.raw_arg(escaped);
            }
        } else {
            cmd.args(crate::args::split_args(escaped));
        }
    }
}
