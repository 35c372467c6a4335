// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Human-readable output for test runs.

use catchtest_runner::{
    executor::RunStats, list::TestCaseDescriptor, parse::TestOutcome, reporter::TestResult,
};
use owo_colors::{OwoColorize, Style, style};
use std::{
    io::{self, Write},
    time::Duration,
};
use swrite::{SWrite, swrite};

/// Width of the status column, matching the longest status.
const STATUS_WIDTH: usize = 12;

/// Writes one status line per test case, followed by a summary.
#[derive(Debug)]
pub(crate) struct TestDisplayer<W> {
    writer: W,
    styles: Styles,
    show_start: bool,
}

impl<W: Write> TestDisplayer<W> {
    pub(crate) fn new(writer: W, show_start: bool) -> Self {
        Self {
            writer,
            styles: Styles::default(),
            show_start,
        }
    }

    pub(crate) fn colorize(&mut self) {
        self.styles.colorize();
    }

    pub(crate) fn write_run_start(
        &mut self,
        test_count: usize,
        binary_count: usize,
    ) -> io::Result<()> {
        writeln!(
            self.writer,
            "{:>STATUS_WIDTH$} {} {} across {} {}",
            "Starting".style(self.styles.pass),
            test_count.style(self.styles.count),
            plural(test_count, "test", "tests"),
            binary_count.style(self.styles.count),
            plural(binary_count, "binary", "binaries"),
        )
    }

    pub(crate) fn write_test_start(&mut self, test_case: &TestCaseDescriptor) -> io::Result<()> {
        if !self.show_start {
            return Ok(());
        }
        writeln!(
            self.writer,
            "{:>STATUS_WIDTH$} {:>11} {}",
            "START".style(self.styles.pass),
            "",
            self.test_name(test_case),
        )
    }

    pub(crate) fn write_result(&mut self, result: &TestResult) -> io::Result<()> {
        let (status, status_style) = match result.outcome() {
            TestOutcome::Passed => ("PASS", self.styles.pass),
            TestOutcome::Failed => ("FAIL", self.styles.fail),
            TestOutcome::Unknown => ("UNKNOWN", self.styles.unknown),
        };
        writeln!(
            self.writer,
            "{:>STATUS_WIDTH$} [{:>8.3}s] {}",
            status.style(status_style),
            result.duration.as_secs_f64(),
            self.test_name(&result.test_case),
        )?;

        let indent = " ".repeat(STATUS_WIDTH + 1);
        if let Some(location) = &result.result.failure_location {
            writeln!(
                self.writer,
                "{indent}at {}",
                location.style(self.styles.location)
            )?;
        }
        if let Some(message) = result.result.error_message.as_deref() {
            for line in message.lines() {
                writeln!(self.writer, "{indent}{line}")?;
            }
        }
        Ok(())
    }

    pub(crate) fn write_summary(&mut self, stats: &RunStats, elapsed: Duration) -> io::Result<()> {
        let mut summary = String::new();
        swrite!(
            summary,
            "{:>STATUS_WIDTH$} [{:>8.3}s] ",
            "Summary".style(self.styles.pass),
            elapsed.as_secs_f64(),
        );
        swrite!(summary, "{}", stats.final_run_count.style(self.styles.count));
        if stats.final_run_count != stats.initial_run_count {
            swrite!(summary, "/{}", stats.initial_run_count.style(self.styles.count));
        }
        swrite!(
            summary,
            " {} run: {} passed",
            plural(stats.initial_run_count, "test", "tests"),
            stats.passed.style(self.styles.pass),
        );
        if stats.failed > 0 {
            swrite!(summary, ", {} failed", stats.failed.style(self.styles.fail));
        }
        if stats.unknown > 0 {
            swrite!(summary, ", {} unknown", stats.unknown.style(self.styles.unknown));
        }

        writeln!(self.writer, "{}", "-".repeat(STATUS_WIDTH))?;
        writeln!(self.writer, "{summary}")?;
        self.writer.flush()
    }

    fn test_name(&self, test_case: &TestCaseDescriptor) -> String {
        let binary_path = test_case.binary_path();
        let binary = binary_path.file_name().unwrap_or(binary_path.as_str());
        format!(
            "{} {}",
            binary.style(self.styles.binary),
            test_case.name().style(self.styles.name),
        )
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> W {
        self.writer
    }
}

fn plural(count: usize, singular: &'static str, plural: &'static str) -> &'static str {
    if count == 1 { singular } else { plural }
}

#[derive(Debug, Default)]
struct Styles {
    count: Style,
    pass: Style,
    fail: Style,
    unknown: Style,
    binary: Style,
    name: Style,
    location: Style,
}

impl Styles {
    fn colorize(&mut self) {
        self.count = style().bold();
        self.pass = style().green().bold();
        self.fail = style().red().bold();
        self.unknown = style().magenta().bold();
        self.binary = style().magenta();
        self.name = style().blue().bold();
        self.location = style().bold();
    }
}
