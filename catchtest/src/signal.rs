// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ctrl-C handling.

use catchtest_runner::executor::{CancellationToken, ExecutorCancelHandle};
use std::sync::atomic::{AtomicBool, Ordering};

/// Installs a handler for SIGINT and SIGTERM that cancels the test run.
///
/// The test case that is currently running is allowed to finish. Can only be called once per
/// process.
pub(crate) fn install_handler(
    handle: ExecutorCancelHandle,
    token: CancellationToken,
) -> Result<(), ctrlc::Error> {
    let notified = AtomicBool::new(false);
    ctrlc::set_handler(move || {
        // The token covers a signal that arrives before the run has started.
        token.cancel();
        handle.cancel();
        if !notified.swap(true, Ordering::Relaxed) {
            tracing::warn!("cancelling test run, waiting for the running test to finish");
        }
    })
}
