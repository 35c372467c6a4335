// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::os::unix::process::CommandExt;

/// Puts the child in a new process group, so that a terminal Ctrl-C reaches only catchtest.
pub(super) fn set_process_group(cmd: &mut std::process::Command) {
    cmd.process_group(0);
}
