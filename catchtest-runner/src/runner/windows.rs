// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

pub(super) fn set_process_group(_cmd: &mut std::process::Command) {
    // Children stay attached to the console and see Ctrl-C along with catchtest.
}
