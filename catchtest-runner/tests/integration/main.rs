// Copyright (c) The nextest Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

// The fixtures are shell scripts.
#![cfg(unix)]

mod basic;
mod debugger;
mod fixtures;
