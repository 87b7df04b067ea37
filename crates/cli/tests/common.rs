// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The `tidings` binary with a config file inside `dir` and no ambient
/// credentials.
pub fn tidings(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("tidings");
    cmd.arg("--config")
        .arg(dir.path().join("config.toml"))
        .env_remove("TIDINGS_USER")
        .env_remove("TIDINGS_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}
