// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

//! Tests for the public `run()` function.
//!
//! Commands that sync need a server and are covered by the command tests
//! against mock collaborators. Here we check the routing that needs none.

use super::*;
use tempfile::TempDir;

fn global_in(dir: &TempDir) -> GlobalArgs {
    GlobalArgs {
        config: Some(dir.path().join("config.toml")),
        ..GlobalArgs::default()
    }
}

#[test]
fn init_runs_without_runtime_or_user() {
    let dir = TempDir::new().unwrap();
    let mut global = global_in(&dir);
    global.base_url = Some("http://localhost:3000/api".to_string());

    run(Cli {
        global,
        command: Command::Init { force: false },
    })
    .unwrap();

    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn sync_commands_require_user() {
    let dir = TempDir::new().unwrap();
    let mut global = global_in(&dir);
    global.base_url = Some("http://localhost:3000/api".to_string());

    let err = run(Cli {
        global,
        command: Command::ReadAll,
    })
    .unwrap_err();

    assert!(matches!(err, Error::UserRequired));
}

#[test]
fn sync_commands_require_config() {
    let dir = TempDir::new().unwrap();
    let mut global = global_in(&dir);
    global.user = Some("alice".to_string());

    let err = run(Cli {
        global,
        command: Command::List {
            page: 1,
            unread: false,
            kind: None,
            output: OutputFormat::Text,
        },
    })
    .unwrap_err();

    assert!(matches!(err, Error::ConfigNotFound(_)));
}
