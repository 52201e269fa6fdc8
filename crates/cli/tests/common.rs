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

/// A remote nothing listens on.
pub const UNREACHABLE_REMOTE: &str = "ws://127.0.0.1:9";

pub fn tripsync() -> Command {
    let mut cmd = cargo_bin_cmd!("tripsync");
    cmd.env_remove("RUST_LOG");
    cmd
}

/// Helper to create an initialized temp directory (local-only)
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    tripsync()
        .arg("init")
        .arg("--device")
        .arg("tablet-test")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create an initialized temp directory with an unreachable remote
pub fn init_temp_with_remote() -> TempDir {
    let temp = TempDir::new().unwrap();
    tripsync()
        .arg("init")
        .arg("--device")
        .arg("tablet-test")
        .arg("--remote")
        .arg(UNREACHABLE_REMOTE)
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to add a record and return stdout
pub fn add_record(temp: &TempDir, kind: &str, json: &str) -> String {
    let output = tripsync()
        .args(["record", "add", kind, json])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "record add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}
