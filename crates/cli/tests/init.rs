// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use yare::parameterized;

#[test]
fn creates_work_dir() {
    let temp = TempDir::new().unwrap();

    tripsync()
        .arg("init")
        .arg("--device")
        .arg("tablet-07")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized tripsync"))
        .stdout(predicate::str::contains("Device: tablet-07"))
        .stdout(predicate::str::contains("Remote: none"));

    assert!(temp.path().join(".tripsync/config.toml").exists());
    assert!(temp.path().join(".tripsync/records.db").exists());
    assert!(temp.path().join(".tripsync/sync_queue.jsonl").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    tripsync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn records_remote_in_config() {
    let temp = init_temp_with_remote();

    let config = std::fs::read_to_string(temp.path().join(".tripsync/config.toml")).unwrap();
    assert!(config.contains("device_id = \"tablet-test\""));
    assert!(config.contains(UNREACHABLE_REMOTE));
}

#[test]
fn init_with_path() {
    let temp = TempDir::new().unwrap();
    let target = temp.path().join("bus-7");
    std::fs::create_dir(&target).unwrap();

    tripsync()
        .arg("init")
        .arg("--path")
        .arg(&target)
        .current_dir(temp.path())
        .assert()
        .success();

    assert!(target.join(".tripsync/config.toml").exists());
}

#[parameterized(
    http = { "http://dispatch" },
    bare = { "dispatch:7890" },
    no_host = { "ws://" },
)]
fn rejects_bad_remote(url: &str) {
    let temp = TempDir::new().unwrap();

    tripsync()
        .args(["init", "--remote", url])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid remote URL"));

    assert!(!temp.path().join(".tripsync").exists());
}

#[test]
fn commands_require_init() {
    let temp = TempDir::new().unwrap();

    tripsync()
        .arg("status")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not initialized"));
}
