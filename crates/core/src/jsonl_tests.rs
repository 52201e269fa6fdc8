// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Line {
    id: u32,
    name: String,
}

fn line(id: u32, name: &str) -> Line {
    Line {
        id,
        name: name.into(),
    }
}

#[test]
fn append_creates_file_if_missing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    append(&path, &line(1, "first")).unwrap();

    assert!(path.exists());
}

#[test]
fn read_all_returns_empty_for_missing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing.jsonl");

    let records: Vec<Line> = read_all(&path).unwrap();
    assert!(records.is_empty());
}

#[test]
fn appended_lines_read_back_in_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    append(&path, &line(2, "second")).unwrap();
    append(&path, &line(1, "first")).unwrap();

    let records: Vec<Line> = read_all(&path).unwrap();
    assert_eq!(records, vec![line(2, "second"), line(1, "first")]);
}

#[test]
fn read_all_skips_blank_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    std::fs::write(
        &path,
        "{\"id\":1,\"name\":\"a\"}\n\n   \n{\"id\":2,\"name\":\"b\"}\n",
    )
    .unwrap();

    let records: Vec<Line> = read_all(&path).unwrap();
    assert_eq!(records.len(), 2);
}

#[test]
fn read_all_reports_corrupt_line_number() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    std::fs::write(&path, "{\"id\":1,\"name\":\"a\"}\nnot json\n").unwrap();

    let err = read_all::<Line>(&path).unwrap_err();
    assert!(matches!(err, Error::CorruptedData(_)));
    assert!(err.to_string().contains(":2:"));
}

#[test]
fn write_all_replaces_content() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    append(&path, &line(1, "first")).unwrap();
    write_all(&path, &[line(2, "replaced")]).unwrap();

    let records: Vec<Line> = read_all(&path).unwrap();
    assert_eq!(records, vec![line(2, "replaced")]);
    assert!(!dir.path().join("ledger.jsonl.tmp").exists());
}

#[test]
fn write_all_with_no_records_empties_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("ledger.jsonl");

    append(&path, &line(1, "first")).unwrap();
    write_all::<Line>(&path, &[]).unwrap();

    let records: Vec<Line> = read_all(&path).unwrap();
    assert!(records.is_empty());
}
