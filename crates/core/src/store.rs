// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed durable record store.
//!
//! Records are JSON documents grouped under a collection key (one key per
//! [`ItemType`]) and kept in append order. Reads are total: an I/O or decode
//! failure is logged and treated as an empty collection, because producers
//! and the sync engine rely on being able to read at all times. Writes
//! propagate their errors.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::record::{ItemType, Record};

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
-- One row per appended record; seq preserves append order
CREATE TABLE IF NOT EXISTS records (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_key_id ON records(key, id);
"#;

/// Durable store for domain records.
pub struct RecordStore {
    conn: Mutex<Connection>,
}

impl RecordStore {
    /// Open a store at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordStore {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(RecordStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Append a record to the collection under `key`.
    ///
    /// Ids are trusted: appending a second record with an existing id keeps
    /// both, and later point operations act on the first.
    pub fn append(&self, key: &str, record: &Value) -> Result<()> {
        let id = record
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidInput("record has no string 'id' field".to_string()))?;
        let body = serde_json::to_string(record)?;

        self.conn().execute(
            "INSERT INTO records (key, id, body) VALUES (?1, ?2, ?3)",
            params![key, id, body],
        )?;
        Ok(())
    }

    /// Shallow-merge `partial` onto the first record with the given id.
    ///
    /// Returns `Ok(false)` when no record matches; nothing is written then.
    pub fn merge(&self, key: &str, id: &str, partial: &Map<String, Value>) -> Result<bool> {
        let conn = self.conn();
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT seq, body FROM records WHERE key = ?1 AND id = ?2 ORDER BY seq LIMIT 1",
                params![key, id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((seq, body)) = row else {
            return Ok(false);
        };

        let mut value: Value = serde_json::from_str(&body)?;
        let object = value.as_object_mut().ok_or_else(|| {
            Error::CorruptedData(format!("record {key}/{id} is not a JSON object"))
        })?;
        for (field, v) in partial {
            object.insert(field.clone(), v.clone());
        }

        conn.execute(
            "UPDATE records SET body = ?1 WHERE seq = ?2",
            params![serde_json::to_string(&value)?, seq],
        )?;
        Ok(true)
    }

    /// Remove every record with the given id. Returns how many were removed.
    pub fn remove(&self, key: &str, id: &str) -> Result<usize> {
        let removed = self.conn().execute(
            "DELETE FROM records WHERE key = ?1 AND id = ?2",
            params![key, id],
        )?;
        Ok(removed)
    }

    /// Read the full collection under `key`, in append order.
    ///
    /// Never fails: a key that was never written, or a store that cannot be
    /// read, yields an empty collection.
    pub fn read_all(&self, key: &str) -> Vec<Value> {
        match self.try_read_all(key) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!("failed to read records under '{}': {}", key, e);
                Vec::new()
            }
        }
    }

    fn try_read_all(&self, key: &str) -> Result<Vec<Value>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT body FROM records WHERE key = ?1 ORDER BY seq")?;
        let bodies = stmt
            .query_map(params![key], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut records = Vec::with_capacity(bodies.len());
        for body in bodies {
            records.push(serde_json::from_str(&body)?);
        }
        Ok(records)
    }

    /// Append a typed record to its collection.
    pub fn insert<R: Record>(&self, record: &R) -> Result<()> {
        self.append(R::TYPE.store_key(), &serde_json::to_value(record)?)
    }

    /// Merge `partial` onto a typed record and return the merged result.
    ///
    /// Returns `Ok(None)` when no record has the given id.
    pub fn update<R: Record>(&self, id: &str, partial: &Map<String, Value>) -> Result<Option<R>> {
        if !self.merge(R::TYPE.store_key(), id, partial)? {
            return Ok(None);
        }
        Ok(self.get::<R>(id))
    }

    /// Remove a typed record, returning the first removed copy.
    pub fn delete<R: Record>(&self, id: &str) -> Result<Option<R>> {
        let existing = self.get::<R>(id);
        self.remove(R::TYPE.store_key(), id)?;
        Ok(existing)
    }

    /// Get the first record with the given id.
    pub fn get<R: Record>(&self, id: &str) -> Option<R> {
        self.all::<R>().into_iter().find(|r| r.id() == id)
    }

    /// All records of a type. Records that no longer decode are skipped.
    pub fn all<R: Record>(&self) -> Vec<R> {
        let key = R::TYPE.store_key();
        self.read_all(key)
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<R>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    tracing::warn!("skipping undecodable record under '{}': {}", key, e);
                    None
                }
            })
            .collect()
    }

    /// Records of a type whose latest state has not been pushed yet.
    pub fn unsynced<R: Record>(&self) -> Vec<R> {
        self.all::<R>()
            .into_iter()
            .filter(|r| r.is_unsynced())
            .collect()
    }

    /// Flip the `synced` flag of a record after a successful replay.
    ///
    /// Returns `Ok(false)` if the record is gone (for example after a delete).
    pub fn mark_synced(&self, item_type: ItemType, id: &str) -> Result<bool> {
        let mut partial = Map::new();
        partial.insert("synced".to_string(), Value::Bool(true));
        self.merge(item_type.store_key(), id, &partial)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
