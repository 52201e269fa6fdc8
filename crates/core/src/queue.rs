// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue: the durable ledger of pending mutations.
//!
//! Uses JSONL format for durability - each item is a single line, appends
//! are fsynced immediately, and point updates rewrite the ledger atomically.
//! The ledger is independent of the record store, so the sync engine only
//! needs the item type to dispatch a replay.
//!
//! Every operation holds the ledger lock for its own duration only: an
//! in-process mutex plus an exclusive advisory lock on a sibling `.lock`
//! file, so producers in other processes can enqueue while a drain runs.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use fs2::FileExt;

use crate::error::{Error, Result};
use crate::item::SyncQueueItem;
use crate::jsonl;
use crate::record::ItemType;

/// Durable, ordered ledger of sync queue items.
pub struct SyncQueue {
    /// Path to the ledger file.
    path: PathBuf,
    /// Path to the advisory lock file.
    lock_path: PathBuf,
    guard: Mutex<()>,
}

impl SyncQueue {
    /// Create or open a ledger at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        // Ensure the file exists (create if not)
        OpenOptions::new().create(true).append(true).open(path)?;

        Ok(SyncQueue {
            path: path.to_path_buf(),
            lock_path: path.with_extension("lock"),
            guard: Mutex::new(()),
        })
    }

    /// Path to the ledger file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn locked<T>(&self, f: impl FnOnce(&Path) -> Result<T>) -> Result<T> {
        let _guard = self.guard.lock().unwrap_or_else(|e| e.into_inner());
        let lock_file = self.acquire_file_lock()?;
        let result = f(&self.path);
        drop(lock_file);
        result
    }

    fn acquire_file_lock(&self) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive().map_err(|source| Error::Lock {
            path: self.lock_path.display().to_string(),
            source,
        })?;
        Ok(file)
    }

    /// Read, modify and rewrite the whole ledger under the lock.
    fn rewrite<T>(&self, f: impl FnOnce(&mut Vec<SyncQueueItem>) -> T) -> Result<T> {
        self.locked(|path| {
            let mut items: Vec<SyncQueueItem> = jsonl::read_all(path)?;
            let result = f(&mut items);
            jsonl::write_all(path, &items)?;
            Ok(result)
        })
    }

    /// Append a fully populated item.
    ///
    /// The item is immediately persisted to disk.
    pub fn enqueue(&self, item: &SyncQueueItem) -> Result<()> {
        self.locked(|path| jsonl::append(path, item))
    }

    /// The full ledger, synced items included, in storage order.
    pub fn list_all(&self) -> Result<Vec<SyncQueueItem>> {
        self.locked(|path| jsonl::read_all(path))
    }

    /// Items that still need a successful replay, in storage order.
    pub fn list_unsynced(&self) -> Result<Vec<SyncQueueItem>> {
        Ok(self
            .list_all()?
            .into_iter()
            .filter(|item| !item.synced)
            .collect())
    }

    /// Record a failed replay without flipping `synced`.
    ///
    /// The stored attempt count never decreases. Returns `Ok(false)` if no
    /// item has the given id.
    pub fn mark_attempt(
        &self,
        id: &str,
        attempts: u32,
        last_attempt: DateTime<Utc>,
        error: Option<&str>,
    ) -> Result<bool> {
        self.rewrite(|items| match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.sync_attempts = item.sync_attempts.max(attempts);
                item.last_sync_attempt = Some(last_attempt);
                item.error = error.map(str::to_string);
                true
            }
            None => false,
        })
    }

    /// Flip `synced` for one item. Returns `Ok(false)` if no item has the id.
    pub fn mark_synced(&self, id: &str, last_attempt: DateTime<Utc>) -> Result<bool> {
        self.rewrite(|items| match items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.synced = true;
                item.last_sync_attempt = Some(last_attempt);
                item.error = None;
                true
            }
            None => false,
        })
    }

    /// Hard-delete one item. Returns `Ok(false)` if no item has the id.
    pub fn remove(&self, id: &str) -> Result<bool> {
        self.rewrite(|items| {
            let before = items.len();
            items.retain(|item| item.id != id);
            items.len() != before
        })
    }

    /// Drop every synced item and keep the rest. Returns how many were dropped.
    ///
    /// Call this after a drain, never while iterating a snapshot of the ledger.
    pub fn compact(&self) -> Result<usize> {
        self.rewrite(|items| {
            let before = items.len();
            items.retain(|item| !item.synced);
            before - items.len()
        })
    }

    /// Number of unsynced items.
    pub fn unsynced_count(&self) -> Result<usize> {
        Ok(self.list_unsynced()?.len())
    }

    /// Whether an unsynced item for this record is still in the ledger.
    pub fn has_unsynced(&self, item_type: ItemType, record_id: &str) -> Result<bool> {
        Ok(self.list_unsynced()?.iter().any(|item| {
            item.item_type() == item_type && item.payload.record_id() == record_id
        }))
    }

    /// Number of unsynced items per type. Types with none are omitted.
    pub fn unsynced_counts(&self) -> Result<BTreeMap<ItemType, usize>> {
        let mut counts = BTreeMap::new();
        for item in self.list_unsynced()? {
            *counts.entry(item.item_type()).or_insert(0) += 1;
        }
        Ok(counts)
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
