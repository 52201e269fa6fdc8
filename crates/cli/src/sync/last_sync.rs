// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence of the last completed drain time.
//!
//! The engine keeps `last_sync` in memory; this file lets a new process
//! (a later `tripsync status`, or a restarted `tripsync run`) report it.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;

/// File-backed `last_sync` instant.
#[derive(Debug, Clone)]
pub struct LastSyncFile {
    path: PathBuf,
}

impl LastSyncFile {
    /// Filename inside the `.tripsync/` directory.
    pub const FILE_NAME: &'static str = "last_sync.txt";

    /// Persistence for `last_sync.txt` in the given directory.
    pub fn in_dir(work_dir: &Path) -> Self {
        LastSyncFile {
            path: work_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the instant, returns None if the file doesn't exist or is invalid.
    pub fn read(&self) -> Option<DateTime<Utc>> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        DateTime::parse_from_rfc3339(content.trim())
            .ok()
            .map(|at| at.with_timezone(&Utc))
    }

    /// Write the instant to disk with fsync for durability.
    pub fn write(&self, at: DateTime<Utc>) -> Result<()> {
        use std::io::Write;
        let mut file = std::fs::File::create(&self.path)?;
        write!(file, "{}", at.to_rfc3339_opts(SecondsFormat::Millis, true))?;
        file.sync_all()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "last_sync_tests.rs"]
mod tests;
