// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod init;
pub mod queue;
pub mod record;
pub mod run;
pub mod status;
pub mod sync;

#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tsync_core::{RecordStore, SyncQueue};

use crate::config::{find_work_dir, get_db_path, get_queue_path, get_run_lock_path, Config};
use crate::error::{Error, Result};
use crate::sync::{LastSyncFile, SyncOptions, TcpProbe, WebSocketRemote};

/// Everything a command needs from an initialized `.tripsync/` directory.
pub struct Workspace {
    pub work_dir: PathBuf,
    pub config: Config,
    pub store: RecordStore,
    pub queue: SyncQueue,
}

impl Workspace {
    /// Open the workspace found by walking up from the current directory.
    pub fn open() -> Result<Self> {
        let work_dir = find_work_dir()?;
        Self::open_at(&work_dir)
    }

    /// Open the workspace at an explicit `.tripsync/` directory.
    pub fn open_at(work_dir: &Path) -> Result<Self> {
        let config = Config::load(work_dir)?;
        let store = RecordStore::open(&get_db_path(work_dir))?;
        let queue = SyncQueue::open(&get_queue_path(work_dir))?;
        Ok(Workspace {
            work_dir: work_dir.to_path_buf(),
            config,
            store,
            queue,
        })
    }

    pub fn last_sync_file(&self) -> LastSyncFile {
        LastSyncFile::in_dir(&self.work_dir)
    }

    /// Engine options from the `[sync]` config section.
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            retry: self.config.sync.retry_policy(),
            item_timeout: self.config.sync.item_timeout(),
            last_sync: Some(self.last_sync_file()),
            ..SyncOptions::default()
        }
    }

    /// The configured remote and a reachability probe for its host.
    pub fn remote(&self) -> Result<(WebSocketRemote, TcpProbe)> {
        let remote = self.config.remote.as_ref().ok_or(Error::NoRemote)?;
        let timeout: Duration = remote.connect_timeout();
        let probe = TcpProbe::for_url(&remote.url, timeout)
            .ok_or_else(|| Error::Config(format!("invalid remote URL '{}'", remote.url)))?;
        Ok((WebSocketRemote::new(remote.url.clone(), timeout), probe))
    }
}

/// Acquire the single-drainer lock for this workspace.
///
/// Held by `tripsync run` for its whole life and by `tripsync sync` for one
/// drain, so two processes never replay the same ledger at once.
pub fn acquire_run_lock(work_dir: &Path) -> Result<File> {
    use fs2::FileExt;

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(get_run_lock_path(work_dir))?;

    file.try_lock_exclusive()
        .map_err(|_| Error::AlreadyRunning(work_dir.display().to_string()))?;

    Ok(file)
}

/// Build a tokio runtime for commands that talk to the remote.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Error::Io(std::io::Error::other(format!("tokio: {}", e))))
}
