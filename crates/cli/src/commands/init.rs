// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use tsync_core::{RecordStore, SyncQueue};

use crate::config::{get_db_path, get_queue_path, init_work_dir, Config};
use crate::error::Result;

pub fn run(device: String, remote: Option<String>, path: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };
    let work_dir = run_impl(&target_path, device, remote.as_deref())?;

    let config = Config::load(&work_dir)?;
    println!("Initialized tripsync at {}", work_dir.display());
    println!("Device: {}", config.device_id);
    match config.remote_url() {
        Some(url) => println!("Remote: {}", url),
        None => println!("Remote: none (mutations stay queued until one is configured)"),
    }
    Ok(())
}

/// Create `.tripsync/` under `target_path` with its config and data files.
pub(crate) fn run_impl(
    target_path: &Path,
    device: String,
    remote: Option<&str>,
) -> Result<PathBuf> {
    let mut config = Config::new(device)?;
    if let Some(url) = remote {
        config = config.with_remote(url)?;
    }

    let work_dir = init_work_dir(target_path, &config)?;

    // Data files exist from init on
    RecordStore::open(&get_db_path(&work_dir))?;
    SyncQueue::open(&get_queue_path(&work_dir))?;

    Ok(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
