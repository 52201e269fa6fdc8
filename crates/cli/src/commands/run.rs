// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Long-running sync: the only process that drains while it is up.
//!
//! Holds the run lock for its whole life, polls reachability, drains on
//! every offline-to-online transition, and sweeps for items whose backoff
//! has elapsed. Logs go to `.tripsync/tripsync.log`.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::{find_work_dir, get_log_path};
use crate::error::Result;
use crate::sync::{
    spawn_probe_loop, ConnectivityMonitor, Probe, RemoteService, SyncEngine, SyncStatus,
};

use super::{acquire_run_lock, runtime, Workspace};

pub fn run() -> Result<()> {
    let work_dir = find_work_dir()?;
    let lock_file = acquire_run_lock(&work_dir)?;
    crate::setup_file_logging(&get_log_path(&work_dir));

    let ws = Workspace::open_at(&work_dir)?;
    let (remote, probe) = ws.remote()?;
    tracing::info!(
        device = %ws.config.device_id,
        remote = %remote.url(),
        "tripsync run starting"
    );
    println!("Syncing {} (Ctrl-C to stop)", remote.url());

    let remote = Arc::new(remote);
    let rt = runtime()?;
    let result = rt.block_on(async {
        let shutdown = CancellationToken::new();
        let on_signal = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("interrupted, shutting down"),
                Err(e) => tracing::error!("failed to listen for Ctrl-C: {}", e),
            }
            on_signal.cancel();
        });

        let result = run_impl(
            ws,
            Arc::clone(&remote) as Arc<dyn RemoteService>,
            Arc::new(probe),
            shutdown,
        )
        .await;
        remote.disconnect().await;
        result
    });

    drop(lock_file);
    result
}

/// Run until `shutdown` is cancelled.
pub(crate) async fn run_impl(
    ws: Workspace,
    remote: Arc<dyn RemoteService>,
    probe: Arc<dyn Probe>,
    shutdown: CancellationToken,
) -> Result<()> {
    let interval = ws.config.sync.probe_interval();
    let options = ws.sync_options();

    let monitor = ConnectivityMonitor::new(false);
    monitor.refresh(probe.as_ref()).await;

    let engine = SyncEngine::new(
        Arc::new(ws.queue),
        Arc::new(ws.store),
        remote,
        Arc::clone(&monitor),
        options,
    );
    let _status_log = engine.subscribe(log_status);
    let watch = Arc::clone(&engine).watch_connectivity();
    let probe_task = spawn_probe_loop(Arc::clone(&monitor), probe, interval, shutdown.clone());

    // Already online: no transition will fire
    if monitor.is_online() {
        if let Err(e) = engine.drain().await {
            tracing::warn!("initial sync failed: {}", e);
        }
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(interval) => sweep(&engine).await,
        }
    }

    watch.stop().await;
    let _ = probe_task.await;
    tracing::info!("tripsync run stopped");
    Ok(())
}

/// Pick up items other processes queued, then drain again if some
/// unsynced item could be replayed.
async fn sweep(engine: &SyncEngine) {
    if !engine.monitor().is_online() {
        if let Err(e) = engine.refresh_unsynced() {
            tracing::warn!("failed to count unsynced items: {}", e);
        }
        return;
    }
    // Stats also publish the fresh count
    let retryable = match engine.stats() {
        Ok(stats) => stats.total_unsynced > stats.parked,
        Err(e) => {
            tracing::warn!("failed to read queue stats: {}", e);
            false
        }
    };
    if retryable {
        if let Err(e) = engine.drain().await {
            tracing::warn!("retry sweep failed: {}", e);
        }
    }
}

fn log_status(status: &SyncStatus) {
    match &status.current_item {
        Some(item) => tracing::debug!(progress = status.progress, "syncing {}", item),
        None if !status.is_syncing => tracing::debug!(
            online = status.is_online,
            pending = status.total_unsynced,
            "sync idle"
        ),
        None => {}
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
