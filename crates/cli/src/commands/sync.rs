// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::sync::{
    ConnectivityMonitor, DrainOutcome, DrainReport, Probe, RemoteService, SyncEngine, SyncError,
};

use super::{acquire_run_lock, runtime, Workspace};

pub fn run(output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let _lock = acquire_run_lock(&ws.work_dir)?;
    let (remote, probe) = ws.remote()?;
    let remote = Arc::new(remote);

    let rt = runtime()?;
    let report = rt.block_on(async {
        let result = run_impl(ws, Arc::clone(&remote) as Arc<dyn RemoteService>, &probe).await;
        remote.disconnect().await;
        result
    })?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::Text => print!("{}", format_report(&report)),
    }
    Ok(())
}

/// Probe once, then drain. Offline is an error, as for any manual trigger.
pub(crate) async fn run_impl(
    ws: Workspace,
    remote: Arc<dyn RemoteService>,
    probe: &dyn Probe,
) -> Result<DrainReport> {
    let options = ws.sync_options();
    let work_dir = ws.work_dir.display().to_string();
    let monitor = ConnectivityMonitor::new(false);
    monitor.refresh(probe).await;

    let engine = SyncEngine::new(
        Arc::new(ws.queue),
        Arc::new(ws.store),
        remote,
        monitor,
        options,
    );
    match engine.sync_now().await? {
        DrainOutcome::Completed(report) => Ok(report),
        DrainOutcome::Offline => Err(Error::Sync(SyncError::Offline)),
        DrainOutcome::AlreadyRunning => Err(Error::AlreadyRunning(work_dir)),
    }
}

pub(crate) fn format_report(report: &DrainReport) -> String {
    let mut out = String::new();
    if report.attempted == 0 {
        out.push_str("Nothing to sync\n");
    } else {
        out.push_str(&format!(
            "Synced {} of {} items\n",
            report.synced, report.attempted
        ));
    }
    if report.conflicts > 0 {
        out.push_str(&format!("Resolved conflicts: {}\n", report.conflicts));
    }
    if report.waiting > 0 {
        out.push_str(&format!("Backing off: {}\n", report.waiting));
    }
    if report.parked > 0 {
        out.push_str(&format!("Parked: {}\n", report.parked));
    }
    if report.failed > 0 {
        out.push_str(&format!("Failed: {}\n", report.failed));
        for error in &report.errors {
            out.push_str(&format!("  {}\n", error));
        }
    }
    out
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
