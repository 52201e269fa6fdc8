// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::{collect_stats, SyncStats};

use super::Workspace;

#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    device_id: String,
    remote: Option<String>,
    #[serde(flatten)]
    stats: SyncStats,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let report = run_impl(&ws)?;
    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&report)?),
        OutputFormat::Text => print!("{}", format_text(&report)),
    }
    Ok(())
}

pub(crate) fn run_impl(ws: &Workspace) -> Result<StatusReport> {
    let stats = collect_stats(
        &ws.queue,
        &ws.config.sync.retry_policy(),
        ws.last_sync_file().read(),
    )?;
    Ok(StatusReport {
        device_id: ws.config.device_id.clone(),
        remote: ws.config.remote_url().map(String::from),
        stats,
    })
}

pub(crate) fn format_text(report: &StatusReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("Device: {}\n", report.device_id));
    out.push_str(&format!(
        "Remote: {}\n",
        report.remote.as_deref().unwrap_or("none")
    ));
    out.push_str(&format!("Pending: {}\n", report.stats.total_unsynced));
    for (kind, count) in &report.stats.pending {
        out.push_str(&format!("  {}: {}\n", kind, count));
    }
    if report.stats.parked > 0 {
        out.push_str(&format!(
            "Parked: {} (will not retry automatically)\n",
            report.stats.parked
        ));
    }
    match report.stats.last_sync {
        Some(at) => out.push_str(&format!(
            "Last sync: {}\n",
            at.format("%Y-%m-%d %H:%M:%S UTC")
        )),
        None => out.push_str("Last sync: never\n"),
    }
    out
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
