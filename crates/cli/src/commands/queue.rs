// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tsync_core::{SyncQueue, SyncQueueItem};

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::sync::RetryPolicy;

use super::Workspace;

pub fn run(all: bool, output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let items = run_impl(&ws.queue, all)?;
    let retry = ws.config.sync.retry_policy();

    match output {
        OutputFormat::Json => {
            for item in &items {
                println!("{}", serde_json::to_string(item)?);
            }
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("Queue is empty");
            }
            for item in &items {
                println!("{}", format_item(item, &retry));
            }
        }
    }
    Ok(())
}

/// Ledger items in ledger order; unsynced only unless `all`.
pub(crate) fn run_impl(queue: &SyncQueue, all: bool) -> Result<Vec<SyncQueueItem>> {
    let items = if all {
        queue.list_all()?
    } else {
        queue.list_unsynced()?
    };
    Ok(items)
}

/// One line per item: id, label, record, recorded-at, then state.
pub(crate) fn format_item(item: &SyncQueueItem, retry: &RetryPolicy) -> String {
    let mut line = format!(
        "{}  {} {}  {}",
        item.id,
        item.label(),
        item.payload.record_id(),
        item.timestamp.format("%Y-%m-%d %H:%M:%S")
    );
    if item.synced {
        line.push_str("  [synced]");
    } else if retry.is_parked(item) {
        line.push_str(&format!("  [parked after {} attempts]", item.sync_attempts));
    } else if item.sync_attempts > 0 {
        line.push_str(&format!("  [attempts: {}]", item.sync_attempts));
    }
    if let Some(error) = &item.error {
        line.push_str(&format!("\n    last error: {}", error));
    }
    line
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
