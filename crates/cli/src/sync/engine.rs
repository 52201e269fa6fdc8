// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The sync engine: drains the sync queue against the remote service.
//!
//! The engine is `Idle` or `Draining`; `is_syncing` in the published status
//! mirrors which. A drain:
//!
//! 1. returns at once if another drain runs or the device is offline
//! 2. publishes the start (`errors` cleared, `progress` 0)
//! 3. snapshots the unsynced, due items and sorts them by `timestamp`
//! 4. replays them one at a time, each under a timeout; a failure is
//!    recorded on the item and the drain moves on
//! 5. compacts the ledger and publishes the end with `last_sync` set
//!
//! A failure outside the per-item scope (the ledger cannot be read or
//! written) ends the drain early with a single `sync failed: ...` entry,
//! no compaction, and `last_sync` unchanged.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tsync_core::{
    Action, ClockSource, ItemType, Payload, RecordStore, SyncQueue, SyncQueueItem, SystemClock,
};

use super::connectivity::ConnectivityMonitor;
use super::last_sync::LastSyncFile;
use super::remote::{RemoteError, RemoteService};
use super::resolve;
use super::retry::{Eligibility, RetryPolicy};
use super::status::{StatusHub, Subscription, SyncStatus};

/// Error type for sync engine operations.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The manual trigger found the device offline.
    #[error("offline: the remote service is not reachable")]
    Offline,

    /// The ledger could not be read or written.
    #[error("queue error: {0}")]
    Queue(#[from] tsync_core::Error),
}

/// Result type for sync engine operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Tunables for a [`SyncEngine`].
#[derive(Clone)]
pub struct SyncOptions {
    pub retry: RetryPolicy,
    /// Upper bound for one replay, conflict lookups included.
    pub item_timeout: Duration,
    /// Where `last_sync` is persisted, if anywhere.
    pub last_sync: Option<LastSyncFile>,
    pub clock: Arc<dyn ClockSource>,
}

impl Default for SyncOptions {
    fn default() -> Self {
        SyncOptions {
            retry: RetryPolicy::default(),
            item_timeout: Duration::from_secs(30),
            last_sync: None,
            clock: Arc::new(SystemClock),
        }
    }
}

/// What a call to [`SyncEngine::drain`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Another drain was running; nothing happened.
    AlreadyRunning,
    /// The device was offline; nothing happened.
    Offline,
    /// The drain ran to the end.
    Completed(DrainReport),
}

/// Summary of a completed drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DrainReport {
    /// Items in the drain's snapshot.
    pub attempted: usize,
    /// Items marked synced, conflicts and skips included.
    pub synced: usize,
    pub failed: usize,
    /// Items resolved by a conflict rule.
    pub conflicts: usize,
    /// Unsynced items left out because they are still backing off.
    pub waiting: usize,
    /// Unsynced items left out because they exhausted their attempts.
    pub parked: usize,
    /// Synced items dropped by compaction.
    pub compacted: usize,
    pub errors: Vec<String>,
    pub finished_at: Option<DateTime<Utc>>,
}

/// Pending-sync figures for a UI indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncStats {
    /// Unsynced items per type; types with none are omitted.
    pub pending: BTreeMap<ItemType, usize>,
    /// Unsynced items that will not be retried automatically.
    pub parked: usize,
    pub total_unsynced: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

/// How a single replay ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Replayed {
    Pushed,
    /// Pushed a trip merged with the server copy.
    Merged,
    /// Server already has a conflicting check-in; nothing written.
    ServerWins,
    /// This type/action pair is not replayed.
    NotReplayed,
}

/// Clears the draining flag when a drain ends, however it ends.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Drains the sync queue. One per process, shared through `Arc`.
pub struct SyncEngine {
    queue: Arc<SyncQueue>,
    store: Arc<RecordStore>,
    remote: Arc<dyn RemoteService>,
    monitor: Arc<ConnectivityMonitor>,
    hub: Arc<StatusHub>,
    options: SyncOptions,
    draining: AtomicBool,
}

impl SyncEngine {
    /// Create the engine.
    ///
    /// The initial status is idle and offline, with `last_sync` read from
    /// the persisted file and `total_unsynced` counted from the ledger.
    pub fn new(
        queue: Arc<SyncQueue>,
        store: Arc<RecordStore>,
        remote: Arc<dyn RemoteService>,
        monitor: Arc<ConnectivityMonitor>,
        options: SyncOptions,
    ) -> Arc<Self> {
        let total_unsynced = queue.unsynced_count().unwrap_or_else(|e| {
            tracing::warn!("failed to count unsynced items: {}", e);
            0
        });
        let last_sync = options.last_sync.as_ref().and_then(LastSyncFile::read);
        let hub = StatusHub::new(SyncStatus {
            last_sync,
            total_unsynced,
            ..SyncStatus::default()
        });

        Arc::new(SyncEngine {
            queue,
            store,
            remote,
            monitor,
            hub,
            options,
            draining: AtomicBool::new(false),
        })
    }

    /// A copy of the current status.
    pub fn status(&self) -> SyncStatus {
        self.hub.snapshot()
    }

    /// Register a status callback. See [`StatusHub::subscribe`].
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        &self,
        listener: impl Fn(&SyncStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.hub.subscribe(listener)
    }

    /// The connectivity monitor the engine consults.
    pub fn monitor(&self) -> &Arc<ConnectivityMonitor> {
        &self.monitor
    }

    /// Pending counts per type plus the last successful drain time.
    ///
    /// Also refreshes `total_unsynced` in the published status.
    pub fn stats(&self) -> SyncResult<SyncStats> {
        let last_sync = self.hub.snapshot().last_sync;
        let stats = collect_stats(&self.queue, &self.options.retry, last_sync)?;
        self.publish_unsynced(stats.total_unsynced);
        Ok(stats)
    }

    /// Recount `total_unsynced` from the ledger and publish it if it changed.
    ///
    /// Producers in other processes enqueue without telling the engine;
    /// this picks their items up between drains.
    pub fn refresh_unsynced(&self) -> SyncResult<usize> {
        let total = self.queue.unsynced_count()?;
        self.publish_unsynced(total);
        Ok(total)
    }

    fn publish_unsynced(&self, total: usize) {
        if self.hub.snapshot().total_unsynced != total {
            self.hub.update(|s| s.total_unsynced = total);
        }
    }

    /// Manual "sync now".
    ///
    /// Fails with [`SyncError::Offline`] before touching any state if the
    /// device is offline; otherwise runs [`drain`](Self::drain).
    pub async fn sync_now(&self) -> SyncResult<DrainOutcome> {
        if !self.monitor.is_online() {
            return Err(SyncError::Offline);
        }
        self.drain().await
    }

    /// Run one drain.
    pub async fn drain(&self) -> SyncResult<DrainOutcome> {
        if self
            .draining
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("drain already running");
            return Ok(DrainOutcome::AlreadyRunning);
        }
        let _guard = DrainGuard(&self.draining);

        if !self.monitor.is_online() {
            tracing::debug!("offline, not draining");
            return Ok(DrainOutcome::Offline);
        }

        tracing::info!("drain started");
        self.hub.update(|s| {
            s.is_syncing = true;
            s.errors.clear();
            s.progress = 0;
            s.current_item = None;
        });

        match self.run_drain().await {
            Ok(report) => {
                tracing::info!(
                    attempted = report.attempted,
                    synced = report.synced,
                    failed = report.failed,
                    "drain finished"
                );
                Ok(DrainOutcome::Completed(report))
            }
            Err(e) => {
                tracing::error!("drain aborted: {}", e);
                let entry = format!("sync failed: {}", e);
                self.hub.update(|s| {
                    s.errors.push(entry);
                    s.is_syncing = false;
                    s.current_item = None;
                });
                Err(e)
            }
        }
    }

    async fn run_drain(&self) -> SyncResult<DrainReport> {
        let mut report = DrainReport::default();
        let now = self.options.clock.now();

        let mut batch: Vec<SyncQueueItem> = Vec::new();
        for item in self.queue.list_unsynced()? {
            match self.options.retry.eligibility(&item, now) {
                Eligibility::Due => batch.push(item),
                Eligibility::Waiting { until } => {
                    tracing::debug!(id = %item.id, %until, "backing off");
                    report.waiting += 1;
                }
                Eligibility::Parked => {
                    tracing::debug!(id = %item.id, attempts = item.sync_attempts, "parked");
                    report.parked += 1;
                }
            }
        }
        // Stable: equal timestamps keep ledger order
        batch.sort_by_key(|item| item.timestamp);
        report.attempted = batch.len();

        let total = batch.len();
        for (index, item) in batch.iter().enumerate() {
            let label = item.label();
            let progress = progress_percent(index + 1, total);
            self.hub.update(|s| {
                s.current_item = Some(label);
                s.progress = progress;
            });

            let result = match tokio::time::timeout(self.options.item_timeout, self.replay(item))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(RemoteError::Timeout(self.options.item_timeout)),
            };
            let attempted_at = self.options.clock.now();

            match result {
                Ok(replayed) => {
                    self.queue.mark_synced(&item.id, attempted_at)?;
                    self.mark_record_synced(item);
                    report.synced += 1;
                    if matches!(replayed, Replayed::Merged | Replayed::ServerWins) {
                        report.conflicts += 1;
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    let attempts = item.sync_attempts.saturating_add(1);
                    self.queue
                        .mark_attempt(&item.id, attempts, attempted_at, Some(&message))?;
                    let entry = format!(
                        "{} {}: {}",
                        item.item_type(),
                        item.payload.record_id(),
                        message
                    );
                    tracing::warn!(attempts, "replay failed: {}", entry);
                    report.failed += 1;
                    report.errors.push(entry.clone());
                    self.hub.update(|s| s.errors.push(entry));
                }
            }
        }

        report.compacted = self.queue.compact()?;

        let finished_at = self.options.clock.now();
        if let Some(file) = &self.options.last_sync {
            if let Err(e) = file.write(finished_at) {
                tracing::warn!("failed to persist last sync time: {}", e);
            }
        }
        let remaining = self.queue.unsynced_count().unwrap_or_else(|e| {
            tracing::warn!("failed to recount unsynced items: {}", e);
            0
        });
        report.finished_at = Some(finished_at);

        self.hub.update(|s| {
            s.is_syncing = false;
            s.progress = 100;
            s.current_item = None;
            s.last_sync = Some(finished_at);
            s.total_unsynced = remaining;
        });
        Ok(report)
    }

    /// Replay one item, dispatching on its payload type.
    async fn replay(&self, item: &SyncQueueItem) -> Result<Replayed, RemoteError> {
        match &item.payload {
            Payload::Inspection(_) | Payload::FuelLog(_) | Payload::Breakdown(_) => {
                self.push(item, item.payload.clone()).await?;
                Ok(Replayed::Pushed)
            }
            Payload::Checkin(local) => {
                let remote = self
                    .remote
                    .fetch_checkin(local.trip_id.clone(), local.passenger_id.clone())
                    .await?;
                if resolve::checkin_superseded(local, remote.as_ref()) {
                    tracing::info!(
                        id = %local.id,
                        trip = %local.trip_id,
                        passenger = %local.passenger_id,
                        "check-in conflict: server copy wins"
                    );
                    return Ok(Replayed::ServerWins);
                }
                self.push(item, item.payload.clone()).await?;
                Ok(Replayed::Pushed)
            }
            Payload::Shift(_) => {
                if item.action != Action::Update {
                    return Ok(Replayed::NotReplayed);
                }
                self.push(item, item.payload.clone()).await?;
                Ok(Replayed::Pushed)
            }
            Payload::Trip(local) => {
                if item.action != Action::Update {
                    return Ok(Replayed::NotReplayed);
                }
                let remote = self.remote.fetch_trip(local.id.clone()).await?;
                match resolve::resolve_trip(local, remote.as_ref(), item.timestamp) {
                    Some(merged) => {
                        tracing::info!(id = %local.id, "trip conflict: merged with server copy");
                        self.push(item, Payload::Trip(merged)).await?;
                        Ok(Replayed::Merged)
                    }
                    None => {
                        self.push(item, item.payload.clone()).await?;
                        Ok(Replayed::Pushed)
                    }
                }
            }
        }
    }

    async fn push(&self, item: &SyncQueueItem, payload: Payload) -> Result<(), RemoteError> {
        self.remote.push(item.id.clone(), item.action, payload).await
    }

    /// Best-effort flip of the originating record's `synced` flag.
    ///
    /// The flag means the record's latest state reached the remote, so it
    /// stays clear while a later mutation of the record is still queued.
    fn mark_record_synced(&self, item: &SyncQueueItem) {
        let kind = item.item_type();
        let record_id = item.payload.record_id();
        match self.queue.has_unsynced(kind, record_id) {
            Ok(false) => {}
            Ok(true) => {
                tracing::debug!(%kind, id = record_id, "later mutation pending, not flagging");
                return;
            }
            Err(e) => {
                tracing::warn!(%kind, id = record_id, "failed to check pending mutations: {}", e);
                return;
            }
        }
        match self.store.mark_synced(kind, record_id) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(%kind, id = record_id, "record gone, nothing to flag");
            }
            Err(e) => {
                tracing::warn!(%kind, id = record_id, "failed to flag record synced: {}", e);
            }
        }
    }

    fn publish_online(&self, online: bool) {
        if self.hub.snapshot().is_online != online {
            self.hub.update(|s| s.is_online = online);
        }
    }

    /// Follow connectivity: mirror it into the status and drain on every
    /// offline-to-online transition.
    ///
    /// The current state is published immediately. Drains run on their
    /// own tasks so transitions keep being mirrored while one is running.
    pub fn watch_connectivity(self: Arc<Self>) -> WatchHandle {
        let mut rx = self.monitor.subscribe();
        let online = *rx.borrow_and_update();
        self.publish_online(online);

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let online = *rx.borrow_and_update();
                        self.publish_online(online);
                        // The monitor only notifies on transitions, so seeing
                        // "online" here means the device came back online.
                        if online {
                            let engine = Arc::clone(&self);
                            tokio::spawn(async move {
                                if let Err(e) = engine.drain().await {
                                    tracing::warn!("automatic sync failed: {}", e);
                                }
                            });
                        }
                    }
                }
            }
        });

        WatchHandle { cancel, task }
    }
}

/// Stats for a ledger, without a running engine.
pub fn collect_stats(
    queue: &SyncQueue,
    retry: &RetryPolicy,
    last_sync: Option<DateTime<Utc>>,
) -> SyncResult<SyncStats> {
    let unsynced = queue.list_unsynced()?;
    let mut pending = BTreeMap::new();
    let mut parked = 0;
    for item in &unsynced {
        *pending.entry(item.item_type()).or_insert(0) += 1;
        if retry.is_parked(item) {
            parked += 1;
        }
    }
    Ok(SyncStats {
        pending,
        parked,
        total_unsynced: unsynced.len(),
        last_sync,
    })
}

/// `done / total` as a percentage, rounded down.
fn progress_percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let percent = done.saturating_mul(100) / total;
    u8::try_from(percent.min(100)).unwrap_or(100)
}

/// Handle to the connectivity watcher started by
/// [`SyncEngine::watch_connectivity`].
pub struct WatchHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl WatchHandle {
    /// Stop following connectivity. A drain already started keeps running.
    pub async fn stop(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
