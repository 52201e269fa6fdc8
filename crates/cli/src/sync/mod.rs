// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync engine for the offline mutation queue.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Connectivity│────►│   Engine    │────►│   Remote    │
//! │  (monitor)  │     │ (SyncEngine)│◄────│  (trait)    │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!                        │       │
//!                        ▼       ▼
//!               ┌─────────────┐ ┌─────────────┐
//!               │   Queue     │ │ StatusHub   │
//!               │ (SyncQueue) │ │ (listeners) │
//!               └─────────────┘ └─────────────┘
//! ```
//!
//! # Features
//!
//! - One drain at a time, replaying in recording order
//! - Per-item failure isolation with backoff and parking
//! - Server-wins check-ins and field-merged trip updates
//! - Automatic drain on every offline-to-online transition
//! - Injectable remote and connectivity probe for testing

mod connectivity;
mod engine;
mod last_sync;
mod remote;
mod resolve;
mod retry;
mod status;

pub use connectivity::{spawn_probe_loop, ConnectivityMonitor, Probe, TcpProbe};
pub use engine::{
    collect_stats, DrainOutcome, DrainReport, SyncEngine, SyncError, SyncOptions, SyncResult,
    SyncStats, WatchHandle,
};
pub use last_sync::LastSyncFile;
pub use remote::{RemoteError, RemoteFuture, RemoteResult, RemoteService, WebSocketRemote};
pub use resolve::{checkin_superseded, merge_trip, resolve_trip, trip_conflicts};
pub use retry::{Eligibility, RetryPolicy};
pub use status::{StatusHub, Subscription, SyncStatus};

#[cfg(test)]
pub(crate) mod test_helpers;
