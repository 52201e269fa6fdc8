// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tsync-core: Shared library for the tripsync offline queue
//!
//! This crate provides the domain records, the durable record store, the
//! sync queue ledger, and the wire protocol used by the tripsync CLI and
//! its sync engine.

pub mod clock;
pub mod error;
pub mod item;
pub mod jsonl;
pub mod protocol;
pub mod queue;
pub mod record;
pub mod store;

pub use clock::{ClockSource, ManualClock, MonotonicClock, SystemClock};
pub use error::{Error, Result};
pub use item::{Action, Payload, SyncQueueItem};
pub use protocol::{ClientMessage, ServerMessage};
pub use queue::SyncQueue;
pub use record::{
    Breakdown, ChecklistEntry, Checkin, FuelLog, Inspection, ItemType, Record, Severity,
    ShiftStatus, ShiftUpdate, TripStatus, TripUpdate,
};
pub use store::RecordStore;
