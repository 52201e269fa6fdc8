// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict rules for records a remote actor may also change.
//!
//! - Check-ins: server wins. If the server already shows the passenger
//!   boarded by someone else, the local mutation is dropped.
//! - Trips: field-level merge. The locally authored `status` and
//!   `passengers` override the server copy; every other field is the
//!   server's.

use chrono::{DateTime, Utc};
use tsync_core::{Checkin, TripUpdate};

/// True if the server copy means the local check-in must not be replayed.
pub fn checkin_superseded(local: &Checkin, remote: Option<&Checkin>) -> bool {
    let Some(remote) = remote else {
        return false;
    };
    remote.boarded && remote.boarded_by.is_some() && remote.boarded_by != local.boarded_by
}

/// True if the server changed the trip after the local mutation was recorded.
pub fn trip_conflicts(remote: &TripUpdate, recorded_at: DateTime<Utc>) -> bool {
    remote.updated_at.is_some_and(|updated| updated > recorded_at)
}

/// The server copy with the local `status` and `passengers` applied.
pub fn merge_trip(local: &TripUpdate, remote: &TripUpdate) -> TripUpdate {
    TripUpdate {
        status: local.status,
        passengers: local.passengers,
        ..remote.clone()
    }
}

/// The trip payload to push for a local update recorded at `recorded_at`.
///
/// Returns `None` when there is no conflict and the local copy goes as is.
pub fn resolve_trip(
    local: &TripUpdate,
    remote: Option<&TripUpdate>,
    recorded_at: DateTime<Utc>,
) -> Option<TripUpdate> {
    let remote = remote?;
    if trip_conflicts(remote, recorded_at) {
        Some(merge_trip(local, remote))
    } else {
        None
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
