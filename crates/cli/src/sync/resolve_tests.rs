// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::test_helpers::t0;
use tsync_core::TripStatus;
use yare::parameterized;

fn checkin(boarded: bool, by: Option<&str>) -> Checkin {
    Checkin {
        id: "ci-1".into(),
        trip_id: "t-1".into(),
        passenger_id: "p-1".into(),
        boarded,
        boarded_by: by.map(String::from),
        ..Default::default()
    }
}

#[parameterized(
    no_remote_copy = { None, false },
    remote_not_boarded = { Some(checkin(false, Some("driver-2"))), false },
    boarded_by_same_actor = { Some(checkin(true, Some("driver-1"))), false },
    boarded_by_unknown = { Some(checkin(true, None)), false },
    boarded_by_other_actor = { Some(checkin(true, Some("dispatch"))), true },
)]
fn checkin_server_wins(remote: Option<Checkin>, superseded: bool) {
    let local = checkin(true, Some("driver-1"));
    assert_eq!(checkin_superseded(&local, remote.as_ref()), superseded);
}

fn local_trip() -> TripUpdate {
    TripUpdate {
        id: "t-1".into(),
        route_id: "local-route".into(),
        vehicle_id: Some("bus-local".into()),
        status: TripStatus::Departed,
        passengers: 31,
        notes: Some("local note".into()),
        updated_at: Some(t0()),
        ..Default::default()
    }
}

fn remote_trip(updated_secs: i64) -> TripUpdate {
    TripUpdate {
        id: "t-1".into(),
        route_id: "r-42".into(),
        vehicle_id: Some("bus-7".into()),
        status: TripStatus::Boarding,
        passengers: 12,
        departed_at: Some(t0() - chrono::Duration::minutes(5)),
        arrived_at: None,
        notes: Some("detour via depot".into()),
        updated_at: Some(t0() + chrono::Duration::seconds(updated_secs)),
        synced: true,
    }
}

#[test]
fn merge_takes_local_status_and_passengers_only() {
    let local = local_trip();
    let remote = remote_trip(60);

    let merged = merge_trip(&local, &remote);

    assert_eq!(merged.status, local.status);
    assert_eq!(merged.passengers, local.passengers);
    assert_eq!(merged.id, remote.id);
    assert_eq!(merged.route_id, remote.route_id);
    assert_eq!(merged.vehicle_id, remote.vehicle_id);
    assert_eq!(merged.departed_at, remote.departed_at);
    assert_eq!(merged.arrived_at, remote.arrived_at);
    assert_eq!(merged.notes, remote.notes);
    assert_eq!(merged.updated_at, remote.updated_at);
    assert_eq!(merged.synced, remote.synced);
}

#[parameterized(
    remote_newer = { 60, true },
    remote_same_instant = { 0, false },
    remote_older = { -60, false },
)]
fn trip_conflict_depends_on_remote_update_time(updated_secs: i64, conflict: bool) {
    assert_eq!(trip_conflicts(&remote_trip(updated_secs), t0()), conflict);
}

#[test]
fn remote_without_update_time_never_conflicts() {
    let mut remote = remote_trip(60);
    remote.updated_at = None;
    assert!(!trip_conflicts(&remote, t0()));
}

#[test]
fn resolve_trip_without_remote_copy_pushes_local() {
    assert!(resolve_trip(&local_trip(), None, t0()).is_none());
}

#[test]
fn resolve_trip_merges_on_conflict() {
    let merged = resolve_trip(&local_trip(), Some(&remote_trip(30)), t0()).unwrap();
    assert_eq!(merged.route_id, "r-42");
    assert_eq!(merged.passengers, 31);
}
