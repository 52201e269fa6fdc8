// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

//! Shared test helpers for sync module tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use tsync_core::{Action, Checkin, FuelLog, Payload, SyncQueueItem, TripUpdate};

use super::remote::{RemoteError, RemoteFuture, RemoteService};

/// A fixed instant the tests measure from.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0)
        .single()
        .unwrap_or_default()
}

/// `t0()` plus some seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    t0() + chrono::Duration::seconds(secs)
}

/// A fuel log creation recorded `secs` after `t0()`.
pub fn fuel_item(id: &str, secs: i64) -> SyncQueueItem {
    SyncQueueItem::new(
        Payload::FuelLog(FuelLog {
            id: id.into(),
            vehicle_id: "bus-7".into(),
            driver_id: "driver-1".into(),
            liters: 42.5,
            ..Default::default()
        }),
        Action::Create,
        at(secs),
    )
}

/// One push the mock received.
#[derive(Debug, Clone, PartialEq)]
pub struct Pushed {
    pub item_id: String,
    pub action: Action,
    pub payload: Payload,
}

type PushHook = Box<dyn Fn(&Pushed) + Send + Sync>;

/// In-memory remote service.
///
/// Records pushes in order, fails pushes for chosen record ids, serves
/// check-ins and trips from maps, and can hang or delay to exercise
/// timeouts and overlapping drains.
#[derive(Default)]
pub struct MockRemote {
    pushes: Mutex<Vec<Pushed>>,
    failing: Mutex<HashSet<String>>,
    failing_items: Mutex<HashSet<String>>,
    hanging: Mutex<HashSet<String>>,
    checkins: Mutex<HashMap<(String, String), Checkin>>,
    trips: Mutex<HashMap<String, TripUpdate>>,
    push_delay: Mutex<Option<Duration>>,
    on_push: Mutex<Option<PushHook>>,
    fetches: AtomicUsize,
}

impl MockRemote {
    pub fn new() -> Arc<Self> {
        Arc::new(MockRemote::default())
    }

    /// Reject pushes of the record with this id.
    pub fn fail_record(&self, record_id: &str) {
        self.failing.lock().unwrap().insert(record_id.to_string());
    }

    /// Reject pushes of one queue item, leaving other items of its record alone.
    pub fn fail_item(&self, item_id: &str) {
        self.failing_items.lock().unwrap().insert(item_id.to_string());
    }

    pub fn heal_record(&self, record_id: &str) {
        self.failing.lock().unwrap().remove(record_id);
    }

    /// Never answer pushes of the record with this id.
    pub fn hang_record(&self, record_id: &str) {
        self.hanging.lock().unwrap().insert(record_id.to_string());
    }

    pub fn set_push_delay(&self, delay: Duration) {
        *self.push_delay.lock().unwrap() = Some(delay);
    }

    /// Run `hook` after every accepted push.
    pub fn on_push(&self, hook: impl Fn(&Pushed) + Send + Sync + 'static) {
        *self.on_push.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn put_checkin(&self, checkin: Checkin) {
        self.checkins.lock().unwrap().insert(
            (checkin.trip_id.clone(), checkin.passenger_id.clone()),
            checkin,
        );
    }

    pub fn put_trip(&self, trip: TripUpdate) {
        self.trips.lock().unwrap().insert(trip.id.clone(), trip);
    }

    /// Accepted pushes in arrival order.
    pub fn pushes(&self) -> Vec<Pushed> {
        self.pushes.lock().unwrap().clone()
    }

    /// Record ids of accepted pushes in arrival order.
    pub fn pushed_record_ids(&self) -> Vec<String> {
        self.pushes()
            .iter()
            .map(|p| p.payload.record_id().to_string())
            .collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

impl RemoteService for MockRemote {
    fn push(&self, item_id: String, action: Action, payload: Payload) -> RemoteFuture<'_, ()> {
        Box::pin(async move {
            let record_id = payload.record_id().to_string();
            let hang = self.hanging.lock().unwrap().contains(&record_id);
            if hang {
                std::future::pending::<()>().await;
            }
            let delay = *self.push_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let fail = self.failing.lock().unwrap().contains(&record_id)
                || self.failing_items.lock().unwrap().contains(&item_id);
            if fail {
                return Err(RemoteError::Rejected(format!("{} refused", record_id)));
            }
            let pushed = Pushed {
                item_id,
                action,
                payload,
            };
            self.pushes.lock().unwrap().push(pushed.clone());
            if let Some(hook) = self.on_push.lock().unwrap().as_ref() {
                hook(&pushed);
            }
            Ok(())
        })
    }

    fn fetch_checkin(
        &self,
        trip_id: String,
        passenger_id: String,
    ) -> RemoteFuture<'_, Option<Checkin>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .checkins
                .lock()
                .unwrap()
                .get(&(trip_id, passenger_id))
                .cloned())
        })
    }

    fn fetch_trip(&self, trip_id: String) -> RemoteFuture<'_, Option<TripUpdate>> {
        Box::pin(async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            Ok(self.trips.lock().unwrap().get(&trip_id).cloned())
        })
    }
}
