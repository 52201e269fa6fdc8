// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn recorder(hub: &Arc<StatusHub>) -> (Subscription, Arc<Mutex<Vec<SyncStatus>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = hub.subscribe(move |status| sink.lock().unwrap().push(status.clone()));
    (sub, seen)
}

#[test]
fn snapshot_is_a_copy() {
    let hub = StatusHub::new(SyncStatus::default());
    let mut copy = hub.snapshot();
    copy.errors.push("mutated".into());

    assert!(hub.snapshot().errors.is_empty());
}

#[test]
fn each_update_notifies_once_in_order() {
    let hub = StatusHub::new(SyncStatus::default());
    let (_sub, seen) = recorder(&hub);

    hub.update(|s| s.is_syncing = true);
    hub.update(|s| s.progress = 50);
    hub.update(|s| {
        s.progress = 100;
        s.is_syncing = false;
    });

    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen[0].is_syncing);
    assert_eq!(seen[0].progress, 0);
    assert_eq!(seen[1].progress, 50);
    assert!(!seen[2].is_syncing);
    assert_eq!(seen[2].progress, 100);
}

#[test]
fn unsubscribe_stops_notifications() {
    let hub = StatusHub::new(SyncStatus::default());
    let (sub, seen) = recorder(&hub);

    hub.update(|s| s.is_online = true);
    sub.unsubscribe();
    hub.update(|s| s.is_online = false);

    assert_eq!(seen.lock().unwrap().len(), 1);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn dropping_subscription_unsubscribes() {
    let hub = StatusHub::new(SyncStatus::default());
    {
        let (_sub, _seen) = recorder(&hub);
        assert_eq!(hub.subscriber_count(), 1);
    }
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn listeners_may_read_the_snapshot() {
    let hub = StatusHub::new(SyncStatus::default());
    let observed = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&observed);
    let reader = Arc::clone(&hub);
    let _sub = hub.subscribe(move |_| {
        *sink.lock().unwrap() = Some(reader.snapshot().total_unsynced);
    });

    hub.update(|s| s.total_unsynced = 4);

    assert_eq!(*observed.lock().unwrap(), Some(4));
}

#[test]
fn subscription_outliving_hub_is_harmless() {
    let hub = StatusHub::new(SyncStatus::default());
    let (sub, _seen) = recorder(&hub);
    drop(hub);
    sub.unsubscribe();
}
