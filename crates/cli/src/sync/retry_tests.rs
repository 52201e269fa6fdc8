// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::sync::test_helpers::{fuel_item, t0};
use yare::parameterized;

fn policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_secs(10),
        max_backoff: Duration::from_secs(25),
    }
}

fn failed(attempts: u32, last_secs: i64) -> SyncQueueItem {
    let mut item = fuel_item("fl-1", 0);
    item.sync_attempts = attempts;
    item.last_sync_attempt = Some(t0() + chrono::Duration::seconds(last_secs));
    item
}

#[parameterized(
    none = { 0, 0 },
    first = { 1, 10 },
    second = { 2, 20 },
    capped = { 3, 25 },
    far = { 40, 25 },
)]
fn backoff_doubles_up_to_cap(attempts: u32, secs: u64) {
    assert_eq!(policy().backoff(attempts), Duration::from_secs(secs));
}

#[test]
fn fresh_item_is_due() {
    let item = fuel_item("fl-1", 0);
    assert_eq!(policy().eligibility(&item, t0()), Eligibility::Due);
}

#[test]
fn failed_item_waits_for_backoff() {
    let item = failed(1, 0);

    assert_eq!(
        policy().eligibility(&item, t0() + chrono::Duration::seconds(5)),
        Eligibility::Waiting {
            until: t0() + chrono::Duration::seconds(10)
        }
    );
    assert_eq!(
        policy().eligibility(&item, t0() + chrono::Duration::seconds(10)),
        Eligibility::Due
    );
}

#[test]
fn item_is_parked_at_max_attempts() {
    let item = failed(3, 0);
    let later = t0() + chrono::Duration::days(1);

    assert!(policy().is_parked(&item));
    assert_eq!(policy().eligibility(&item, later), Eligibility::Parked);
}

#[test]
fn unbounded_policy_never_parks_or_waits() {
    let item = failed(1_000, 0);
    let policy = RetryPolicy::unbounded();

    assert!(!policy.is_parked(&item));
    assert_eq!(policy.eligibility(&item, t0()), Eligibility::Due);
}

#[test]
fn default_policy_values() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 10);
    assert_eq!(policy.initial_backoff, Duration::from_millis(1000));
    assert_eq!(policy.max_backoff, Duration::from_secs(300));
}
