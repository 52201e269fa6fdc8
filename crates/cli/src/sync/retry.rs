// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy for failed replays.
//!
//! A failed item is retried on a later drain once its backoff has elapsed.
//! After `max_attempts` failures it is parked: it stays unsynced in the
//! ledger and is reported by the stats query, but no drain replays it again.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tsync_core::SyncQueueItem;

/// Whether a queued item should be replayed now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Replay in this drain.
    Due,
    /// Backing off until the given instant.
    Waiting { until: DateTime<Utc> },
    /// Exhausted its attempts; never replayed automatically.
    Parked,
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failures after which an item is parked (0 = unlimited).
    pub max_attempts: u32,
    /// Delay after the first failure.
    pub initial_backoff: Duration,
    /// Upper bound for the delay.
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(1000),
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Retry every failed item on every drain, forever.
    pub fn unbounded() -> Self {
        RetryPolicy {
            max_attempts: 0,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
        }
    }

    /// Delay owed after `attempts` failures.
    pub fn backoff(&self, attempts: u32) -> Duration {
        if attempts == 0 {
            return Duration::ZERO;
        }
        let factor = 2u32.saturating_pow(attempts - 1);
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }

    /// True once an item has used up its attempts.
    pub fn is_parked(&self, item: &SyncQueueItem) -> bool {
        self.max_attempts > 0 && item.sync_attempts >= self.max_attempts
    }

    /// Decide whether `item` should be replayed at `now`.
    pub fn eligibility(&self, item: &SyncQueueItem, now: DateTime<Utc>) -> Eligibility {
        if self.is_parked(item) {
            return Eligibility::Parked;
        }
        let Some(last) = item.last_sync_attempt else {
            return Eligibility::Due;
        };
        let delay = chrono::Duration::from_std(self.backoff(item.sync_attempts))
            .unwrap_or(chrono::Duration::MAX);
        match last.checked_add_signed(delay) {
            Some(until) if until > now => Eligibility::Waiting { until },
            Some(_) => Eligibility::Due,
            None => Eligibility::Waiting {
                until: DateTime::<Utc>::MAX_UTC,
            },
        }
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
