// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Status publication.
//!
//! The hub owns the single [`SyncStatus`] value. Every call to
//! [`StatusHub::update`] is one mutation and produces exactly one
//! notification to each subscriber, synchronously and in mutation order.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Observable state of the sync engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    /// True while a drain runs.
    pub is_syncing: bool,
    /// Last known reachability.
    pub is_online: bool,
    /// Percentage of the current drain's snapshot processed (0-100).
    pub progress: u8,
    /// Label of the item being replayed, e.g. `"fuel_log (create)"`.
    pub current_item: Option<String>,
    /// Failures of the current or last drain.
    pub errors: Vec<String>,
    /// Completion time of the last drain that reached its end.
    pub last_sync: Option<DateTime<Utc>>,
    /// Unsynced queue items as of the last recount.
    pub total_unsynced: usize,
}

type Listener = Arc<dyn Fn(&SyncStatus) + Send + Sync>;

struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Holder of the shared status and its subscribers.
pub struct StatusHub {
    status: Mutex<SyncStatus>,
    listeners: Mutex<Listeners>,
    /// Serializes update+notify so notifications keep mutation order.
    publish: Mutex<()>,
}

impl StatusHub {
    pub fn new(initial: SyncStatus) -> Arc<Self> {
        Arc::new(StatusHub {
            status: Mutex::new(initial),
            listeners: Mutex::new(Listeners {
                next_id: 0,
                entries: Vec::new(),
            }),
            publish: Mutex::new(()),
        })
    }

    fn status(&self) -> MutexGuard<'_, SyncStatus> {
        self.status.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A copy of the current status.
    pub fn snapshot(&self) -> SyncStatus {
        self.status().clone()
    }

    /// Mutate the status and notify every subscriber.
    ///
    /// Subscribers run on the calling thread. They may call [`snapshot`],
    /// but must not call `update` themselves.
    ///
    /// [`snapshot`]: StatusHub::snapshot
    pub fn update(&self, mutate: impl FnOnce(&mut SyncStatus)) {
        let _publish = self.publish.lock().unwrap_or_else(|e| e.into_inner());
        let published = {
            let mut status = self.status();
            mutate(&mut status);
            status.clone()
        };
        let listeners: Vec<Listener> = self
            .listeners()
            .entries
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&published);
        }
    }

    /// Register a callback invoked after every status mutation.
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// unsubscribed or dropped.
    #[must_use = "dropping the subscription unsubscribes immediately"]
    pub fn subscribe(
        self: &Arc<Self>,
        listener: impl Fn(&SyncStatus) + Send + Sync + 'static,
    ) -> Subscription {
        let mut listeners = self.listeners();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        Subscription {
            hub: Arc::downgrade(self),
            id,
        }
    }

    /// Number of registered callbacks.
    pub fn subscriber_count(&self) -> usize {
        self.listeners().entries.len()
    }

    fn remove(&self, id: u64) {
        self.listeners().entries.retain(|(entry, _)| *entry != id);
    }
}

/// Handle returned by [`StatusHub::subscribe`].
pub struct Subscription {
    hub: Weak<StatusHub>,
    id: u64,
}

impl Subscription {
    /// Stop receiving notifications.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.remove(self.id);
        }
    }
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
