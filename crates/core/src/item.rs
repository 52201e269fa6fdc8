// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync queue items: one pending mutation each.
//!
//! On disk an item keeps the flat shape producers have always written:
//!
//! ```json
//! {"id":"q-1a2b3c4d5e6f7a8b","type":"fuel_log","action":"create",
//!  "data":{"id":"fl-1","liters":40.0},"timestamp":"2026-03-01T08:00:00Z",
//!  "synced":false,"sync_attempts":0}
//! ```
//!
//! In memory the `type`/`data` pair is a single typed [`Payload`].

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::record::{Breakdown, Checkin, FuelLog, Inspection, ItemType, ShiftUpdate, TripUpdate};

/// The kind of mutation a queue item replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Create,
    Update,
    Delete,
}

impl Action {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Action {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(Action::Create),
            "update" => Ok(Action::Update),
            "delete" => Ok(Action::Delete),
            _ => Err(Error::InvalidAction(s.to_string())),
        }
    }
}

/// The typed domain payload carried by a queue item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Payload {
    Inspection(Inspection),
    FuelLog(FuelLog),
    Breakdown(Breakdown),
    Checkin(Checkin),
    Shift(ShiftUpdate),
    Trip(TripUpdate),
}

impl Payload {
    /// Returns the item type of this payload.
    pub fn item_type(&self) -> ItemType {
        match self {
            Payload::Inspection(_) => ItemType::Inspection,
            Payload::FuelLog(_) => ItemType::FuelLog,
            Payload::Breakdown(_) => ItemType::Breakdown,
            Payload::Checkin(_) => ItemType::Checkin,
            Payload::Shift(_) => ItemType::Shift,
            Payload::Trip(_) => ItemType::Trip,
        }
    }

    /// Returns the id of the record this payload describes.
    pub fn record_id(&self) -> &str {
        match self {
            Payload::Inspection(r) => &r.id,
            Payload::FuelLog(r) => &r.id,
            Payload::Breakdown(r) => &r.id,
            Payload::Checkin(r) => &r.id,
            Payload::Shift(r) => &r.id,
            Payload::Trip(r) => &r.id,
        }
    }

    /// Builds a payload from an item type and its JSON body.
    pub fn from_parts(item_type: ItemType, data: serde_json::Value) -> Result<Self> {
        let payload = match item_type {
            ItemType::Inspection => Payload::Inspection(serde_json::from_value(data)?),
            ItemType::FuelLog => Payload::FuelLog(serde_json::from_value(data)?),
            ItemType::Breakdown => Payload::Breakdown(serde_json::from_value(data)?),
            ItemType::Checkin => Payload::Checkin(serde_json::from_value(data)?),
            ItemType::Shift => Payload::Shift(serde_json::from_value(data)?),
            ItemType::Trip => Payload::Trip(serde_json::from_value(data)?),
        };
        Ok(payload)
    }

    /// Returns the JSON body of this payload, without the type tag.
    pub fn data(&self) -> Result<serde_json::Value> {
        let value = match self {
            Payload::Inspection(r) => serde_json::to_value(r)?,
            Payload::FuelLog(r) => serde_json::to_value(r)?,
            Payload::Breakdown(r) => serde_json::to_value(r)?,
            Payload::Checkin(r) => serde_json::to_value(r)?,
            Payload::Shift(r) => serde_json::to_value(r)?,
            Payload::Trip(r) => serde_json::to_value(r)?,
        };
        Ok(value)
    }
}

/// One pending mutation in the sync queue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "StoredItem")]
pub struct SyncQueueItem {
    /// Opaque unique id, generated when the mutation is recorded.
    pub id: String,
    /// What to replay.
    pub payload: Payload,
    pub action: Action,
    /// When the mutation was recorded; the replay order key.
    pub timestamp: DateTime<Utc>,
    /// True once a replay succeeded.
    pub synced: bool,
    /// Number of failed replays. Only ever increases.
    pub sync_attempts: u32,
    pub last_sync_attempt: Option<DateTime<Utc>>,
    /// Message of the most recent failure.
    pub error: Option<String>,
}

impl SyncQueueItem {
    /// Records a new pending mutation.
    ///
    /// The id is derived from the payload, action, timestamp and process, so
    /// two producers stamping through a monotonic clock never collide.
    pub fn new(payload: Payload, action: Action, timestamp: DateTime<Utc>) -> Self {
        let id = generate_item_id(&payload, action, &timestamp);
        SyncQueueItem {
            id,
            payload,
            action,
            timestamp,
            synced: false,
            sync_attempts: 0,
            last_sync_attempt: None,
            error: None,
        }
    }

    /// Returns the item type of the payload.
    pub fn item_type(&self) -> ItemType {
        self.payload.item_type()
    }

    /// Returns the human-readable label shown while the item replays.
    pub fn label(&self) -> String {
        format!("{} ({})", self.item_type(), self.action)
    }
}

/// Generate a queue item id.
/// Format: q-{hash} where hash is the first 16 hex chars of SHA256 over the
/// type, action, record id, timestamp and process id.
fn generate_item_id(payload: &Payload, action: Action, timestamp: &DateTime<Utc>) -> String {
    let input = format!(
        "{}:{}:{}:{}:{}",
        payload.item_type(),
        action,
        payload.record_id(),
        timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true),
        std::process::id()
    );
    let hash = Sha256::digest(input.as_bytes());
    format!("q-{}", hex::encode(&hash[..8]))
}

/// Flat on-disk representation of a queue item.
#[derive(Deserialize)]
struct StoredItem {
    id: String,
    #[serde(rename = "type")]
    item_type: ItemType,
    action: Action,
    data: serde_json::Value,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    synced: bool,
    #[serde(default)]
    sync_attempts: u32,
    #[serde(default)]
    last_sync_attempt: Option<DateTime<Utc>>,
    #[serde(default)]
    error: Option<String>,
}

impl TryFrom<StoredItem> for SyncQueueItem {
    type Error = Error;

    fn try_from(stored: StoredItem) -> Result<Self> {
        let payload = Payload::from_parts(stored.item_type, stored.data)?;
        Ok(SyncQueueItem {
            id: stored.id,
            payload,
            action: stored.action,
            timestamp: stored.timestamp,
            synced: stored.synced,
            sync_attempts: stored.sync_attempts,
            last_sync_attempt: stored.last_sync_attempt,
            error: stored.error,
        })
    }
}

impl Serialize for SyncQueueItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        StoredItemRef {
            id: &self.id,
            item_type: self.item_type(),
            action: self.action,
            data: PayloadData(&self.payload),
            timestamp: &self.timestamp,
            synced: self.synced,
            sync_attempts: self.sync_attempts,
            last_sync_attempt: self.last_sync_attempt.as_ref(),
            error: self.error.as_deref(),
        }
        .serialize(serializer)
    }
}

/// Borrowed counterpart of [`StoredItem`] for writing.
#[derive(Serialize)]
struct StoredItemRef<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    item_type: ItemType,
    action: Action,
    data: PayloadData<'a>,
    timestamp: &'a DateTime<Utc>,
    synced: bool,
    sync_attempts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_sync_attempt: Option<&'a DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// A payload's record body, without the type tag.
struct PayloadData<'a>(&'a Payload);

impl Serialize for PayloadData<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0 {
            Payload::Inspection(r) => r.serialize(serializer),
            Payload::FuelLog(r) => r.serialize(serializer),
            Payload::Breakdown(r) => r.serialize(serializer),
            Payload::Checkin(r) => r.serialize(serializer),
            Payload::Shift(r) => r.serialize(serializer),
            Payload::Trip(r) => r.serialize(serializer),
        }
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
