// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Domain records produced in the field.
//!
//! Each record type carries its business fields plus a `synced` flag that
//! says whether its latest local state has been pushed to the remote side.
//! Every field except `id` defaults when absent, so producers may submit
//! sparse payloads such as `{"id": "fl-1", "liters": 40}`.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// The closed set of record types that can be queued for sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Inspection,
    FuelLog,
    Breakdown,
    Checkin,
    Shift,
    Trip,
}

impl ItemType {
    /// All item types, in display order.
    pub const ALL: [ItemType; 6] = [
        ItemType::Inspection,
        ItemType::FuelLog,
        ItemType::Breakdown,
        ItemType::Checkin,
        ItemType::Shift,
        ItemType::Trip,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Inspection => "inspection",
            ItemType::FuelLog => "fuel_log",
            ItemType::Breakdown => "breakdown",
            ItemType::Checkin => "checkin",
            ItemType::Shift => "shift",
            ItemType::Trip => "trip",
        }
    }

    /// Returns the record store key holding records of this type.
    pub fn store_key(&self) -> &'static str {
        match self {
            ItemType::Inspection => "inspections",
            ItemType::FuelLog => "fuel_logs",
            ItemType::Breakdown => "breakdowns",
            ItemType::Checkin => "checkins",
            ItemType::Shift => "shift_updates",
            ItemType::Trip => "trip_updates",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "inspection" => Ok(ItemType::Inspection),
            "fuel_log" | "fuel" => Ok(ItemType::FuelLog),
            "breakdown" => Ok(ItemType::Breakdown),
            "checkin" | "check_in" => Ok(ItemType::Checkin),
            "shift" => Ok(ItemType::Shift),
            "trip" => Ok(ItemType::Trip),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

/// A record that lives in the durable record store.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// The item type this record is queued under.
    const TYPE: ItemType;

    /// The record id.
    fn id(&self) -> &str;

    /// Whether the latest local state still needs to be pushed.
    fn is_unsynced(&self) -> bool;
}

/// One line of a pre-trip vehicle inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChecklistEntry {
    pub item: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A vehicle inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Inspection {
    pub id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub checklist: Vec<ChecklistEntry>,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspected_at: Option<DateTime<Utc>>,
    pub synced: bool,
}

/// A refuelling entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuelLog {
    pub id: String,
    pub vehicle_id: String,
    pub driver_id: String,
    pub liters: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer_km: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<Utc>>,
    pub synced: bool,
}

/// How badly a breakdown affects service.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// A vehicle breakdown report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Breakdown {
    pub id: String,
    pub vehicle_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_id: Option<String>,
    pub description: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reported_at: Option<DateTime<Utc>>,
    pub synced: bool,
}

/// A passenger boarding check-in.
///
/// `boarded_by` identifies the actor (device or dispatcher) that boarded the
/// passenger; it decides check-in conflicts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Checkin {
    pub id: String,
    pub trip_id: String,
    pub passenger_id: String,
    pub boarded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarded_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boarded_by: Option<String>,
    pub synced: bool,
}

/// Lifecycle of a driver shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftStatus {
    #[default]
    Scheduled,
    Started,
    OnBreak,
    Ended,
}

/// A change to a driver shift.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShiftUpdate {
    pub id: String,
    pub driver_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub status: ShiftStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub odometer_km: Option<u64>,
    pub synced: bool,
}

/// Lifecycle of a trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripStatus {
    #[default]
    Scheduled,
    Boarding,
    Departed,
    Arrived,
    Cancelled,
}

/// A change to a trip.
///
/// `status` and `passengers` are authored on the vehicle; every other field
/// is owned by dispatch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TripUpdate {
    pub id: String,
    pub route_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_id: Option<String>,
    pub status: TripStatus,
    pub passengers: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrived_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    pub synced: bool,
}

impl Record for Inspection {
    const TYPE: ItemType = ItemType::Inspection;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unsynced(&self) -> bool {
        !self.synced
    }
}

impl Record for FuelLog {
    const TYPE: ItemType = ItemType::FuelLog;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unsynced(&self) -> bool {
        !self.synced
    }
}

impl Record for Breakdown {
    const TYPE: ItemType = ItemType::Breakdown;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unsynced(&self) -> bool {
        !self.synced
    }
}

impl Record for Checkin {
    const TYPE: ItemType = ItemType::Checkin;

    fn id(&self) -> &str {
        &self.id
    }

    /// Boarded passengers without a boarding timestamp are still pending.
    fn is_unsynced(&self) -> bool {
        self.boarded && self.boarded_at.is_none()
    }
}

impl Record for ShiftUpdate {
    const TYPE: ItemType = ItemType::Shift;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unsynced(&self) -> bool {
        !self.synced
    }
}

impl Record for TripUpdate {
    const TYPE: ItemType = ItemType::Trip;

    fn id(&self) -> &str {
        &self.id
    }

    fn is_unsynced(&self) -> bool {
        !self.synced
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
