// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Producer path: write the local record, then queue the mutation.
//!
//! The record store always holds the latest local state; the queue holds
//! one item per mutation, stamped through a monotonic clock so mutations
//! from one process replay in the order they were made.

use serde_json::{Map, Value};
use tsync_core::{
    Action, Breakdown, Checkin, ClockSource, FuelLog, Inspection, ItemType, MonotonicClock,
    Payload, Record, RecordStore, ShiftUpdate, SyncQueueItem, TripUpdate,
};

use crate::cli::OutputFormat;
use crate::error::{Error, Result};

use super::Workspace;

pub fn add(kind: ItemType, json: &str) -> Result<()> {
    let ws = Workspace::open()?;
    let item = add_impl(&ws, &MonotonicClock::new(), kind, json)?;
    print_queued(&item);
    Ok(())
}

pub fn update(kind: ItemType, id: &str, json: &str) -> Result<()> {
    let ws = Workspace::open()?;
    let item = update_impl(&ws, &MonotonicClock::new(), kind, id, json)?;
    print_queued(&item);
    Ok(())
}

pub fn delete(kind: ItemType, id: &str) -> Result<()> {
    let ws = Workspace::open()?;
    let item = delete_impl(&ws, &MonotonicClock::new(), kind, id)?;
    print_queued(&item);
    Ok(())
}

pub fn list(kind: ItemType, unsynced: bool, output: OutputFormat) -> Result<()> {
    let ws = Workspace::open()?;
    let records = list_impl(&ws.store, kind, unsynced)?;
    match output {
        OutputFormat::Json => {
            for record in &records {
                println!("{}", serde_json::to_string(&record.body)?);
            }
        }
        OutputFormat::Text => {
            if records.is_empty() {
                println!("No {} records", kind);
            }
            for record in &records {
                let state = if record.pending { "pending" } else { "synced" };
                println!("{}  [{}]", record.id, state);
            }
        }
    }
    Ok(())
}

fn print_queued(item: &SyncQueueItem) {
    println!(
        "Queued {} {} as {}",
        item.label(),
        item.payload.record_id(),
        item.id
    );
}

/// Store a new record and queue its creation.
pub(crate) fn add_impl(
    ws: &Workspace,
    clock: &dyn ClockSource,
    kind: ItemType,
    json: &str,
) -> Result<SyncQueueItem> {
    let mut fields = parse_object(json)?;
    fields.insert("synced".to_string(), Value::Bool(false));
    let payload = Payload::from_parts(kind, Value::Object(fields))?;

    let id = payload.record_id();
    if id.trim().is_empty() {
        return Err(Error::InvalidInput(format!(
            "{} record is missing an \"id\"",
            kind
        )));
    }
    if find_record(&ws.store, kind, id).is_some() {
        return Err(Error::InvalidInput(format!("{} {} already exists", kind, id)));
    }

    ws.store.append(kind.store_key(), &payload.data()?)?;
    enqueue(ws, clock, payload, Action::Create)
}

/// Merge fields into a stored record and queue the update.
pub(crate) fn update_impl(
    ws: &Workspace,
    clock: &dyn ClockSource,
    kind: ItemType,
    id: &str,
    json: &str,
) -> Result<SyncQueueItem> {
    let mut partial = parse_object(json)?;
    if let Some(new_id) = partial.get("id") {
        if new_id.as_str() != Some(id) {
            return Err(Error::InvalidInput("a record's id cannot change".to_string()));
        }
    }
    partial.insert("synced".to_string(), Value::Bool(false));

    let Some(Value::Object(mut merged)) = find_record(&ws.store, kind, id) else {
        return Err(not_found(kind, id));
    };
    for (field, value) in &partial {
        merged.insert(field.clone(), value.clone());
    }
    // Decode before writing
    let payload = Payload::from_parts(kind, Value::Object(merged))?;

    if !ws.store.merge(kind.store_key(), id, &partial)? {
        return Err(not_found(kind, id));
    }
    enqueue(ws, clock, payload, Action::Update)
}

/// Remove a stored record and queue the deletion.
pub(crate) fn delete_impl(
    ws: &Workspace,
    clock: &dyn ClockSource,
    kind: ItemType,
    id: &str,
) -> Result<SyncQueueItem> {
    let record = find_record(&ws.store, kind, id).ok_or_else(|| not_found(kind, id))?;
    let payload = Payload::from_parts(kind, record)?;

    ws.store.remove(kind.store_key(), id)?;
    enqueue(ws, clock, payload, Action::Delete)
}

/// A stored record as `record list` shows it.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ListedRecord {
    pub id: String,
    /// Whether its latest state still needs to be pushed.
    pub pending: bool,
    pub body: Value,
}

/// Stored records of one kind, in insertion order.
///
/// What counts as pending is up to the record type: check-ins are pending
/// while boarded without a boarding time.
pub(crate) fn list_impl(
    store: &RecordStore,
    kind: ItemType,
    unsynced_only: bool,
) -> Result<Vec<ListedRecord>> {
    match kind {
        ItemType::Inspection => listed::<Inspection>(store, unsynced_only),
        ItemType::FuelLog => listed::<FuelLog>(store, unsynced_only),
        ItemType::Breakdown => listed::<Breakdown>(store, unsynced_only),
        ItemType::Checkin => listed::<Checkin>(store, unsynced_only),
        ItemType::Shift => listed::<ShiftUpdate>(store, unsynced_only),
        ItemType::Trip => listed::<TripUpdate>(store, unsynced_only),
    }
}

fn listed<R: Record>(store: &RecordStore, unsynced_only: bool) -> Result<Vec<ListedRecord>> {
    let records = if unsynced_only {
        store.unsynced::<R>()
    } else {
        store.all::<R>()
    };
    records
        .into_iter()
        .map(|record| {
            Ok(ListedRecord {
                id: record.id().to_string(),
                pending: record.is_unsynced(),
                body: serde_json::to_value(&record)?,
            })
        })
        .collect()
}

fn enqueue(
    ws: &Workspace,
    clock: &dyn ClockSource,
    payload: Payload,
    action: Action,
) -> Result<SyncQueueItem> {
    let item = SyncQueueItem::new(payload, action, clock.now());
    ws.queue.enqueue(&item)?;
    tracing::debug!(id = %item.id, label = %item.label(), "queued mutation");
    Ok(item)
}

fn find_record(store: &RecordStore, kind: ItemType, id: &str) -> Option<Value> {
    store
        .read_all(kind.store_key())
        .into_iter()
        .find(|record| record.get("id").and_then(Value::as_str) == Some(id))
}

fn parse_object(json: &str) -> Result<Map<String, Value>> {
    match serde_json::from_str::<Value>(json)? {
        Value::Object(fields) => Ok(fields),
        _ => Err(Error::InvalidInput("expected a JSON object".to_string())),
    }
}

fn not_found(kind: ItemType, id: &str) -> Error {
    Error::RecordNotFound {
        kind: kind.to_string(),
        id: id.to_string(),
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
