// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between a device and the dispatch server.
//!
//! The protocol is request/response:
//! - The device replays queued mutations and fetches the server's copy of
//!   records that a remote actor may also change (check-ins, trips)
//! - The server answers each request with the same `request_id`
//!
//! `Ping`/`Pong` are keepalives and `Error` reports a connection-level
//! problem that is not tied to a request.

use serde::{Deserialize, Serialize};

use crate::item::{Action, Payload};
use crate::record::{Checkin, TripUpdate};

/// Messages sent from the device to the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Replay one queued mutation.
    ///
    /// `item_id` lets the server drop a replay it has already applied.
    Replay {
        request_id: u64,
        item_id: String,
        action: Action,
        payload: Payload,
    },

    /// Ask for the server's copy of a passenger check-in.
    FetchCheckin {
        request_id: u64,
        trip_id: String,
        passenger_id: String,
    },

    /// Ask for the server's copy of a trip.
    FetchTrip { request_id: u64, trip_id: String },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from the server to the device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The replay was applied.
    Ack { request_id: u64 },

    /// The replay was refused; the item stays queued.
    Rejected { request_id: u64, message: String },

    /// Response to FetchCheckin. `None` when the server has no record.
    Checkin {
        request_id: u64,
        checkin: Option<Checkin>,
    },

    /// Response to FetchTrip. `None` when the server has no record.
    Trip {
        request_id: u64,
        trip: Option<TripUpdate>,
    },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Creates a Replay message.
    pub fn replay(
        request_id: u64,
        item_id: impl Into<String>,
        action: Action,
        payload: Payload,
    ) -> Self {
        ClientMessage::Replay {
            request_id,
            item_id: item_id.into(),
            action,
            payload,
        }
    }

    /// Creates a FetchCheckin message.
    pub fn fetch_checkin(
        request_id: u64,
        trip_id: impl Into<String>,
        passenger_id: impl Into<String>,
    ) -> Self {
        ClientMessage::FetchCheckin {
            request_id,
            trip_id: trip_id.into(),
            passenger_id: passenger_id.into(),
        }
    }

    /// Creates a FetchTrip message.
    pub fn fetch_trip(request_id: u64, trip_id: impl Into<String>) -> Self {
        ClientMessage::FetchTrip {
            request_id,
            trip_id: trip_id.into(),
        }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// The request id the server must echo, if this message expects a response.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ClientMessage::Replay { request_id, .. }
            | ClientMessage::FetchCheckin { request_id, .. }
            | ClientMessage::FetchTrip { request_id, .. } => Some(*request_id),
            ClientMessage::Ping { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Ack message.
    pub fn ack(request_id: u64) -> Self {
        ServerMessage::Ack { request_id }
    }

    /// Creates a Rejected message.
    pub fn rejected(request_id: u64, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            request_id,
            message: message.into(),
        }
    }

    /// Creates a Checkin response.
    pub fn checkin(request_id: u64, checkin: Option<Checkin>) -> Self {
        ServerMessage::Checkin {
            request_id,
            checkin,
        }
    }

    /// Creates a Trip response.
    pub fn trip(request_id: u64, trip: Option<TripUpdate>) -> Self {
        ServerMessage::Trip { request_id, trip }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }

    /// The request this message answers, if any.
    pub fn request_id(&self) -> Option<u64> {
        match self {
            ServerMessage::Ack { request_id }
            | ServerMessage::Rejected { request_id, .. }
            | ServerMessage::Checkin { request_id, .. }
            | ServerMessage::Trip { request_id, .. } => Some(*request_id),
            ServerMessage::Pong { .. } | ServerMessage::Error { .. } => None,
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
