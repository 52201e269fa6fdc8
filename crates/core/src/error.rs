// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for tsync-core operations.

use thiserror::Error;

/// All possible errors that can occur in tsync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown record kind: '{0}'\n  hint: valid kinds are: inspection, fuel_log, breakdown, checkin, shift, trip")]
    UnknownKind(String),

    #[error("invalid action: '{0}'\n  hint: valid actions are: create, update, delete")]
    InvalidAction(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),

    #[error("failed to lock {path}: {source}")]
    Lock {
        path: String,
        source: std::io::Error,
    },
}

/// A specialized Result type for tsync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
