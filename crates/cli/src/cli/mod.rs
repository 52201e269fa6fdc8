// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};
use tsync_core::ItemType;

/// Parse a record kind (`fuel_log`, `fuel-log`, `checkin`, ...).
fn parse_kind(s: &str) -> Result<ItemType, String> {
    s.parse::<ItemType>().map_err(|e| e.to_string())
}

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "tripsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline mutation queue and sync engine for vehicle tablets")]
#[command(
    long_about = "Offline mutation queue and sync engine for vehicle tablets.\n\n\
    Records are written locally first and queued; queued mutations are replayed\n\
    against the dispatch service whenever it is reachable."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize tripsync in the current directory
    Init {
        /// Device identifier used in logs
        #[arg(long, default_value = "device", value_parser = non_empty_string)]
        device: String,

        /// Remote replay service URL (ws:// or wss://)
        #[arg(long)]
        remote: Option<String>,

        /// Directory to initialize (defaults to the current directory)
        #[arg(long)]
        path: Option<String>,
    },

    /// Record a local mutation and queue it for sync
    #[command(subcommand)]
    Record(RecordCommand),

    /// List queued mutations
    Queue {
        /// Include items already synced but not yet compacted
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Replay the queue now
    Sync {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Show pending sync counts and the last successful sync
    Status {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Stay running and sync whenever the remote becomes reachable
    Run,
}

#[derive(Subcommand)]
pub enum RecordCommand {
    /// Store a new record and queue its creation
    Add {
        /// Record kind: inspection, fuel_log, breakdown, checkin, shift, trip
        #[arg(value_parser = parse_kind)]
        kind: ItemType,

        /// Record as a JSON object (must include "id")
        #[arg(value_parser = non_empty_string)]
        json: String,
    },

    /// Merge fields into a stored record and queue the update
    Update {
        #[arg(value_parser = parse_kind)]
        kind: ItemType,

        id: String,

        /// Fields to change as a JSON object
        #[arg(value_parser = non_empty_string)]
        json: String,
    },

    /// Remove a stored record and queue the deletion
    Delete {
        #[arg(value_parser = parse_kind)]
        kind: ItemType,

        id: String,
    },

    /// List stored records of one kind
    List {
        #[arg(value_parser = parse_kind)]
        kind: ItemType,

        /// Only records not yet synced
        #[arg(long)]
        unsynced: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },
}
