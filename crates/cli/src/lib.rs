// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tsync - Offline mutation queue and sync engine for vehicle tablets.
//!
//! This crate provides the sync engine and the `tripsync` CLI on top of
//! the record store and sync queue from `tsync-core`.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - Drains the sync queue against the remote service
//! - [`sync::ConnectivityMonitor`] - Online/offline state with change events
//! - [`sync::StatusHub`] - Observable sync status for UI components
//! - [`Config`] - Device configuration (device id, remote, sync tunables)
//! - [`Error`] - Error types for all operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use tsync::sync::{ConnectivityMonitor, SyncEngine, SyncOptions, WebSocketRemote};
//!
//! let monitor = ConnectivityMonitor::new(false);
//! let engine = SyncEngine::new(queue, store, remote, monitor.clone(), SyncOptions::default());
//! let _watch = engine.clone().watch_connectivity();
//! let _sub = engine.subscribe(|status| println!("{}%", status.progress));
//! monitor.set_online(true); // drains automatically
//! ```

mod cli;
mod commands;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat, RecordCommand};
pub use config::{find_work_dir, init_work_dir, Config};
pub use error::{Error, Result};

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    // `run` installs its own file logger
    if !matches!(command, Command::Run) {
        setup_stderr_logging();
    }

    match command {
        Command::Init {
            device,
            remote,
            path,
        } => commands::init::run(device, remote, path),
        Command::Record(record) => match record {
            RecordCommand::Add { kind, json } => commands::record::add(kind, &json),
            RecordCommand::Update { kind, id, json } => {
                commands::record::update(kind, &id, &json)
            }
            RecordCommand::Delete { kind, id } => commands::record::delete(kind, &id),
            RecordCommand::List {
                kind,
                unsynced,
                output,
            } => commands::record::list(kind, unsynced, output),
        },
        Command::Queue { all, output } => commands::queue::run(all, output),
        Command::Sync { output } => commands::sync::run(output),
        Command::Status { output } => commands::status::run(output),
        Command::Run => commands::run::run(),
    }
}

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Log warnings and errors to stderr for one-shot commands.
fn setup_stderr_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter("warn"))
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to a file without ANSI colors, falling back to stderr.
pub(crate) fn setup_file_logging(log_path: &Path) {
    let filter = env_filter("info");

    // Try to open log file, fall back to stderr
    if let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
