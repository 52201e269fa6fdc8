// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network reachability for the sync engine.
//!
//! The engine only needs two things from this module: a point query
//! ([`ConnectivityMonitor::is_online`]) and a subscription that fires on
//! every transition ([`ConnectivityMonitor::subscribe`]). How reachability
//! is detected is pluggable through [`Probe`]; [`spawn_probe_loop`] polls a
//! probe in the background and feeds the monitor.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Shared reachability state.
pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Create a monitor with a known initial state.
    pub fn new(online: bool) -> Arc<Self> {
        let (tx, _rx) = watch::channel(online);
        Arc::new(ConnectivityMonitor { tx })
    }

    /// Point-in-time reachability.
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Record the current reachability.
    ///
    /// Subscribers are notified only on a real transition. Returns whether
    /// the state changed.
    pub fn set_online(&self, online: bool) -> bool {
        let changed = self.tx.send_if_modified(|current| {
            if *current == online {
                false
            } else {
                *current = online;
                true
            }
        });
        if changed {
            tracing::info!(online, "connectivity changed");
        }
        changed
    }

    /// Subscribe to transitions. Dropping the receiver unsubscribes.
    ///
    /// The receiver starts with the current state marked as seen, so
    /// `changed()` resolves on the next transition only.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Run one probe and record its result.
    pub async fn refresh(&self, probe: &dyn Probe) -> bool {
        let online = probe.check().await;
        self.set_online(online);
        online
    }
}

/// A reachability check.
pub trait Probe: Send + Sync {
    /// Returns true if the remote side looks reachable.
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;
}

/// Probe that opens (and immediately drops) a TCP connection.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    /// Probe a `host:port` address.
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        TcpProbe {
            addr: addr.into(),
            timeout,
        }
    }

    /// Probe the host behind a `ws://` or `wss://` URL.
    ///
    /// Returns `None` for other schemes or a URL without a host.
    pub fn for_url(url: &str, timeout: Duration) -> Option<Self> {
        let (rest, default_port) = if let Some(rest) = url.strip_prefix("ws://") {
            (rest, 80)
        } else if let Some(rest) = url.strip_prefix("wss://") {
            (rest, 443)
        } else {
            return None;
        };
        let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
        let authority = authority.rsplit('@').next().unwrap_or_default();
        if authority.is_empty() {
            return None;
        }
        let has_port = match authority.rfind(':') {
            Some(idx) => !authority[idx..].contains(']'),
            None => false,
        };
        let addr = if has_port {
            authority.to_string()
        } else {
            format!("{}:{}", authority, default_port)
        };
        Some(Self::new(addr, timeout))
    }

    /// The `host:port` this probe connects to.
    pub fn addr(&self) -> &str {
        &self.addr
    }
}

impl Probe for TcpProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move {
            let connect = tokio::net::TcpStream::connect(self.addr.as_str());
            match tokio::time::timeout(self.timeout, connect).await {
                Ok(Ok(_stream)) => true,
                Ok(Err(e)) => {
                    tracing::debug!(addr = %self.addr, "probe failed: {}", e);
                    false
                }
                Err(_) => {
                    tracing::debug!(addr = %self.addr, "probe timed out");
                    false
                }
            }
        })
    }
}

/// Poll `probe` every `interval` until `cancel` fires.
///
/// The first check runs immediately.
pub fn spawn_probe_loop(
    monitor: Arc<ConnectivityMonitor>,
    probe: Arc<dyn Probe>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let check = monitor.refresh(probe.as_ref());
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = check => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
        }
    })
}

#[cfg(test)]
#[path = "connectivity_tests.rs"]
mod tests;
