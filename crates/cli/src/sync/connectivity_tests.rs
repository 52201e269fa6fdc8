// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use yare::parameterized;

/// Probe whose answer is set by the test.
struct FlagProbe(AtomicBool);

impl Probe for FlagProbe {
    fn check(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { self.0.load(Ordering::SeqCst) })
    }
}

#[test]
fn point_query_reflects_initial_state() {
    assert!(ConnectivityMonitor::new(true).is_online());
    assert!(!ConnectivityMonitor::new(false).is_online());
}

#[test]
fn set_online_reports_real_transitions_only() {
    let monitor = ConnectivityMonitor::new(false);

    assert!(!monitor.set_online(false));
    assert!(monitor.set_online(true));
    assert!(!monitor.set_online(true));
    assert!(monitor.is_online());
}

#[tokio::test]
async fn subscriber_sees_each_transition() {
    let monitor = ConnectivityMonitor::new(false);
    let mut rx = monitor.subscribe();

    monitor.set_online(true);
    rx.changed().await.unwrap();
    assert!(*rx.borrow_and_update());

    monitor.set_online(false);
    rx.changed().await.unwrap();
    assert!(!*rx.borrow_and_update());
}

#[tokio::test]
async fn repeated_state_does_not_notify() {
    let monitor = ConnectivityMonitor::new(true);
    let rx = monitor.subscribe();

    monitor.set_online(true);

    assert!(!rx.has_changed().unwrap());
}

#[tokio::test]
async fn refresh_applies_probe_result() {
    let monitor = ConnectivityMonitor::new(false);
    let probe = FlagProbe(AtomicBool::new(true));

    assert!(monitor.refresh(&probe).await);
    assert!(monitor.is_online());
}

#[tokio::test]
async fn probe_loop_tracks_probe_until_cancelled() {
    let monitor = ConnectivityMonitor::new(false);
    let probe = Arc::new(FlagProbe(AtomicBool::new(true)));
    let cancel = CancellationToken::new();
    let mut rx = monitor.subscribe();

    let handle = spawn_probe_loop(
        Arc::clone(&monitor),
        probe.clone(),
        Duration::from_millis(10),
        cancel.clone(),
    );

    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(monitor.is_online());

    probe.0.store(false, Ordering::SeqCst);
    tokio::time::timeout(Duration::from_secs(2), rx.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(!monitor.is_online());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn tcp_probe_detects_listener() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let probe = TcpProbe::new(addr.to_string(), Duration::from_secs(1));

    assert!(probe.check().await);

    drop(listener);
    assert!(!probe.check().await);
}

#[parameterized(
    explicit_port = { "ws://dispatch.example:7890", "dispatch.example:7890" },
    default_ws = { "ws://dispatch.example/replay", "dispatch.example:80" },
    default_wss = { "wss://dispatch.example?x=1", "dispatch.example:443" },
    userinfo = { "ws://user@10.0.0.2:9000/", "10.0.0.2:9000" },
    ipv6 = { "ws://[::1]:7890", "[::1]:7890" },
    ipv6_no_port = { "ws://[::1]/", "[::1]:80" },
)]
fn tcp_probe_for_url(url: &str, expected: &str) {
    let probe = TcpProbe::for_url(url, Duration::from_secs(1)).unwrap();
    assert_eq!(probe.addr(), expected);
}

#[parameterized(
    http = { "http://dispatch.example" },
    no_host = { "ws:///path" },
    garbage = { "dispatch" },
)]
fn tcp_probe_rejects_url(url: &str) {
    assert!(TcpProbe::for_url(url, Duration::from_secs(1)).is_none());
}
