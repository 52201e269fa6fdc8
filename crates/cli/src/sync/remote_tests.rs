// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the WebSocket remote against an in-process server.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use std::sync::Arc;
use tokio::net::TcpListener;
use tsync_core::{FuelLog, TripStatus};

type Handler = Arc<dyn Fn(ClientMessage) -> Vec<ServerMessage> + Send + Sync>;

/// Start a server that answers each client message with `handler`'s replies.
async fn spawn_server(handler: Handler) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let Ok(ws) = tokio_tungstenite::accept_async(stream).await else {
                    return;
                };
                let (mut sink, mut stream) = ws.split();
                while let Some(Ok(msg)) = stream.next().await {
                    let Message::Text(text) = msg else { continue };
                    let request = ClientMessage::from_json(text.as_str()).unwrap();
                    for reply in handler(request) {
                        let json = reply.to_json().unwrap();
                        if sink.send(Message::Text(json.into())).await.is_err() {
                            return;
                        }
                    }
                }
            });
        }
    });

    format!("ws://{}", addr)
}

fn remote(url: &str) -> WebSocketRemote {
    WebSocketRemote::new(url, Duration::from_secs(2))
}

fn fuel() -> Payload {
    Payload::FuelLog(FuelLog {
        id: "fl-1".into(),
        liters: 40.0,
        ..Default::default()
    })
}

#[tokio::test]
async fn push_is_acknowledged() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::Replay { request_id, .. } => vec![ServerMessage::ack(request_id)],
        _ => vec![],
    }))
    .await;
    let remote = remote(&url);

    remote
        .push("q-1".into(), Action::Create, fuel())
        .await
        .unwrap();

    assert!(remote.is_connected().await);
}

#[tokio::test]
async fn rejection_carries_server_message() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::Replay { request_id, .. } => {
            vec![ServerMessage::rejected(request_id, "vehicle unknown")]
        }
        _ => vec![],
    }))
    .await;

    let err = remote(&url)
        .push("q-1".into(), Action::Create, fuel())
        .await
        .unwrap_err();

    assert_eq!(err, RemoteError::Rejected("vehicle unknown".into()));
    assert_eq!(err.to_string(), "rejected: vehicle unknown");
}

#[tokio::test]
async fn stale_responses_are_skipped() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::FetchTrip {
            request_id,
            trip_id,
        } => vec![
            ServerMessage::pong(1),
            ServerMessage::ack(request_id + 100),
            ServerMessage::trip(
                request_id,
                Some(TripUpdate {
                    id: trip_id,
                    status: TripStatus::Departed,
                    ..Default::default()
                }),
            ),
        ],
        _ => vec![],
    }))
    .await;

    let trip = remote(&url).fetch_trip("t-1".into()).await.unwrap().unwrap();

    assert_eq!(trip.id, "t-1");
    assert_eq!(trip.status, TripStatus::Departed);
}

#[tokio::test]
async fn fetch_checkin_may_be_absent() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::FetchCheckin { request_id, .. } => {
            vec![ServerMessage::checkin(request_id, None)]
        }
        _ => vec![],
    }))
    .await;

    let checkin = remote(&url)
        .fetch_checkin("t-1".into(), "p-1".into())
        .await
        .unwrap();

    assert!(checkin.is_none());
}

#[tokio::test]
async fn connection_level_error_fails_request() {
    let url = spawn_server(Arc::new(|_| vec![ServerMessage::error("maintenance")])).await;

    let err = remote(&url).fetch_trip("t-1".into()).await.unwrap_err();

    assert_eq!(err, RemoteError::Server("maintenance".into()));
}

#[tokio::test]
async fn unexpected_response_is_protocol_error() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::Replay { request_id, .. } => vec![ServerMessage::trip(request_id, None)],
        _ => vec![],
    }))
    .await;

    let err = remote(&url)
        .push("q-1".into(), Action::Update, fuel())
        .await
        .unwrap_err();

    assert!(matches!(err, RemoteError::Protocol(_)));
}

#[tokio::test]
async fn connect_failure_is_reported() {
    // Bind then drop to get a port nobody listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = remote(&format!("ws://{}", addr));
    let err = remote.connect().await.unwrap_err();

    assert!(matches!(err, RemoteError::ConnectionFailed(_)));
    assert!(!remote.is_connected().await);
}

#[tokio::test]
async fn disconnect_then_reconnect_on_next_request() {
    let url = spawn_server(Arc::new(|msg| match msg {
        ClientMessage::Replay { request_id, .. } => vec![ServerMessage::ack(request_id)],
        _ => vec![],
    }))
    .await;
    let remote = remote(&url);

    remote.connect().await.unwrap();
    remote.disconnect().await;
    assert!(!remote.is_connected().await);

    remote
        .push("q-2".into(), Action::Create, fuel())
        .await
        .unwrap();
    assert!(remote.is_connected().await);
}
