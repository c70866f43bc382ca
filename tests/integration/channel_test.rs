//! Channel session against the mock room server

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use roomchat::client::{ChannelSession, WsConnector};
use roomchat::shared::{ChannelEvent, MessageId, OutboundFrame};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

use crate::common::*;

async fn next_event(events: &mut UnboundedReceiver<ChannelEvent>) -> ChannelEvent {
    timeout(Duration::from_secs(5), events.recv())
        .await
        .expect("timed out waiting for channel event")
        .expect("channel session ended")
}

fn connector(server: &MockRoomServer) -> Arc<WsConnector> {
    Arc::new(WsConnector::new(test_config("http://127.0.0.1:1", &server.url())))
}

#[tokio::test]
async fn test_connects_to_room_address_with_credentials() {
    let server = MockRoomServer::start().await;
    let (session, mut events) = ChannelSession::open(connector(&server), general());

    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);
    assert!(session.is_open());
    assert_eq!(server.paths(), vec!["/ws/chat/general/".to_string()]);
    assert_eq!(server.auth_headers(), vec![Some(format!("Bearer {}", TEST_TOKEN))]);
}

#[tokio::test]
async fn test_inbound_frames_are_normalized() {
    let server = MockRoomServer::start().await;
    let (_session, mut events) = ChannelSession::open(connector(&server), general());
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    server.push("{not json");
    server.push(r#"{"id": 9, "username": "bob"}"#);
    server.push(live_frame(10, "bob", "hi"));

    match next_event(&mut events).await {
        ChannelEvent::Message(message) => {
            assert_eq!(message.id, Some(MessageId::new("10")));
            assert_eq!(message.body, "hi");
            assert_eq!(message.author_name, "bob");
        }
        other => panic!("Expected message, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_uses_server_field_names() {
    let server = MockRoomServer::start().await;
    let (session, mut events) = ChannelSession::open(connector(&server), general());
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    assert!(session.send(OutboundFrame::new("hello", "alice")));

    // the server echoes the send back with an id
    match next_event(&mut events).await {
        ChannelEvent::Message(message) => {
            assert_eq!(message.body, "hello");
            assert_eq!(message.author_name, "alice");
            assert!(message.id.is_some());
        }
        other => panic!("Expected echo, got {:?}", other),
    }
    let received = server.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0]["message"], "hello");
    assert_eq!(received[0]["username"], "alice");
}

#[tokio::test]
async fn test_dropped_connection_emits_closed() {
    let server = MockRoomServer::start().await;
    let (session, mut events) = ChannelSession::open(connector(&server), general());
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    server.drop_connections();

    assert_matches!(next_event(&mut events).await, ChannelEvent::Closed { .. });
    assert!(!session.is_open());
    assert!(!session.send(OutboundFrame::new("late", "alice")));
    assert!(events.recv().await.is_none());
}

#[tokio::test]
async fn test_rejected_handshake_emits_closed() {
    let server = MockRoomServer::start().await;
    server.reject_handshakes(true);
    let (session, mut events) = ChannelSession::open(connector(&server), general());

    match next_event(&mut events).await {
        ChannelEvent::Closed { reason } => crate::assert_contains!(reason.unwrap(), "credentials"),
        other => panic!("Expected Closed, got {:?}", other),
    }
    assert!(!session.is_open());
    assert_eq!(server.connections(), 0);
}

#[tokio::test]
async fn test_unreachable_server_emits_closed() {
    let connector = Arc::new(WsConnector::new(test_config("http://127.0.0.1:1", "ws://127.0.0.1:1")));
    let (_session, mut events) = ChannelSession::open(connector, general());
    assert_matches!(next_event(&mut events).await, ChannelEvent::Closed { reason: Some(_) });
}

#[tokio::test]
async fn test_stalled_handshake_emits_closed() {
    // accepts TCP connections but never answers the upgrade request
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            held.push(stream);
        }
    });

    let config = test_config_with_timeout("http://127.0.0.1:1", &format!("ws://{}", addr), 200);
    let (session, mut events) = ChannelSession::open(Arc::new(WsConnector::new(config)), general());

    match next_event(&mut events).await {
        ChannelEvent::Closed { reason } => crate::assert_contains!(reason.unwrap(), "timed out"),
        other => panic!("Expected Closed, got {:?}", other),
    }
    assert!(!session.is_open());
    server.abort();
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let server = MockRoomServer::start().await;
    let (mut session, mut events) = ChannelSession::open(connector(&server), general());
    assert_eq!(next_event(&mut events).await, ChannelEvent::Opened);

    session.close();
    session.close();
    session.closed().await;
    assert!(!session.is_open());
    assert!(events.recv().await.is_none());
}
