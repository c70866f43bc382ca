//! History loader against a mock room detail endpoint

use pretty_assertions::assert_eq;
use roomchat::client::{Config, HistoryLoader, HttpHistoryLoader};
use roomchat::shared::{AppConfig, MessageId, MessageOrigin, SyncError};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::*;

fn loader(server: &MockServer) -> HttpHistoryLoader {
    HttpHistoryLoader::new(test_config(&server.uri(), "ws://127.0.0.1:1"))
}

#[tokio::test]
async fn test_load_normalizes_history_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/general/"))
        .and(header("Authorization", format!("Bearer {}", TEST_TOKEN).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_detail(
            "general",
            vec![history_entry(1, "carol", "first"), history_entry(2, "dave", "second")],
        )))
        .expect(1)
        .mount(&server)
        .await;

    let snapshot = crate::assert_ok!(loader(&server).load(&general()).await);

    crate::assert_bodies!(snapshot.messages, ["first", "second"]);
    assert_eq!(snapshot.messages[0].id, Some(MessageId::new("1")));
    assert_eq!(snapshot.messages[1].author_name, "dave");
    assert!(snapshot.messages.iter().all(|m| m.origin == MessageOrigin::History));
    assert_eq!(snapshot.room.unwrap().display_name(), "General");
}

#[tokio::test]
async fn test_load_sends_session_cookie() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/general/"))
        .and(header("Cookie", "sessionid=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(room_detail("general", Vec::new())))
        .expect(1)
        .mount(&server)
        .await;

    let config = Config::with_builder(
        AppConfig::builder()
            .server_url(server.uri())
            .session_cookie("sessionid=abc"),
    )
    .unwrap();
    let snapshot = crate::assert_ok!(HttpHistoryLoader::new(config).load(&general()).await);
    assert!(snapshot.messages.is_empty());
}

#[tokio::test]
async fn test_load_drops_malformed_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/general/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "messages": [
                {"id": 1, "content": "   ", "user": {"username": "carol"}},
                history_entry(2, "carol", "kept"),
                {"id": 3, "content": "orphan"},
            ]
        })))
        .mount(&server)
        .await;

    let snapshot = crate::assert_ok!(loader(&server).load(&general()).await);
    crate::assert_bodies!(snapshot.messages, ["kept"]);
}

#[tokio::test]
async fn test_missing_room_is_history_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/gone/"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "Not found."})))
        .mount(&server)
        .await;

    let room = roomchat::shared::RoomId::new("gone").unwrap();
    match loader(&server).load(&room).await {
        Err(SyncError::HistoryUnavailable { room, reason }) => {
            assert_eq!(room, "gone");
            crate::assert_contains!(reason, "not found");
        }
        other => panic!("Expected HistoryUnavailable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_body_is_history_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/general/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    crate::assert_err!(
        loader(&server).load(&general()).await,
        SyncError::HistoryUnavailable { .. }
    );
}

#[tokio::test]
async fn test_unreachable_server_is_history_unavailable() {
    // nothing listens on port 1
    let loader = HttpHistoryLoader::new(test_config("http://127.0.0.1:1", "ws://127.0.0.1:1"));
    crate::assert_err!(loader.load(&general()).await, SyncError::HistoryUnavailable { .. });
}

#[tokio::test]
async fn test_load_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/rooms/general/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(room_detail("general", Vec::new()))
                .set_delay(std::time::Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let loader = HttpHistoryLoader::new(test_config_with_timeout(&server.uri(), "ws://127.0.0.1:1", 200));
    match loader.load(&general()).await {
        Err(SyncError::HistoryUnavailable { reason, .. }) => crate::assert_contains!(reason, "timed out"),
        other => panic!("Expected HistoryUnavailable, got {:?}", other),
    }
}
