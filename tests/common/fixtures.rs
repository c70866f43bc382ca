//! Fixtures shared by the integration and property tests

use std::time::Duration;

use chrono::{TimeZone, Utc};
use roomchat::client::{Config, RoomHandle, RoomSnapshot};
use roomchat::shared::{AppConfig, AppConfigBuilder, Identity, Message, MessageId, MessageOrigin, ReconnectSettings, RoomId};
use serde_json::{json, Value};

pub const TEST_TOKEN: &str = "test-token";

pub fn alice() -> Identity {
    Identity::new("1", "alice").unwrap()
}

pub fn general() -> RoomId {
    RoomId::new("general").unwrap()
}

/// Reconnect quickly and deterministically
pub fn fast_reconnect() -> ReconnectSettings {
    ReconnectSettings {
        max_attempts: 5,
        base_delay_ms: 20,
        max_delay_ms: 100,
        jitter: 0.0,
    }
}

/// Config pointing at a wiremock history server and a mock channel server
pub fn test_config(server_url: &str, channel_url: &str) -> Config {
    Config::with_builder(test_builder(server_url, channel_url)).unwrap()
}

/// Like `test_config`, with a short limit on the history fetch and handshake
pub fn test_config_with_timeout(server_url: &str, channel_url: &str, timeout_ms: u64) -> Config {
    Config::with_builder(test_builder(server_url, channel_url).request_timeout_ms(timeout_ms)).unwrap()
}

fn test_builder(server_url: &str, channel_url: &str) -> AppConfigBuilder {
    AppConfig::builder()
        .server_url(server_url)
        .channel_url(channel_url)
        .token(TEST_TOKEN)
        .identity(alice())
        .reconnect(fast_reconnect())
}

pub fn message(id: Option<&str>, author: &str, body: &str, origin: MessageOrigin) -> Message {
    Message::new(
        id.map(MessageId::new),
        author,
        body,
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
        origin,
    )
    .unwrap()
}

/// A history entry the way the room detail endpoint serializes it
pub fn history_entry(id: i64, author: &str, content: &str) -> Value {
    json!({
        "id": id,
        "room": 1,
        "user": {"id": id, "username": author},
        "content": content,
        "timestamp": format!("2024-01-01T09:00:{:02}.000000Z", id % 60),
    })
}

/// Body of `GET /api/rooms/{slug}/`
pub fn room_detail(slug: &str, messages: Vec<Value>) -> Value {
    json!({
        "room": {
            "id": 1,
            "name": "General",
            "slug": slug,
            "description": "",
            "created_by": {"id": 1, "username": "alice"},
            "created_at": "2024-01-01T00:00:00Z",
        },
        "messages": messages,
        "username": "alice",
    })
}

/// A live frame the way the room consumer broadcasts it
pub fn live_frame(id: i64, author: &str, body: &str) -> String {
    json!({
        "id": id,
        "message": body,
        "username": author,
        "timestamp": "2024-01-01T10:00:00.000000",
    })
    .to_string()
}

/// Wait until a published snapshot satisfies `pred`
pub async fn wait_for(handle: &mut RoomHandle, pred: impl Fn(&RoomSnapshot) -> bool) -> RoomSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            let snapshot = handle.snapshot();
            if pred(&snapshot) {
                return snapshot;
            }
            if !handle.changed().await {
                return handle.snapshot();
            }
        }
    })
    .await
    .expect("timed out waiting for room snapshot")
}

/// Poll `check` until it holds
pub async fn eventually(mut check: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition never held")
}
