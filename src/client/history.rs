//! History Loader
//!
//! One-shot fetch of a room's message snapshot from
//! `GET /api/rooms/{slug}/`. The room view calls it once, when it is
//! entered; nothing re-invokes it afterwards.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::client::config::Config;
use crate::shared::error::SyncError;
use crate::shared::message::{Message, MessageOrigin, RawInboundMessage};
use crate::shared::room::{RoomId, RoomInfo};

/// Fetches the seed for a room's timeline
#[async_trait]
pub trait HistoryLoader: Send + Sync + 'static {
    async fn load(&self, room: &RoomId) -> Result<HistorySnapshot, SyncError>;
}

/// A room's history as of the fetch, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub room: Option<RoomInfo>,
    pub messages: Vec<Message>,
}

/// Body of the room detail endpoint
///
/// Entries are kept as raw JSON so one malformed entry drops only itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoomDetailResponse {
    #[serde(default)]
    pub room: Option<RoomInfo>,
    #[serde(default)]
    pub messages: Vec<serde_json::Value>,
    /// The requesting user as the server sees them
    #[serde(default)]
    pub username: Option<String>,
}

impl RoomDetailResponse {
    /// Normalize the entries, dropping malformed ones
    pub fn into_snapshot(self, room: &RoomId) -> HistorySnapshot {
        let received_at = Utc::now();
        let total = self.messages.len();
        let messages: Vec<Message> = self
            .messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                let normalized = serde_json::from_value::<RawInboundMessage>(value)
                    .map_err(SyncError::from)
                    .and_then(|raw| raw.normalize(MessageOrigin::History, received_at));
                match normalized {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::warn!("[HISTORY] Dropping entry {} of room {}: {}", index, room, e);
                        None
                    }
                }
            })
            .collect();

        if messages.len() < total {
            tracing::warn!(
                "[HISTORY] Kept {} of {} history entries for room {}",
                messages.len(),
                total,
                room
            );
        }

        HistorySnapshot {
            room: self.room,
            messages,
        }
    }
}

/// History loader backed by the REST endpoint
#[derive(Debug, Clone)]
pub struct HttpHistoryLoader {
    config: Config,
    client: Client,
}

impl HttpHistoryLoader {
    pub fn new(config: Config) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("[HISTORY] Could not build HTTP client ({}), using defaults", e);
                Client::new()
            });
        Self { config, client }
    }

    pub fn with_client(config: Config, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl HistoryLoader for HttpHistoryLoader {
    async fn load(&self, room: &RoomId) -> Result<HistorySnapshot, SyncError> {
        let url = self.config.history_url(room);
        tracing::info!("[HISTORY] Fetching {}", url);

        let mut request = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .timeout(self.config.request_timeout());
        for (name, value) in self.config.auth_headers() {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SyncError::history(
                        room.as_str(),
                        format!("timed out after {:?}", self.config.request_timeout()),
                    )
                } else {
                    SyncError::history(room.as_str(), format!("network error: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let reason = match status.as_u16() {
                404 => "room not found".to_string(),
                401 | 403 => format!("not authorized ({})", status),
                _ => format!("request failed: {}", status),
            };
            return Err(SyncError::history(room.as_str(), reason));
        }

        let detail = response
            .json::<RoomDetailResponse>()
            .await
            .map_err(|e| SyncError::history(room.as_str(), format!("failed to parse response: {}", e)))?;

        let snapshot = detail.into_snapshot(room);
        tracing::info!(
            "[HISTORY] Loaded {} messages for room {}",
            snapshot.messages.len(),
            room
        );
        Ok(snapshot)
    }
}
