/**
 * Message Data Structure
 *
 * This module defines the Message struct shown in a room timeline, the raw
 * payload shapes it is normalized from, and the outbound frame sent over the
 * live channel.
 *
 * History entries and live frames name their fields inconsistently
 * (`message` vs `content`, `username` vs `user.username` or `user.author`). Both shapes are
 * resolved here, once, by `RawInboundMessage::normalize`.
 */
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SyncError;
use crate::shared::identity::Identity;

/// Server-assigned message identity
///
/// Numeric ids are kept in their decimal string form so that `10` and `"10"`
/// compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Read an id out of an arbitrary JSON value
    ///
    /// `null`, blank strings and non-scalar values carry no identity.
    fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => Some(Self(n.to_string())),
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a message entered the timeline from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageOrigin {
    /// Part of the history snapshot
    History,
    /// Delivered over the live channel
    Live,
}

/// A chat message as shown in a room timeline
///
/// Messages are immutable once merged; the timeline only ever hands out
/// shared references.
///
/// # Fields
/// * `id` - Server identity, `None` for a message the server has not acknowledged
/// * `author_name` - The author's display name
/// * `body` - The message text, never blank
/// * `timestamp` - When the server stored the message
/// * `origin` - History snapshot or live channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: Option<MessageId>,
    pub author_name: String,
    pub body: String,
    pub timestamp: DateTime<Utc>,
    pub origin: MessageOrigin,
}

impl Message {
    /// Create a message, rejecting a blank body or author
    pub fn new(
        id: Option<MessageId>,
        author_name: impl Into<String>,
        body: impl Into<String>,
        timestamp: DateTime<Utc>,
        origin: MessageOrigin,
    ) -> Result<Self, SyncError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(SyncError::malformed("body", "message body is empty"));
        }
        let author_name = author_name.into();
        if author_name.trim().is_empty() {
            return Err(SyncError::malformed("author", "message has no author"));
        }
        Ok(Self {
            id,
            author_name,
            body,
            timestamp,
            origin,
        })
    }

    /// Whether the given identity wrote this message
    pub fn is_authored_by(&self, identity: &Identity) -> bool {
        self.author_name == identity.author_name
    }
}

/// Nested user object used by the history serializer
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RawUser {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
}

/// An inbound message in either of the server's field-naming variants
///
/// Live frames look like `{id, message, username, timestamp}`; history
/// entries look like `{id, room, user: {id, username}, content, timestamp}`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawInboundMessage {
    #[serde(default)]
    pub id: serde_json::Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub user: Option<RawUser>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl RawInboundMessage {
    /// Parse a text frame from the live channel
    pub fn from_json(text: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Resolve the field-name variants into a `Message`
    ///
    /// Body and author are required. A missing or unparseable timestamp falls
    /// back to `received_at`.
    pub fn normalize(
        self,
        origin: MessageOrigin,
        received_at: DateTime<Utc>,
    ) -> Result<Message, SyncError> {
        let id = MessageId::from_json(&self.id);

        let body = [self.message, self.content, self.body]
            .into_iter()
            .flatten()
            .find(|text| !text.trim().is_empty())
            .ok_or_else(|| SyncError::malformed("body", "no message, content or body text"))?;

        let (nested_username, nested_author) = self
            .user
            .map(|user| (user.username, user.author))
            .unwrap_or_default();
        let author_name = [self.username, self.author, nested_username, nested_author]
            .into_iter()
            .flatten()
            .map(|name| name.trim().to_string())
            .find(|name| !name.is_empty())
            .ok_or_else(|| SyncError::malformed("author", "no username, author, user.username or user.author"))?;

        let timestamp = match self.timestamp.as_deref().and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                tracing::debug!(
                    "[TIMELINE] message {:?} has no usable timestamp ({:?}), using receive time",
                    id,
                    self.timestamp
                );
                received_at
            }
        };

        Message::new(id, author_name, body, timestamp, origin)
    }
}

/// Parse an ISO 8601 timestamp, treating an offset-less value as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Frame sent over the live channel
///
/// Serialized with the field names the server consumes: `message` for the
/// body and `username` for the author.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutboundFrame {
    #[serde(rename = "message")]
    pub body: String,
    #[serde(rename = "username")]
    pub author_name: String,
}

impl OutboundFrame {
    pub fn new(body: impl Into<String>, author_name: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            author_name: author_name.into(),
        }
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}
