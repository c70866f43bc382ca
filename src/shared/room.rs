//! Room Types
//!
//! Identifiers and metadata for chat rooms, plus the lifecycle state of a
//! room view.

use serde::{Deserialize, Serialize};

/// A room's URL slug, which addresses both its history and its channel
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from a slug
    ///
    /// Returns `None` for a blank slug or one containing a path separator.
    pub fn new(slug: impl Into<String>) -> Option<Self> {
        let slug = slug.into().trim().to_string();
        if slug.is_empty() || slug.contains('/') {
            return None;
        }
        Some(Self(slug))
    }

    /// The slug as used in URLs
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Owner of a room as reported by the room detail endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomOwner {
    #[serde(default)]
    pub id: Option<i64>,
    pub username: String,
}

/// Room metadata returned alongside the history snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub slug: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub created_by: Option<RoomOwner>,
    /// ISO 8601 creation time, kept as sent
    #[serde(default)]
    pub created_at: Option<String>,
}

impl RoomInfo {
    /// Name to show in a header, falling back to the slug
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.slug)
    }
}

/// Lifecycle of one room view
///
/// `Entering -> Live` and `Live -> Degraded` are driven by channel callbacks.
/// `Degraded -> Live` happens when a channel reopens. `Exited` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoomState {
    /// Channel opening and history loading
    Entering,
    /// Channel open, sending enabled
    Live,
    /// Channel closed while the view is still active
    Degraded,
    /// The user navigated away
    Exited,
}

impl RoomState {
    /// Whether the send affordance is enabled
    pub fn can_send(&self) -> bool {
        matches!(self, RoomState::Live)
    }
}
