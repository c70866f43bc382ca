/**
 * Client Types Module
 *
 * Defines the types the display layer reads from a room view: the
 * connection indicator and the logged-in identity.
 */

use serde::{Deserialize, Serialize};

pub use crate::shared::identity::Identity;
use crate::shared::room::RoomState;

/// Connection indicator shown next to the room header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// Channel not yet open
    Connecting,
    /// Channel open ("connected")
    Open,
    /// Channel closed ("disconnected")
    Closed,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "connected",
            ConnectionState::Closed => "disconnected",
        }
    }
}

impl From<RoomState> for ConnectionState {
    fn from(state: RoomState) -> Self {
        match state {
            RoomState::Entering => ConnectionState::Connecting,
            RoomState::Live => ConnectionState::Open,
            RoomState::Degraded | RoomState::Exited => ConnectionState::Closed,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
