//! Shared Error Types
//!
//! This module defines the failure taxonomy of the room synchronization core.
//! None of these errors is fatal to the process: each one degrades a single
//! room view at most.
//!
//! # Error Categories
//!
//! - `HistoryUnavailable` - the history fetch failed; the room proceeds with an empty seed
//! - `ChannelUnavailable` - the live channel failed to open or dropped
//! - `InvalidSendAttempt` - blank body, or a send while the room is not live
//! - `MalformedInboundMessage` - an inbound frame is missing required fields
//! - `MissingIdentity` - a room was entered without an authenticated identity
//! - `SerializationError` - JSON encoding/decoding failures
//!
//! # Usage
//!
//! ```rust
//! use roomchat::shared::error::SyncError;
//!
//! let error = SyncError::malformed("body", "message body is empty");
//! assert!(error.to_string().contains("body"));
//! ```
//!
//! # Thread Safety
//!
//! All error types are `Send + Sync + Clone` so they can travel inside events.
use thiserror::Error;

use crate::shared::room::RoomState;

/// Why a send attempt was rejected locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendRejection {
    /// The body is empty after trimming whitespace
    EmptyBody,
    /// The room view is not in the `Live` state
    NotLive(RoomState),
}

impl std::fmt::Display for SendRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendRejection::EmptyBody => write!(f, "message body is empty"),
            SendRejection::NotLive(state) => write!(f, "room is {:?}, not live", state),
        }
    }
}

/// Errors produced by the room synchronization core
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// History fetch failed or returned a non-success status
    #[error("History unavailable for room '{room}': {reason}")]
    HistoryUnavailable {
        /// Room slug the fetch was for
        room: String,
        /// Human-readable failure reason
        reason: String,
    },

    /// Live channel failed to open or dropped
    #[error("Channel unavailable for room '{room}': {reason}")]
    ChannelUnavailable {
        /// Room slug the channel was scoped to
        room: String,
        /// Human-readable failure reason
        reason: String,
    },

    /// Send rejected before any network call was made
    #[error("Invalid send attempt: {reason}")]
    InvalidSendAttempt {
        /// The rejection cause
        reason: SendRejection,
    },

    /// Inbound frame missing a required field after normalization
    #[error("Malformed inbound message, field '{field}': {message}")]
    MalformedInboundMessage {
        /// The field that failed normalization
        field: String,
        /// Human-readable error message
        message: String,
    },

    /// No authenticated identity was supplied
    #[error("No authenticated identity; log in before entering a room")]
    MissingIdentity,

    /// JSON serialization or deserialization error
    #[error("Serialization error: {message}")]
    SerializationError {
        /// Human-readable error message
        message: String,
    },
}

impl SyncError {
    /// Create a new history error
    pub fn history(room: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::HistoryUnavailable {
            room: room.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new channel error
    pub fn channel(room: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::ChannelUnavailable {
            room: room.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a new send rejection
    pub fn rejected(reason: SendRejection) -> Self {
        Self::InvalidSendAttempt { reason }
    }

    /// Create a new malformed-message error
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedInboundMessage {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a new serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(format!("JSON error: {}", err))
    }
}
