//! Shared Module
//!
//! This module contains the platform-agnostic types of the chat client:
//! messages and their wire shapes, rooms, channel events, errors and
//! configuration. All types are designed for serialization over the room
//! history endpoint and the live channel.

/// Message data structure and normalization
pub mod message;

/// Channel event system
pub mod event;

/// Shared error types
pub mod error;

/// Room identifiers, metadata and view lifecycle
pub mod room;

/// Logged-in identity
pub mod identity;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use message::{Message, MessageId, MessageOrigin, OutboundFrame, RawInboundMessage, RawUser};
pub use event::ChannelEvent;
pub use error::{SendRejection, SyncError};
pub use room::{RoomId, RoomInfo, RoomState};
pub use identity::Identity;
pub use config::{AppConfig, AppConfigBuilder, ConfigError, ReconnectSettings};
