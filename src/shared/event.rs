/**
 * Channel Event System
 *
 * Events a channel session emits to its owner, in the order the transport
 * delivered them. Inbound payloads are already normalized into `Message`
 * values; malformed frames never reach the owner.
 */
use serde::{Deserialize, Serialize};

use crate::shared::message::Message;

/// Event emitted by a channel session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelEvent {
    /// The connection is established and sends will be delivered
    Opened,
    /// The connection failed to open or dropped
    Closed {
        /// Failure detail; `None` for a clean close by the server
        reason: Option<String>,
    },
    /// A normalized inbound message
    Message(Message),
}

impl ChannelEvent {
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: Some(reason.into()),
        }
    }
}
