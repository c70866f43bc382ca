//! Room view state machine
//!
//! `RoomView` is the synchronous half of the room view controller. It holds
//! the lifecycle state, the timeline merger, the attached channel and the
//! draft input, and processes one event at a time to completion. The async
//! driver feeds it; tests drive it directly.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::client::channel::ChannelSink;
use crate::client::history::HistorySnapshot;
use crate::client::timeline::TimelineMerger;
use crate::client::types::{ConnectionState, Identity};
use crate::shared::error::{SendRejection, SyncError};
use crate::shared::event::ChannelEvent;
use crate::shared::message::{Message, OutboundFrame};
use crate::shared::room::{RoomId, RoomInfo, RoomState};

/// An event admitted into a room view
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    Channel(ChannelEvent),
    History(Result<HistorySnapshot, SyncError>),
}

impl From<ChannelEvent> for RoomEvent {
    fn from(event: ChannelEvent) -> Self {
        RoomEvent::Channel(event)
    }
}

/// What the display layer renders for a room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSnapshot {
    pub room: RoomId,
    pub state: RoomState,
    pub connection: ConnectionState,
    /// Shared with the view until the timeline next grows
    pub timeline: Arc<[Message]>,
    pub room_info: Option<RoomInfo>,
    /// Reconnect attempt currently scheduled, 1-based
    pub reconnect_attempt: Option<u32>,
    pub input: String,
}

/// One room-view lifetime
#[derive(Debug)]
pub struct RoomView<S: ChannelSink> {
    view_id: Uuid,
    room: RoomId,
    identity: Identity,
    state: RoomState,
    merger: TimelineMerger,
    /// Copy of the merger's timeline handed out in snapshots
    published: Arc<[Message]>,
    channel: Option<S>,
    room_info: Option<RoomInfo>,
    history_requested: bool,
    input: String,
    reconnect_attempt: Option<u32>,
}

impl<S: ChannelSink> RoomView<S> {
    pub fn new(room: RoomId, identity: Identity) -> Self {
        let view_id = Uuid::new_v4();
        tracing::info!(
            "[ROOM] Entering room {} as {} (view {})",
            room,
            identity.author_name,
            view_id
        );
        Self {
            view_id,
            room,
            identity,
            state: RoomState::Entering,
            merger: TimelineMerger::new(),
            published: Arc::from(Vec::new()),
            channel: None,
            room_info: None,
            history_requested: false,
            input: String::new(),
            reconnect_attempt: None,
        }
    }

    pub fn view_id(&self) -> Uuid {
        self.view_id
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn connection(&self) -> ConnectionState {
        ConnectionState::from(self.state)
    }

    /// Liveness flag; false once the user left
    pub fn is_alive(&self) -> bool {
        self.state != RoomState::Exited
    }

    pub fn timeline(&self) -> &[Message] {
        self.merger.timeline()
    }

    pub fn room_info(&self) -> Option<&RoomInfo> {
        self.room_info.as_ref()
    }

    /// Claim the single history fetch of this lifetime
    ///
    /// Returns `true` exactly once, and never after exit.
    pub fn begin_history(&mut self) -> bool {
        if self.history_requested || !self.is_alive() {
            return false;
        }
        self.history_requested = true;
        true
    }

    /// Attach a (re)opened channel, closing any previous one
    pub fn attach_channel(&mut self, mut channel: S) {
        if !self.is_alive() {
            channel.close();
            return;
        }
        if let Some(mut previous) = self.channel.replace(channel) {
            previous.close();
        }
    }

    pub fn set_reconnect_attempt(&mut self, attempt: Option<u32>) {
        self.reconnect_attempt = attempt;
    }

    /// Process one event to completion
    ///
    /// Returns `false` if the event was ignored because the view has exited.
    pub fn apply(&mut self, event: RoomEvent) -> bool {
        if !self.is_alive() {
            tracing::debug!("[ROOM] View {} exited; ignoring {:?}", self.view_id, event);
            return false;
        }

        match event {
            RoomEvent::Channel(ChannelEvent::Opened) => {
                if self.state != RoomState::Live {
                    tracing::info!("[ROOM] {} is live ({:?} -> Live)", self.room, self.state);
                }
                self.state = RoomState::Live;
                self.reconnect_attempt = None;
            }
            RoomEvent::Channel(ChannelEvent::Closed { reason }) => {
                if self.state != RoomState::Degraded {
                    tracing::warn!(
                        "[ROOM] {} degraded ({:?} -> Degraded): {}",
                        self.room,
                        self.state,
                        reason.as_deref().unwrap_or("closed by server")
                    );
                }
                self.state = RoomState::Degraded;
            }
            RoomEvent::Channel(ChannelEvent::Message(message)) => {
                self.merger.push_live(message);
            }
            RoomEvent::History(Ok(snapshot)) => {
                if snapshot.room.is_some() {
                    self.room_info = snapshot.room;
                }
                self.merger.resolve_seed(snapshot.messages);
            }
            RoomEvent::History(Err(e)) => {
                tracing::warn!("[ROOM] {}; continuing with empty history", e);
                self.merger.resolve_seed(Vec::new());
            }
        }
        self.refresh_published();
        true
    }

    fn refresh_published(&mut self) {
        // append-only, so equal lengths mean equal timelines
        if self.published.len() != self.merger.len() {
            self.published = Arc::from(self.merger.timeline());
        }
    }

    /// Check whether `body` could be sent right now
    pub fn validate_send(&self, body: &str) -> Result<(), SyncError> {
        validate_send(self.state, body)
    }

    /// Send a message over the live channel
    ///
    /// Nothing is added to the timeline; the message appears when the
    /// channel delivers it back.
    pub fn send(&mut self, body: &str) -> Result<(), SyncError> {
        self.validate_send(body)?;
        let channel = self
            .channel
            .as_ref()
            .ok_or_else(|| SyncError::rejected(SendRejection::NotLive(self.state)))?;

        let frame = OutboundFrame::new(body.trim(), self.identity.author_name.as_str());
        if !channel.send(frame) {
            tracing::debug!("[ROOM] Send to {} had no effect; channel not open", self.room);
        }
        Ok(())
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Send the draft input, clearing it only on success
    pub fn submit_input(&mut self) -> Result<(), SyncError> {
        let body = self.input.clone();
        self.send(&body)?;
        self.input.clear();
        Ok(())
    }

    /// Navigate away; closes the channel. Returns `false` if already exited.
    pub fn leave(&mut self) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.state = RoomState::Exited;
        self.reconnect_attempt = None;
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        tracing::info!("[ROOM] Left room {} (view {})", self.room, self.view_id);
        true
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room: self.room.clone(),
            state: self.state,
            connection: self.connection(),
            timeline: Arc::clone(&self.published),
            room_info: self.room_info.clone(),
            reconnect_attempt: self.reconnect_attempt,
            input: self.input.clone(),
        }
    }
}

/// Reject a blank body or a send outside the `Live` state
pub fn validate_send(state: RoomState, body: &str) -> Result<(), SyncError> {
    if body.trim().is_empty() {
        return Err(SyncError::rejected(SendRejection::EmptyBody));
    }
    if !state.can_send() {
        return Err(SyncError::rejected(SendRejection::NotLive(state)));
    }
    Ok(())
}
