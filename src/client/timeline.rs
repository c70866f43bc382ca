//! # Timeline Merger
//!
//! The ordering and dedup authority of a room view. Merges the history
//! snapshot (the seed) with the live message stream into one append-only
//! sequence that is safe to render at any point.
//!
//! ## Rules
//!
//! - Live messages arriving before the seed are buffered in arrival order
//! - When the seed resolves the timeline becomes `seed ++ buffered`
//! - After that every live message is appended in arrival order
//! - A message whose non-null id is already present is dropped; messages
//!   without an id are never deduplicated
//! - Visible messages are never removed or reordered
//!
//! ## Usage
//!
//! ```rust
//! use roomchat::client::timeline::{MergeOutcome, TimelineMerger};
//! use roomchat::shared::{Message, MessageId, MessageOrigin};
//!
//! let hi = Message::new(Some(MessageId::new("10")), "bob", "hi", chrono::Utc::now(), MessageOrigin::Live).unwrap();
//!
//! let mut merger = TimelineMerger::new();
//! assert_eq!(merger.push_live(hi.clone()), MergeOutcome::Buffered);
//! merger.resolve_seed(Vec::new());
//! assert_eq!(merger.push_live(hi), MergeOutcome::Duplicate);
//! assert_eq!(merger.timeline().len(), 1);
//! ```

use std::collections::HashSet;

use crate::shared::message::{Message, MessageId};

/// What happened to a live message handed to the merger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Appended to the visible timeline
    Appended,
    /// Held until the seed resolves
    Buffered,
    /// Dropped; its id is already present
    Duplicate,
    /// Dropped; blank body
    Rejected,
}

impl MergeOutcome {
    /// Whether the visible timeline grew
    pub fn is_visible_change(&self) -> bool {
        matches!(self, MergeOutcome::Appended)
    }
}

/// Merges one room's seed and live stream
#[derive(Debug, Default)]
pub struct TimelineMerger {
    visible: Vec<Message>,
    pending: Vec<Message>,
    /// Ids present in `visible`, or in `pending` before the seed resolves
    seen: HashSet<MessageId>,
    seeded: bool,
}

impl TimelineMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand a live message to the merger
    pub fn push_live(&mut self, message: Message) -> MergeOutcome {
        if message.body.trim().is_empty() {
            tracing::warn!("[TIMELINE] Rejecting message {:?} with blank body", message.id);
            return MergeOutcome::Rejected;
        }

        if let Some(id) = &message.id {
            if !self.seen.insert(id.clone()) {
                tracing::debug!("[TIMELINE] Dropping duplicate message {}", id);
                return MergeOutcome::Duplicate;
            }
        }

        if self.seeded {
            self.visible.push(message);
            MergeOutcome::Appended
        } else {
            tracing::debug!(
                "[TIMELINE] Buffering message {:?} until history resolves ({} pending)",
                message.id,
                self.pending.len() + 1
            );
            self.pending.push(message);
            MergeOutcome::Buffered
        }
    }

    /// Resolve the seed and flush buffered live messages behind it
    ///
    /// Only the first call has any effect; returns whether this call seeded
    /// the timeline.
    pub fn resolve_seed(&mut self, seed: Vec<Message>) -> bool {
        if self.seeded {
            tracing::warn!(
                "[TIMELINE] Ignoring second seed of {} messages; timeline already seeded",
                seed.len()
            );
            return false;
        }

        let seed_len = seed.len();
        let buffered = std::mem::take(&mut self.pending);
        let buffered_len = buffered.len();

        self.visible = merge_seed(seed, buffered);
        self.seen = self
            .visible
            .iter()
            .filter_map(|message| message.id.clone())
            .collect();
        self.seeded = true;

        tracing::info!(
            "[TIMELINE] Seeded with {} history messages, flushed {} buffered ({} visible)",
            seed_len,
            buffered_len,
            self.visible.len()
        );
        true
    }

    /// The visible timeline; empty until the seed resolves
    pub fn timeline(&self) -> &[Message] {
        &self.visible
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Live messages waiting for the seed
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

/// Combine a seed with the live messages buffered before it
///
/// Seed order is kept as the server sent it. Buffered messages follow in
/// arrival order. When an id occurs more than once the first copy wins, so a
/// seed copy always beats a buffered live copy.
pub fn merge_seed(seed: Vec<Message>, buffered: Vec<Message>) -> Vec<Message> {
    let mut ids = HashSet::new();
    seed.into_iter()
        .chain(buffered)
        .filter(|message| match &message.id {
            Some(id) => ids.insert(id.clone()),
            None => true,
        })
        .collect()
}
