//! Authenticated identity supplied by the login collaborator.

use serde::{Deserialize, Serialize};

use crate::shared::error::SyncError;

/// The logged-in user, required before a room view may be entered
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub author_name: String,
}

impl Identity {
    /// Create an identity, rejecting a blank author name
    pub fn new(id: impl Into<String>, author_name: impl Into<String>) -> Result<Self, SyncError> {
        let author_name = author_name.into().trim().to_string();
        if author_name.is_empty() {
            return Err(SyncError::MissingIdentity);
        }
        Ok(Self {
            id: id.into(),
            author_name,
        })
    }
}
