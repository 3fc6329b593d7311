//! Nostr event model.
//!
//! The feed only dereferences `id`, `pubkey` and `created_at`; the remaining
//! fields are carried opaquely so events round-trip unchanged. Signature
//! verification is the relay layer's problem, not ours.

use crate::error::{FeedError, Result};
use serde::{Deserialize, Serialize};

/// Metadata events (kind 0) carry profile JSON in `content`.
pub const KIND_METADATA: u16 = 0;
/// Short text notes (kind 1) make up the feed.
pub const KIND_SHORT_TEXT_NOTE: u16 = 1;

/// A signed Nostr event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// 32-bytes lowercase hex-encoded sha256 of the serialized event data
    pub id: String,
    /// 32-bytes lowercase hex-encoded public key of the event creator
    pub pubkey: String,
    /// Unix timestamp in seconds
    pub created_at: u64,
    /// Event kind (integer between 0 and 65535)
    pub kind: u16,
    /// Array of arrays of strings (tags)
    pub tags: Vec<Vec<String>>,
    /// Arbitrary string content
    pub content: String,
    /// 64-bytes lowercase hex signature
    pub sig: String,
}

impl Event {
    /// Check that the fields the feed index dereferences are present.
    ///
    /// Events arrive from relays we do not control; an event with an empty
    /// `id` or `pubkey` would corrupt the author index, so it is rejected
    /// with a named field instead of being indexed under `""`.
    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(FeedError::InvalidEvent("missing id".to_string()));
        }
        if self.pubkey.is_empty() {
            return Err(FeedError::InvalidEvent("missing pubkey".to_string()));
        }
        Ok(())
    }

    /// Parse an event from its wire JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let event: Event = serde_json::from_str(json)
            .map_err(|e| FeedError::InvalidEvent(e.to_string()))?;
        event.validate()?;
        Ok(event)
    }
}
