//! In-memory feed index: received events grouped by author.
//!
//! The store owns two maps. `events_by_id` is a flat dedup aid holding every
//! event recorded, keyed by event id. `authors` keeps one [`AuthorRecord`]
//! per pubkey, in first-seen order, with that author's events sorted by
//! timestamp. The author merge logic deduplicates within a record only and
//! never reads `events_by_id`.

use crate::error::Result;
use crate::event::Event;
use indexmap::IndexMap;
use std::collections::HashMap;

/// One author's slice of the feed.
#[derive(Debug, Clone, Default)]
pub struct AuthorRecord {
    /// Events by this author, ascending by `created_at`, unique by id
    pub events: Vec<Event>,
    /// Maximum `created_at` across `events`; never decreases
    pub latest_created_at: u64,
}

/// In-memory index of received events.
///
/// Created empty and explicitly owned by whoever drives the feed; all
/// mutation goes through [`FeedStore::add_user_event`] and
/// [`FeedStore::record_event`]. Nothing is ever removed except via
/// [`FeedStore::clear`].
#[derive(Debug, Default)]
pub struct FeedStore {
    /// Every recorded event by id. Populated by `record_event`; the merge
    /// logic in `add_user_event` does not consult it.
    events_by_id: HashMap<String, Event>,
    /// Author records keyed by pubkey, in first-seen order.
    authors: IndexMap<String, AuthorRecord>,
}

impl FeedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event in the flat id map.
    pub fn record_event(&mut self, event: Event) {
        self.events_by_id.insert(event.id.clone(), event);
    }

    /// Merge an event into its author's record.
    ///
    /// A first event for a pubkey creates the record. An event whose id is
    /// already present in the record is a no-op. Otherwise the event is
    /// appended, the record re-sorted ascending by `created_at` (stable, so
    /// equal timestamps keep arrival order), and `latest_created_at` raised
    /// if this event is the newest seen for the author.
    pub fn add_user_event(&mut self, event: Event) -> Result<()> {
        event.validate()?;

        let created_at = event.created_at;
        match self.authors.get_mut(&event.pubkey) {
            Some(record) => {
                if record.events.iter().any(|e| e.id == event.id) {
                    return Ok(());
                }
                record.events.push(event);
                record.events.sort_by_key(|e| e.created_at);
                if record.latest_created_at < created_at {
                    record.latest_created_at = created_at;
                }
            }
            None => {
                let pubkey = event.pubkey.clone();
                self.authors.insert(
                    pubkey,
                    AuthorRecord {
                        events: vec![event],
                        latest_created_at: created_at,
                    },
                );
            }
        }
        Ok(())
    }

    /// All authors with their records, most recently active first.
    ///
    /// Recomputed on every call. Ties in `latest_created_at` keep the
    /// first-seen order of the authors (stable sort over insertion order).
    pub fn sorted_authors(&self) -> Vec<(String, AuthorRecord)> {
        let mut authors: Vec<(String, AuthorRecord)> = self
            .authors
            .iter()
            .map(|(pubkey, record)| (pubkey.clone(), record.clone()))
            .collect();
        authors.sort_by(|a, b| b.1.latest_created_at.cmp(&a.1.latest_created_at));
        authors
    }

    /// Get one author's record.
    pub fn author(&self, pubkey: &str) -> Option<&AuthorRecord> {
        self.authors.get(pubkey)
    }

    /// Get a recorded event by id.
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events_by_id.get(id)
    }

    /// Number of authors indexed.
    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    /// Number of events in the flat id map.
    pub fn event_count(&self) -> usize {
        self.events_by_id.len()
    }

    /// Check if the store holds nothing.
    pub fn is_empty(&self) -> bool {
        self.events_by_id.is_empty() && self.authors.is_empty()
    }

    /// Drop all state.
    pub fn clear(&mut self) {
        self.events_by_id.clear();
        self.authors.clear();
    }
}
