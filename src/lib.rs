//! Client-side Nostr feed state over a WebSocket relay pool.
//!
//! This crate provides:
//! - Relay URL normalization to canonical WebSocket form
//! - An in-memory event index grouping received events by author
//! - A thin relay pool that parses NIP-01 relay messages
//! - A feed state wiring the two together behind one handler loop
//!
//! # Example
//!
//! ```rust,no_run
//! use nostr_feed::{FeedState, FeedEvent, Filter};
//!
//! #[tokio::main]
//! async fn main() {
//!     // Connect the built-in feed relays
//!     let feed = FeedState::new();
//!     let mut notifications = feed.subscribe();
//!     feed.connect().await;
//!
//!     // Ask for recent short text notes
//!     let filter = Filter::new().kinds(vec![1]).limit(50);
//!     feed.subscribe_feed(vec![filter]).await.unwrap();
//!
//!     // Re-read the feed whenever an event lands
//!     while let Ok(notification) = notifications.recv().await {
//!         if let FeedEvent::EventIndexed { pubkey, .. } = notification {
//!             println!("New event from {}", pubkey);
//!             for (author, record) in feed.sorted_authors().await {
//!                 println!("{}: {} events", author, record.events.len());
//!             }
//!         }
//!     }
//! }
//! ```

mod error;
mod event;
mod message;
mod pool;
mod relays;
mod state;
mod store;

// Re-export main types
pub use error::{FeedError, Result};
pub use event::{Event, KIND_METADATA, KIND_SHORT_TEXT_NOTE};
pub use message::{ClientMessage, Filter, MessageError, RelayMessage};
pub use pool::{generate_subscription_id, PoolConfig, PoolEvent, RelayPool};
pub use relays::{normalize_relay_url, normalize_relay_urls, FEED_RELAYS, PROFILE_RELAYS};
pub use state::{FeedEvent, FeedState};
pub use store::{AuthorRecord, FeedStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_relays_are_canonical() {
        for relay in FEED_RELAYS {
            assert!(relay.starts_with("wss://"));
        }
        for relay in PROFILE_RELAYS {
            assert!(relay.starts_with("wss://"));
        }
    }

    #[test]
    fn test_feed_relays_normalize_to_themselves() {
        let normalized = normalize_relay_urls(FEED_RELAYS);
        assert_eq!(normalized.len(), FEED_RELAYS.len());
        for (relay, normalized) in FEED_RELAYS.iter().zip(&normalized) {
            assert_eq!(&normalize_relay_url(relay), normalized);
        }
    }
}
