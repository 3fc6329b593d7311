//! Feed state management.
//!
//! This module wires the relay pool to the feed index. A single handler
//! loop consumes pool events: received events are merged into the store,
//! relay notices, errors and disconnects are logged. Consumers read the
//! feed through [`FeedState::sorted_authors`] and can watch
//! [`FeedEvent`] notifications to know when to re-read.

use crate::error::Result;
use crate::event::{Event, KIND_METADATA, KIND_SHORT_TEXT_NOTE};
use crate::message::Filter;
use crate::pool::{PoolConfig, PoolEvent, RelayPool};
use crate::relays::{normalize_relay_urls, FEED_RELAYS};
use crate::store::{AuthorRecord, FeedStore};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// Notifications emitted by the feed state.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// Connected to relays
    Connected { relay_count: usize },
    /// Disconnected from all relays
    Disconnected,
    /// An event was merged into the index
    EventIndexed { pubkey: String, event_id: String },
    /// Error reported by a relay
    Error { message: String },
}

/// The feed state: an owned event index fed by a relay pool.
pub struct FeedState {
    /// Event index; all mutation goes through the handler loop or `deliver`
    store: Arc<RwLock<FeedStore>>,
    /// Relay pool
    pool: RelayPool,
    /// Notification broadcast channel
    events_tx: broadcast::Sender<FeedEvent>,
    /// Active subscription IDs
    subscriptions: Arc<RwLock<Vec<String>>>,
}

impl FeedState {
    /// Create a feed state over the built-in feed relays.
    pub fn new() -> Self {
        Self::with_relays(FEED_RELAYS.iter().map(|s| s.to_string()).collect())
    }

    /// Create a feed state over custom relay addresses.
    ///
    /// Addresses are normalized to canonical WebSocket URLs before the
    /// pool sees them.
    pub fn with_relays(relay_urls: Vec<String>) -> Self {
        Self::with_config(relay_urls, PoolConfig::default())
    }

    /// Create a feed state with custom pool configuration.
    pub fn with_config(relay_urls: Vec<String>, config: PoolConfig) -> Self {
        let pool = RelayPool::with_config(normalize_relay_urls(&relay_urls), config);
        let (events_tx, _) = broadcast::channel(1000);

        Self {
            store: Arc::new(RwLock::new(FeedStore::new())),
            pool,
            events_tx,
            subscriptions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Subscribe to feed notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.events_tx.subscribe()
    }

    /// Get the pool's connection targets.
    pub fn relay_urls(&self) -> Vec<String> {
        self.pool.relay_urls()
    }

    /// Connect to relays and start the handler loop.
    ///
    /// Returns the number of relays that connected.
    pub async fn connect(&self) -> usize {
        info!("Connecting to relays...");

        let results = self.pool.connect_all().await;
        for (url, result) in &results {
            if let Err(e) = result {
                warn!("Failed to connect to {}: {}", url, e);
            }
        }
        let connected_count = results.iter().filter(|(_, r)| r.is_ok()).count();
        info!("Connected to {} relays", connected_count);

        self.spawn_event_handler();

        let _ = self.events_tx.send(FeedEvent::Connected {
            relay_count: connected_count,
        });

        connected_count
    }

    /// Spawn the handler loop consuming pool events.
    fn spawn_event_handler(&self) {
        let mut pool_events = self.pool.subscribe();
        let events_tx = self.events_tx.clone();
        let store = self.store.clone();

        tokio::spawn(async move {
            while let Ok(event) = pool_events.recv().await {
                match event {
                    PoolEvent::Event {
                        relay_url,
                        subscription_id: _,
                        event,
                    } => {
                        debug!("Event {} from {}", event.id, relay_url);
                        if let Err(e) = Self::ingest(&store, &events_tx, event).await {
                            warn!("Dropping event from {}: {}", relay_url, e);
                        }
                    }
                    PoolEvent::Notice { relay_url, message } => {
                        info!("Relay notice from {}: {}", relay_url, message);
                    }
                    PoolEvent::Error { relay_url, error } => {
                        warn!("Relay error on {}: {}", relay_url, error);
                        let _ = events_tx.send(FeedEvent::Error { message: error });
                    }
                    PoolEvent::Disconnected { relay_url } => {
                        warn!("Relay disconnected: {}", relay_url);
                    }
                    PoolEvent::Eose {
                        relay_url,
                        subscription_id,
                    } => {
                        debug!("EOSE for {} from {}", subscription_id, relay_url);
                    }
                    PoolEvent::Connected { relay_url } => {
                        debug!("Relay connected: {}", relay_url);
                    }
                }
            }
        });
    }

    /// Merge one received event into the index.
    ///
    /// This is the delivery callback the transport invokes per event: the
    /// event lands in the author index and is recorded in the flat id map,
    /// then an [`FeedEvent::EventIndexed`] notification fires. Duplicate
    /// deliveries are absorbed by the store.
    pub async fn deliver(&self, event: Event) -> Result<()> {
        Self::ingest(&self.store, &self.events_tx, event).await
    }

    async fn ingest(
        store: &Arc<RwLock<FeedStore>>,
        events_tx: &broadcast::Sender<FeedEvent>,
        event: Event,
    ) -> Result<()> {
        let pubkey = event.pubkey.clone();
        let event_id = event.id.clone();

        {
            let mut store = store.write().await;
            store.add_user_event(event.clone())?;
            store.record_event(event);
        }

        let _ = events_tx.send(FeedEvent::EventIndexed { pubkey, event_id });
        Ok(())
    }

    /// All authors with their events, most recently active first.
    pub async fn sorted_authors(&self) -> Vec<(String, AuthorRecord)> {
        self.store.read().await.sorted_authors()
    }

    /// Get one author's events, ascending by timestamp.
    pub async fn author_events(&self, pubkey: &str) -> Vec<Event> {
        self.store
            .read()
            .await
            .author(pubkey)
            .map(|record| record.events.clone())
            .unwrap_or_default()
    }

    /// Number of authors indexed.
    pub async fn author_count(&self) -> usize {
        self.store.read().await.author_count()
    }

    /// Number of events recorded in the flat id map.
    pub async fn event_count(&self) -> usize {
        self.store.read().await.event_count()
    }

    /// Subscribe to events on all connected relays.
    pub async fn subscribe_feed(&self, filters: Vec<Filter>) -> Result<String> {
        let sub_id = self.pool.subscribe_all(filters).await?;

        {
            let mut subs = self.subscriptions.write().await;
            subs.push(sub_id.clone());
        }

        Ok(sub_id)
    }

    /// Subscribe to short text notes from the given authors.
    pub async fn subscribe_authors(&self, pubkeys: Vec<String>) -> Result<String> {
        let filter = Filter::new()
            .kinds(vec![KIND_SHORT_TEXT_NOTE])
            .authors(pubkeys);
        self.subscribe_feed(vec![filter]).await
    }

    /// Subscribe to profile metadata for the given authors.
    pub async fn subscribe_profiles(&self, pubkeys: Vec<String>) -> Result<String> {
        let filter = Filter::new().kinds(vec![KIND_METADATA]).authors(pubkeys);
        self.subscribe_feed(vec![filter]).await
    }

    /// Close a subscription on all relays.
    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        {
            let mut subs = self.subscriptions.write().await;
            subs.retain(|id| id != subscription_id);
        }
        self.pool.unsubscribe(subscription_id).await
    }

    /// Get active subscription IDs.
    pub async fn subscription_ids(&self) -> Vec<String> {
        self.subscriptions.read().await.clone()
    }

    /// Disconnect from all relays.
    pub async fn disconnect(&self) {
        info!("Disconnecting from all relays");
        self.pool.disconnect_all().await;
        let _ = self.events_tx.send(FeedEvent::Disconnected);
    }

    /// Get the number of connected relays.
    pub async fn connected_count(&self) -> usize {
        self.pool.connected_count().await
    }

    /// Drop all indexed state, keeping connections and subscriptions.
    pub async fn clear(&self) {
        self.store.write().await.clear();
    }
}

impl Default for FeedState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_event(id: &str, pubkey: &str, created_at: u64) -> Event {
        Event {
            id: id.to_string(),
            pubkey: pubkey.to_string(),
            created_at,
            kind: KIND_SHORT_TEXT_NOTE,
            tags: vec![],
            content: "test".to_string(),
            sig: "sig".to_string(),
        }
    }

    #[test]
    fn test_new_uses_feed_relays() {
        let state = FeedState::new();
        let urls = state.relay_urls();
        assert_eq!(urls.len(), FEED_RELAYS.len());
        assert!(urls.iter().all(|u| u.starts_with("wss://")));
    }

    #[test]
    fn test_with_relays_normalizes() {
        let state = FeedState::with_relays(vec![
            "http://a.example".to_string(),
            "relay.example".to_string(),
        ]);

        let urls = state.relay_urls();
        assert_eq!(urls, vec!["ws://a.example/", "wss://relay.example/"]);
    }

    #[tokio::test]
    async fn test_deliver_and_read() {
        let state = FeedState::with_relays(vec![]);

        state.deliver(create_test_event("e1", "p1", 100)).await.unwrap();
        state.deliver(create_test_event("e2", "p2", 200)).await.unwrap();

        let authors = state.sorted_authors().await;
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].0, "p2");
        assert_eq!(authors[1].0, "p1");
        assert_eq!(state.event_count().await, 2);
    }

    #[tokio::test]
    async fn test_deliver_duplicate_is_absorbed() {
        let state = FeedState::with_relays(vec![]);

        state.deliver(create_test_event("e1", "p1", 100)).await.unwrap();
        state.deliver(create_test_event("e1", "p1", 100)).await.unwrap();

        assert_eq!(state.author_events("p1").await.len(), 1);
    }

    #[tokio::test]
    async fn test_deliver_invalid_event() {
        let state = FeedState::with_relays(vec![]);

        let err = state
            .deliver(create_test_event("", "p1", 100))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid event: missing id");
        assert_eq!(state.author_count().await, 0);
    }

    #[tokio::test]
    async fn test_deliver_emits_notification() {
        let state = FeedState::with_relays(vec![]);
        let mut notifications = state.subscribe();

        state.deliver(create_test_event("e1", "p1", 100)).await.unwrap();

        match notifications.recv().await.unwrap() {
            FeedEvent::EventIndexed { pubkey, event_id } => {
                assert_eq!(pubkey, "p1");
                assert_eq!(event_id, "e1");
            }
            other => panic!("unexpected notification: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_clear() {
        let state = FeedState::with_relays(vec![]);

        state.deliver(create_test_event("e1", "p1", 100)).await.unwrap();
        state.clear().await;

        assert_eq!(state.author_count().await, 0);
        assert_eq!(state.event_count().await, 0);
    }

    #[tokio::test]
    async fn test_subscription_ids_empty() {
        let state = FeedState::with_relays(vec![]);
        assert!(state.subscription_ids().await.is_empty());
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let state = FeedState::with_relays(vec![]);

        let notes = state.subscribe_authors(vec!["p1".to_string()]).await;
        assert!(notes.is_err());

        let profiles = state.subscribe_profiles(vec!["p1".to_string()]).await;
        assert!(profiles.is_err());
    }
}
