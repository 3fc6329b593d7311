//! Relay pool conduit for delivering events from multiple Nostr relays.
//!
//! The pool connects to each configured relay once, parses inbound frames
//! and forwards them on a single tagged-event channel consumed by one
//! handler loop. Reconnection policy, backoff and per-relay subscription
//! tracking are deliberately out of scope; a dropped connection simply
//! surfaces as a [`PoolEvent::Disconnected`].

use crate::error::{FeedError, Result};
use crate::event::Event;
use crate::message::{ClientMessage, Filter, RelayMessage};
use futures::{SinkExt, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Generate a unique subscription ID.
pub fn generate_subscription_id() -> String {
    Uuid::new_v4().to_string()[..8].to_string()
}

/// Relay pool configuration.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Per-relay connection timeout
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Events emitted by the relay pool.
#[derive(Debug, Clone)]
pub enum PoolEvent {
    /// A relay connected
    Connected { relay_url: String },
    /// A relay disconnected
    Disconnected { relay_url: String },
    /// An event was received from a relay
    Event {
        relay_url: String,
        subscription_id: String,
        event: Event,
    },
    /// EOSE received for a subscription on a relay
    Eose {
        relay_url: String,
        subscription_id: String,
    },
    /// Notice from a relay
    Notice { relay_url: String, message: String },
    /// Connection error
    Error { relay_url: String, error: String },
}

/// A pool of Nostr relay connections.
pub struct RelayPool {
    /// Configuration
    config: PoolConfig,
    /// Connection targets, canonical WebSocket URLs
    relays: Vec<String>,
    /// Outbound frame senders indexed by relay URL, present while connected
    senders: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Message>>>>,
    /// Broadcast channel for pool events
    events_tx: broadcast::Sender<PoolEvent>,
}

impl RelayPool {
    /// Create a pool with the given connection targets.
    pub fn with_relays(relays: Vec<String>) -> Self {
        Self::with_config(relays, PoolConfig::default())
    }

    /// Create a pool with custom configuration.
    pub fn with_config(relays: Vec<String>, config: PoolConfig) -> Self {
        let (events_tx, _) = broadcast::channel(1000);
        Self {
            config,
            relays,
            senders: Arc::new(RwLock::new(HashMap::new())),
            events_tx,
        }
    }

    /// Subscribe to pool events.
    pub fn subscribe(&self) -> broadcast::Receiver<PoolEvent> {
        self.events_tx.subscribe()
    }

    /// Get the configured relay URLs.
    pub fn relay_urls(&self) -> Vec<String> {
        self.relays.clone()
    }

    /// Get the number of currently connected relays.
    pub async fn connected_count(&self) -> usize {
        self.senders.read().await.len()
    }

    /// Check if a relay is connected.
    pub async fn is_connected(&self, url: &str) -> bool {
        self.senders.read().await.contains_key(url)
    }

    /// Connect to all configured relays.
    ///
    /// One attempt per relay; a relay that fails to connect stays
    /// disconnected until the caller decides otherwise.
    pub async fn connect_all(&self) -> Vec<(String, Result<()>)> {
        let urls = self.relays.clone();

        let mut results = Vec::new();
        for url in urls {
            let result = self.connect_relay(&url).await;
            results.push((url, result));
        }
        results
    }

    /// Connect to a single relay and spawn its reader and writer tasks.
    async fn connect_relay(&self, url: &str) -> Result<()> {
        debug!("Connecting to relay: {}", url);

        let (ws, _response) = timeout(self.config.connect_timeout, connect_async(url))
            .await
            .map_err(|_| FeedError::Timeout(format!("connecting to {url}")))?
            .map_err(|e| FeedError::WebSocket(e.to_string()))?;

        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        // Writer task: forwards queued frames until the channel closes
        tokio::spawn(async move {
            while let Some(frame) = rx.recv().await {
                if sink.send(frame).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        // Reader task: parses frames into pool events until the stream ends
        let events_tx = self.events_tx.clone();
        let senders = self.senders.clone();
        let relay_url = url.to_string();
        tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => match RelayMessage::from_json(text.as_str()) {
                        Ok(msg) => Self::forward_message(&events_tx, &relay_url, msg),
                        Err(e) => {
                            debug!("Unparseable message from {}: {}", relay_url, e);
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        let _ = events_tx.send(PoolEvent::Error {
                            relay_url: relay_url.clone(),
                            error: e.to_string(),
                        });
                        break;
                    }
                }
            }

            senders.write().await.remove(&relay_url);
            let _ = events_tx.send(PoolEvent::Disconnected { relay_url });
        });

        {
            let mut senders = self.senders.write().await;
            senders.insert(url.to_string(), tx);
        }

        info!("Connected to relay: {}", url);
        let _ = self.events_tx.send(PoolEvent::Connected {
            relay_url: url.to_string(),
        });

        Ok(())
    }

    /// Map a parsed relay message to a pool event and broadcast it.
    fn forward_message(
        events_tx: &broadcast::Sender<PoolEvent>,
        relay_url: &str,
        msg: RelayMessage,
    ) {
        let pool_event = match msg {
            RelayMessage::Event {
                subscription_id,
                event,
            } => PoolEvent::Event {
                relay_url: relay_url.to_string(),
                subscription_id,
                event,
            },
            RelayMessage::Eose { subscription_id } => PoolEvent::Eose {
                relay_url: relay_url.to_string(),
                subscription_id,
            },
            RelayMessage::Notice { message } => PoolEvent::Notice {
                relay_url: relay_url.to_string(),
                message,
            },
            RelayMessage::Closed {
                subscription_id,
                message,
            } => {
                warn!(
                    "Subscription {} closed by {}: {}",
                    subscription_id, relay_url, message
                );
                return;
            }
        };

        let _ = events_tx.send(pool_event);
    }

    /// Subscribe on all connected relays.
    ///
    /// Sends a single REQ with a generated subscription ID to every
    /// connected relay and returns the ID.
    pub async fn subscribe_all(&self, filters: Vec<Filter>) -> Result<String> {
        let subscription_id = generate_subscription_id();

        info!(
            "Creating subscription {} with {} filters",
            subscription_id,
            filters.len()
        );

        let json = ClientMessage::Req {
            subscription_id: subscription_id.clone(),
            filters,
        }
        .to_json()?;

        self.send_to_all(&json).await?;
        Ok(subscription_id)
    }

    /// Close a subscription on all connected relays.
    pub async fn unsubscribe(&self, subscription_id: &str) -> Result<()> {
        info!("Closing subscription {}", subscription_id);

        let json = ClientMessage::Close {
            subscription_id: subscription_id.to_string(),
        }
        .to_json()?;

        self.send_to_all(&json).await
    }

    /// Queue a text frame on every connected relay.
    async fn send_to_all(&self, json: &str) -> Result<()> {
        let senders = self.senders.read().await;
        if senders.is_empty() {
            return Err(FeedError::NotConnected);
        }

        for (url, tx) in senders.iter() {
            if tx.send(Message::Text(json.to_string().into())).is_err() {
                warn!("Failed to queue frame on {}", url);
            }
        }
        Ok(())
    }

    /// Disconnect from all relays.
    ///
    /// Dropping the frame senders closes each writer task, which closes the
    /// socket; reader tasks then emit [`PoolEvent::Disconnected`].
    pub async fn disconnect_all(&self) {
        self.senders.write().await.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_subscription_id() {
        let id1 = generate_subscription_id();
        let id2 = generate_subscription_id();

        assert_eq!(id1.len(), 8);
        assert_eq!(id2.len(), 8);
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_pool_config_default() {
        let config = PoolConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_pool_with_relays() {
        let pool = RelayPool::with_relays(vec![
            "wss://relay1.example/".to_string(),
            "wss://relay2.example/".to_string(),
        ]);

        let urls = pool.relay_urls();
        assert_eq!(urls.len(), 2);
        assert!(urls.contains(&"wss://relay1.example/".to_string()));
    }

    #[tokio::test]
    async fn test_pool_connected_count_none() {
        let pool = RelayPool::with_relays(vec!["wss://relay.example/".to_string()]);

        // Not connected yet
        assert_eq!(pool.connected_count().await, 0);
        assert!(!pool.is_connected("wss://relay.example/").await);
    }

    #[tokio::test]
    async fn test_subscribe_requires_connection() {
        let pool = RelayPool::with_relays(vec!["wss://relay.example/".to_string()]);

        let result = pool.subscribe_all(vec![Filter::new().kinds(vec![1])]).await;
        assert!(matches!(result, Err(FeedError::NotConnected)));
    }

    #[tokio::test]
    async fn test_unsubscribe_requires_connection() {
        let pool = RelayPool::with_relays(vec![]);

        let result = pool.unsubscribe("sub1").await;
        assert!(matches!(result, Err(FeedError::NotConnected)));
    }
}
