//! Example: connect to the built-in feed relays, subscribe to recent notes
//! and print the per-author feed after a short listening window.
//!
//! Usage:
//!   cargo run --example fetch_feed
//!
//! Set RUST_LOG=nostr_feed=debug to watch relay traffic.

use nostr_feed::{FeedState, Filter, KIND_SHORT_TEXT_NOTE};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let feed = FeedState::new();

    let connected = feed.connect().await;
    if connected == 0 {
        eprintln!("No relays reachable");
        return;
    }
    println!("Connected to {connected} relays");

    let filter = Filter::new().kinds(vec![KIND_SHORT_TEXT_NOTE]).limit(100);
    match feed.subscribe_feed(vec![filter]).await {
        Ok(sub_id) => println!("Subscribed: {sub_id}"),
        Err(e) => {
            eprintln!("Subscription failed: {e}");
            return;
        }
    }

    // Let stored and live events stream in for a bit
    tokio::time::sleep(Duration::from_secs(10)).await;

    let authors = feed.sorted_authors().await;
    println!(
        "Indexed {} events from {} authors",
        feed.event_count().await,
        authors.len()
    );
    for (pubkey, record) in authors.iter().take(20) {
        println!(
            "  {}…  {} events, latest at {}",
            &pubkey[..pubkey.len().min(12)],
            record.events.len(),
            record.latest_created_at
        );
    }

    feed.disconnect().await;
}
