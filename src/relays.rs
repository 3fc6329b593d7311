//! Relay address handling.
//!
//! Relay addresses come from user configuration as bare hostnames, http(s)
//! URLs or WebSocket URLs. Everything is normalized to canonical WebSocket
//! form once at startup, before the list is handed to the pool.

use url::Url;

/// Relays queried for the main feed.
pub const FEED_RELAYS: &[&str] = &["wss://relay-jp.nostr.wirednet.jp/"];

/// Relays queried for profile metadata.
pub const PROFILE_RELAYS: &[&str] = &[
    "wss://bostr.nokotaro.work/",
    "wss://ipv6.nostr.wirednet.jp/",
    "wss://nos.lol/",
    "wss://nostr-pub.wellorder.net/",
    "wss://nostr-relay.nokotaro.com/",
    "wss://nostr.fediverse.jp",
    "wss://nostr.holybea.com/",
    "wss://nostream.ocha.one/",
    "wss://nrelay-jp.c-stellar.net",
    "wss://nrelay.c-stellar.net",
    "wss://offchain.pub/",
    "wss://purplepag.es/",
    "wss://r.kojira.io/",
    "wss://relay-jp.nostr.wirednet.jp/",
    "wss://relay-jp.shino3.net/",
    "wss://relay.damus.io/",
    "wss://relay.nostr.band/",
    "wss://relay.nostr.wirednet.jp/",
    "wss://relay.snort.social/",
    "wss://yabu.me/",
];

/// Normalize a single relay address to canonical WebSocket form.
///
/// `http://` and `https://` are rewritten to `ws://` and `wss://`; an
/// address with no WebSocket scheme gets `wss://` prepended. The result is
/// then canonicalized (lower-cased host, default port stripped, trailing
/// slash) by the URL parser. Input that still fails to parse is passed
/// through with only the scheme rewrite applied.
pub fn normalize_relay_url(url: &str) -> String {
    let rewritten = if let Some(rest) = url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if !url.starts_with("ws://") && !url.starts_with("wss://") {
        format!("wss://{url}")
    } else {
        url.to_string()
    };

    match Url::parse(&rewritten) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => rewritten,
    }
}

/// Normalize an ordered list of relay addresses.
///
/// Pure string transformation: same length and order as the input, no
/// network access, no error conditions.
pub fn normalize_relay_urls<S: AsRef<str>>(urls: &[S]) -> Vec<String> {
    urls.iter()
        .map(|url| normalize_relay_url(url.as_ref()))
        .collect()
}
