//! Architectural Contract Test: Zone Resolution
//!
//! Verifies resolution semantics against the provider:
//! - Domains are normalized (leading `www.` stripped) before querying
//! - An over-broad token raises a warning flag but never fails resolution
//! - An empty name-filtered result is terminal (`NoMatchingZone`) and is
//!   never retried, even with read retry configured
//! - The resolved zone id is persisted to the config store

mod common;

use common::*;
use sitesync_core::cache::StatusCache;
use sitesync_core::config::RetryConfig;
use sitesync_core::error::Error;
use sitesync_core::resolver::ZoneResolver;
use sitesync_core::store::MemoryConfigStore;
use sitesync_core::traits::{ApiClient, ConfigStore, ZONE_ID_KEY};
use std::sync::Arc;

fn resolver(
    client: &Arc<MockApiClient>,
    store: &Arc<MemoryConfigStore>,
    read_retry: Option<RetryConfig>,
) -> ZoneResolver {
    ZoneResolver::new(
        client.clone() as Arc<dyn ApiClient>,
        store.clone() as Arc<dyn ConfigStore>,
        Arc::new(StatusCache::new(300)),
        read_retry,
    )
}

#[tokio::test]
async fn www_prefix_is_stripped_before_querying() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    script_zone_resolution(&client, "example.com", "zone-1");

    let zone = resolver(&client, &store, None)
        .resolve("secret", "www.example.com")
        .await
        .unwrap();

    assert_eq!(zone.id, "zone-1");
    assert_eq!(zone.name, "example.com");

    // The filtered query used the bare root, not the www form
    let lookups: Vec<_> = client
        .calls_matching("GET", "zones")
        .into_iter()
        .filter(|call| !call.query.is_empty())
        .collect();
    assert_eq!(lookups.len(), 1);
    assert_eq!(
        lookups[0].query,
        vec![("name".to_string(), "example.com".to_string())]
    );
}

#[tokio::test]
async fn over_broad_token_warns_but_still_resolves() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    client.script("GET zones", Scripted::Ok(zone_listing(5)));
    client.script(
        "GET zones?name=example.com",
        Scripted::Ok(zone_lookup("zone-1", "example.com")),
    );

    let zone = resolver(&client, &store, None)
        .resolve("secret", "example.com")
        .await
        .unwrap();

    assert!(zone.over_scoped);
    assert_eq!(zone.accessible_zones, 5);
    assert_eq!(zone.id, "zone-1", "resolution proceeds despite the warning");
}

#[tokio::test]
async fn single_zone_token_raises_no_warning() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    script_zone_resolution(&client, "example.com", "zone-1");

    let zone = resolver(&client, &store, None)
        .resolve("secret", "example.com")
        .await
        .unwrap();

    assert!(!zone.over_scoped);
    assert_eq!(zone.accessible_zones, 1);
}

#[tokio::test]
async fn empty_lookup_is_no_matching_zone_and_never_retried() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    client.script("GET zones", Scripted::Ok(zone_listing(1)));
    client.script(
        "GET zones?name=example.com",
        Scripted::Ok(empty_zone_lookup()),
    );

    // Retry is configured, but NoMatchingZone is not transient
    let retry = RetryConfig {
        max_retries: 3,
        delay_secs: 1,
    };
    let err = resolver(&client, &store, Some(retry))
        .resolve("secret", "example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NoMatchingZone(domain) if domain == "example.com"));

    let lookups: Vec<_> = client
        .calls_matching("GET", "zones")
        .into_iter()
        .filter(|call| !call.query.is_empty())
        .collect();
    assert_eq!(lookups.len(), 1, "terminal condition queried exactly once");

    // Nothing persisted on failure
    assert_eq!(store.get(ZONE_ID_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn transient_read_failure_is_retried_when_configured() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    client.script(
        "GET zones",
        Scripted::TransportErr("connection refused".to_string()),
    );

    let retry = RetryConfig {
        max_retries: 1,
        delay_secs: 1,
    };
    let err = resolver(&client, &store, Some(retry))
        .resolve("secret", "example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    // Initial attempt plus one retry
    assert_eq!(client.calls_matching("GET", "zones").len(), 2);
}

#[tokio::test]
async fn transient_read_failure_is_not_retried_by_default() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    client.script(
        "GET zones",
        Scripted::TransportErr("connection refused".to_string()),
    );

    let err = resolver(&client, &store, None)
        .resolve("secret", "example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Transport(_)));
    assert_eq!(client.calls_matching("GET", "zones").len(), 1);
}

#[tokio::test]
async fn resolved_zone_id_is_persisted_and_reused() {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    script_zone_resolution(&client, "example.com", "zone-1");

    let resolver = resolver(&client, &store, None);

    let id = resolver.zone_id("secret", "example.com").await.unwrap();
    assert_eq!(id, "zone-1");
    assert_eq!(
        store.get(ZONE_ID_KEY).await.unwrap().as_deref(),
        Some("zone-1")
    );

    let calls_after_first = client.call_count();

    // Second call comes from the store, no provider traffic
    let id = resolver.zone_id("secret", "example.com").await.unwrap();
    assert_eq!(id, "zone-1");
    assert_eq!(client.call_count(), calls_after_first);
}
