//! Architectural Contract Test: Status View
//!
//! Verifies the read-only diagnostic report:
//! - A report renders the resolved zone, the over-broad warning, and the
//!   zone's records
//! - A missing credential is a configuration error here, not a silent skip
//! - Provider errors surface verbatim, raw status included
//! - Repeated reports within the TTL are served from the cache; a
//!   credential change evicts everything and the next report refetches

mod common;

use common::*;
use serde_json::json;
use sitesync_core::cache::StatusCache;
use sitesync_core::error::Error;
use sitesync_core::status::StatusView;
use sitesync_core::store::MemoryConfigStore;
use sitesync_core::traits::{API_TOKEN_KEY, ApiClient, ConfigStore};
use std::sync::Arc;

struct Harness {
    view: StatusView,
    client: Arc<MockApiClient>,
    store: Arc<MemoryConfigStore>,
    cache: Arc<StatusCache>,
}

fn harness(network_domain: &str) -> Harness {
    let client = Arc::new(MockApiClient::new());
    let store = Arc::new(MemoryConfigStore::new());
    let cache = Arc::new(StatusCache::new(300));
    let config = test_config(network_domain);

    let view = StatusView::new(
        client.clone() as Arc<dyn ApiClient>,
        store.clone() as Arc<dyn ConfigStore>,
        Arc::clone(&cache),
        &config,
    );

    Harness {
        view,
        client,
        store,
        cache,
    }
}

fn script_record_listing(client: &MockApiClient, zone_id: &str) {
    client.script(
        format!("GET zones/{zone_id}/dns_records"),
        Scripted::Ok(json!({
            "success": true,
            "result": [
                {"type": "CNAME", "name": "a.example.com", "content": "example.com",
                 "ttl": 1, "proxied": true},
                {"type": "A", "name": "example.com", "content": "203.0.113.9",
                 "ttl": 300, "proxied": false},
            ]
        })),
    );
}

#[tokio::test]
async fn report_renders_zone_and_records() {
    let h = harness("example.com");
    h.store.set(API_TOKEN_KEY, "secret").await.unwrap();
    script_zone_resolution(&h.client, "example.com", "zone-1");
    script_record_listing(&h.client, "zone-1");

    let report = h.view.report().await.unwrap();

    assert_eq!(report.domain, "example.com");
    assert_eq!(report.zone.id, "zone-1");
    assert_eq!(report.warning, None);
    assert_eq!(report.records.len(), 2);
    assert_eq!(report.records[0].ttl_label(), "Auto");
    assert_eq!(report.records[1].ttl_label(), "300");

    // The rendered report is usable as-is
    let rendered = report.to_string();
    assert!(rendered.contains("zone-1"));
    assert!(rendered.contains("a.example.com"));
}

#[tokio::test]
async fn over_broad_token_populates_the_warning() {
    let h = harness("example.com");
    h.store.set(API_TOKEN_KEY, "secret").await.unwrap();
    h.client.script("GET zones", Scripted::Ok(zone_listing(4)));
    h.client.script(
        "GET zones?name=example.com",
        Scripted::Ok(zone_lookup("zone-1", "example.com")),
    );
    script_record_listing(&h.client, "zone-1");

    let report = h.view.report().await.unwrap();

    let warning = report.warning.expect("warning populated");
    assert!(warning.contains("4"), "zone count surfaced: {warning}");
}

#[tokio::test]
async fn missing_credential_is_a_config_error() {
    let h = harness("example.com");

    let err = h.view.report().await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(h.client.call_count(), 0);
}

#[tokio::test]
async fn provider_error_surfaces_verbatim() {
    let h = harness("example.com");
    h.store.set(API_TOKEN_KEY, "revoked").await.unwrap();
    h.client.script(
        "GET zones",
        Scripted::ApiErr(403, "Invalid request headers".to_string()),
    );

    let err = h.view.report().await.unwrap_err();

    let Error::Api { status, message } = err else {
        panic!("expected Api error, got {err:?}");
    };
    assert_eq!(status, 403);
    assert_eq!(message, "Invalid request headers");
}

#[tokio::test]
async fn second_report_within_ttl_is_served_from_cache() {
    let h = harness("www.example.com");
    h.store.set(API_TOKEN_KEY, "secret").await.unwrap();
    script_zone_resolution(&h.client, "example.com", "zone-1");
    script_record_listing(&h.client, "zone-1");

    h.view.report().await.unwrap();
    let calls_after_first = h.client.call_count();
    assert_eq!(calls_after_first, 3, "zone list, zone lookup, record list");

    let report = h.view.report().await.unwrap();
    assert_eq!(report.records.len(), 2);
    assert_eq!(
        h.client.call_count(),
        calls_after_first,
        "no provider traffic within the TTL"
    );
}

#[tokio::test]
async fn credential_change_forces_a_full_refetch() {
    let h = harness("example.com");
    h.store.set(API_TOKEN_KEY, "secret").await.unwrap();
    script_zone_resolution(&h.client, "example.com", "zone-1");
    script_record_listing(&h.client, "zone-1");

    h.view.report().await.unwrap();
    let calls_after_first = h.client.call_count();

    // Credential rotation evicts every namespace
    h.cache.invalidate_all().await;

    h.view.report().await.unwrap();
    assert_eq!(
        h.client.call_count(),
        calls_after_first + 3,
        "all three lookups refetched after eviction"
    );
}
