// # Status Cache
//
// Time-bounded read-through cache for provider lookups, so the admin status
// view and the reconciler don't hammer the provider API on every
// render/event.
//
// ## Namespaces
//
// Three fixed namespaces, keyed by domain so tenants never share entries:
// - zone-list: the unfiltered zone listing (accessible-zone count)
// - zone-lookup: the name-filtered zone query
// - dns-record-list: the record listing for the resolved zone
//
// The namespaces are causally dependent (zone lookup depends on the
// credential; the record list depends on the zone id), so invalidation
// always evicts all three under a single write lock.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use tokio::sync::RwLock;

use crate::error::Result;

/// Cache namespace for one class of provider lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Unfiltered zone listing
    ZoneList,
    /// Name-filtered zone lookup
    ZoneLookup,
    /// DNS record listing for the resolved zone
    RecordList,
}

impl Namespace {
    /// All namespaces, in eviction order
    pub const ALL: [Namespace; 3] = [
        Namespace::ZoneList,
        Namespace::ZoneLookup,
        Namespace::RecordList,
    ];

    /// Stable name, used in logs
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::ZoneList => "zone-list",
            Namespace::ZoneLookup => "zone-lookup",
            Namespace::RecordList => "dns-record-list",
        }
    }
}

/// A cached value with its fetch timestamp
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    fetched_at: DateTime<Utc>,
}

impl CacheEntry {
    fn new(value: Value) -> Self {
        Self {
            value,
            fetched_at: Utc::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        Utc::now().signed_duration_since(self.fetched_at) < ttl
    }
}

/// Read-through cache over provider lookups
///
/// Entries older than the TTL are treated as absent. Safe under concurrent
/// reads and writes; entry replacement happens under the write lock.
pub struct StatusCache {
    ttl: Duration,
    entries: RwLock<HashMap<(Namespace, String), CacheEntry>>,
}

impl StatusCache {
    /// Create a cache with the given TTL in seconds
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Return the cached value if fresh, otherwise fetch, store, and return
    ///
    /// The fetch future runs without the lock held. A failed fetch is not
    /// cached; the next read tries again.
    pub async fn get_or_fetch<F, Fut>(&self, ns: Namespace, key: &str, fetch: F) -> Result<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        {
            let entries = self.entries.read().await;
            if let Some(entry) = entries.get(&(ns, key.to_string()))
                && entry.is_fresh(self.ttl)
            {
                tracing::trace!(namespace = ns.as_str(), key, "cache hit");
                return Ok(entry.value.clone());
            }
        }

        tracing::debug!(namespace = ns.as_str(), key, "cache miss, fetching");
        let value = fetch().await?;

        let mut entries = self.entries.write().await;
        entries.insert((ns, key.to_string()), CacheEntry::new(value.clone()));
        Ok(value)
    }

    /// Evict all namespaces for one domain key
    ///
    /// Atomic: all three namespaces go under a single write lock. Partial
    /// invalidation would leave causally-dependent entries inconsistent.
    pub async fn invalidate(&self, key: &str) {
        let mut entries = self.entries.write().await;
        for ns in Namespace::ALL {
            entries.remove(&(ns, key.to_string()));
        }
        tracing::debug!(key, "cache invalidated");
    }

    /// Evict everything (credential change, manual refresh)
    pub async fn invalidate_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
        tracing::debug!("cache fully invalidated");
    }

    /// Number of live entries (fresh or not)
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Check if the cache is empty
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
