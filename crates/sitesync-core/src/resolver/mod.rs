// # Zone Resolver
//
// Finds the provider zone for the network's root domain, with caching.
//
// ## Behavior
//
// - Domains are normalized by stripping a leading `www.` exactly once; both
//   provider queries and CNAME targets use the bare root.
// - A token that can access more than one zone raises a security warning
//   (over-broad token) but never fails resolution; the name-filtered result
//   is used regardless.
// - An empty name-filtered result is the "invalid token for domain"
//   condition: `Error::NoMatchingZone`, terminal for the current operation.
// - The resolved zone id is persisted to the config store, acting as a
//   cache across process restarts. It is dropped when the credential
//   changes.
//
// Reads go through the status cache. An opt-in bounded retry with
// exponential backoff applies to these idempotent reads only.

use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::{Namespace, StatusCache};
use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::traits::{ApiClient, ConfigStore, ZONE_ID_KEY};

/// Strip a leading `www.` prefix exactly once
pub fn normalize_domain(domain: &str) -> &str {
    domain.strip_prefix("www.").unwrap_or(domain)
}

/// A provider zone resolved for the network's root domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedZone {
    /// Provider-side zone identifier
    pub id: String,
    /// Zone domain name
    pub name: String,
    /// Security warning: the token can access more zones than this one
    ///
    /// Informational only; the UI layer surfaces it. Resolution proceeds.
    pub over_scoped: bool,
    /// Total zone count accessible to the token
    pub accessible_zones: u64,
}

/// Resolves and caches the provider zone for a domain
pub struct ZoneResolver {
    client: Arc<dyn ApiClient>,
    store: Arc<dyn ConfigStore>,
    cache: Arc<StatusCache>,
    read_retry: Option<RetryConfig>,
}

impl ZoneResolver {
    /// Create a new resolver
    pub fn new(
        client: Arc<dyn ApiClient>,
        store: Arc<dyn ConfigStore>,
        cache: Arc<StatusCache>,
        read_retry: Option<RetryConfig>,
    ) -> Self {
        Self {
            client,
            store,
            cache,
            read_retry,
        }
    }

    /// Get the zone id for a domain, store-first
    ///
    /// Returns the persisted zone id when present; otherwise performs a
    /// full resolution and persists the result.
    pub async fn zone_id(&self, token: &str, domain: &str) -> Result<String> {
        if let Some(zone_id) = self.store.get(ZONE_ID_KEY).await?
            && !zone_id.is_empty()
        {
            tracing::debug!("using persisted zone id");
            return Ok(zone_id);
        }

        let zone = self.resolve(token, domain).await?;
        Ok(zone.id)
    }

    /// Resolve the zone for a domain
    ///
    /// Performs the cached zone-list and zone-lookup queries, persists the
    /// resolved id, and returns the zone with the over-scope warning flag
    /// attached for the UI layer.
    pub async fn resolve(&self, token: &str, domain: &str) -> Result<ResolvedZone> {
        let name = normalize_domain(domain);

        let listing = self
            .cache
            .get_or_fetch(Namespace::ZoneList, name, || async {
                self.read_with_retry(|| self.client.get(token, "zones", &[]))
                    .await
            })
            .await?;

        let accessible_zones = listing["result_info"]["total_count"]
            .as_u64()
            .or_else(|| listing["result"].as_array().map(|zones| zones.len() as u64))
            .unwrap_or(0);
        let over_scoped = accessible_zones > 1;

        if over_scoped {
            tracing::warn!(
                accessible_zones,
                domain = name,
                "API token can access other zones; restrict its zone resources to this domain"
            );
        }

        let query = [("name", name)];
        let lookup = self
            .cache
            .get_or_fetch(Namespace::ZoneLookup, name, || async {
                self.read_with_retry(|| self.client.get(token, "zones", &query))
                    .await
            })
            .await?;

        let zones = lookup["result"].as_array().ok_or_else(|| {
            Error::transport("zone lookup response missing result array")
        })?;

        let zone = zones
            .first()
            .ok_or_else(|| Error::NoMatchingZone(name.to_string()))?;

        let id = zone["id"]
            .as_str()
            .ok_or_else(|| Error::transport("zone lookup response missing zone id"))?
            .to_string();
        let zone_name = zone["name"].as_str().unwrap_or(name).to_string();

        // Persisted id doubles as a cache across restarts; resolving a new
        // zone overwrites the previous one.
        self.store.set(ZONE_ID_KEY, &id).await?;

        tracing::debug!(zone_id = %id, zone = %zone_name, "zone resolved");

        Ok(ResolvedZone {
            id,
            name: zone_name,
            over_scoped,
            accessible_zones,
        })
    }

    /// Run an idempotent read, retrying transient failures when configured
    ///
    /// Mutations never pass through here. `NoMatchingZone` and other
    /// non-transient errors return immediately.
    async fn read_with_retry<F, Fut>(&self, op: F) -> Result<Value>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let Some(retry) = &self.read_retry else {
            return op().await;
        };

        let mut delay = Duration::from_secs(retry.delay_secs);
        let mut attempt = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < retry.max_retries => {
                    attempt += 1;
                    tracing::warn!(attempt, error = %err, "read failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
