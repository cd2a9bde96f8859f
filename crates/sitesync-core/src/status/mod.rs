// # Status View
//
// Read-only diagnostic report over the provider state: the resolved zone,
// the over-broad-token warning, and the zone's DNS records rendered as
// rows. All reads go through the status cache, so repeated renders within
// the TTL cost no provider calls.
//
// A missing credential is a configuration error here (unlike the
// reconciler, which skips silently): a status request is an explicit ask
// and deserves a real answer. Provider errors surface verbatim, raw status
// included, so an operator can tell a revoked token from an outage.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::cache::{Namespace, StatusCache};
use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::resolver::{ResolvedZone, ZoneResolver, normalize_domain};
use crate::traits::{API_TOKEN_KEY, ApiClient, ConfigStore};

/// One DNS record rendered for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordRow {
    /// 1-based position in the listing
    pub index: usize,
    /// Record type (CNAME, A, ...)
    pub record_type: String,
    /// Record name
    pub name: String,
    /// Record content (target)
    pub content: String,
    /// TTL in seconds; 1 means provider-automatic
    pub ttl: u64,
    /// Whether the record is proxied through the provider
    pub proxied: bool,
}

impl RecordRow {
    /// Human label for the TTL; the provider uses 1 for "automatic"
    pub fn ttl_label(&self) -> String {
        if self.ttl == 1 {
            "Auto".to_string()
        } else {
            self.ttl.to_string()
        }
    }

    /// Human label for the proxy flag
    pub fn proxy_label(&self) -> &'static str {
        if self.proxied { "Enabled" } else { "Disabled" }
    }
}

/// Full status report for the managed domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// The bare root domain the report covers
    pub domain: String,
    /// The resolved zone
    pub zone: ResolvedZone,
    /// Security warning, when the token is broader than this zone
    pub warning: Option<String>,
    /// DNS records in the zone
    pub records: Vec<RecordRow>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Zone: {} ({})", self.zone.name, self.zone.id)?;
        if let Some(warning) = &self.warning {
            writeln!(f, "Warning: {warning}")?;
        }
        writeln!(f, "{} record(s):", self.records.len())?;
        for row in &self.records {
            writeln!(
                f,
                "  {:>3}. {:<6} {:<40} -> {:<40} ttl={:<5} proxy={}",
                row.index,
                row.record_type,
                row.name,
                row.content,
                row.ttl_label(),
                row.proxy_label(),
            )?;
        }
        Ok(())
    }
}

/// Builds status reports from cached provider reads
pub struct StatusView {
    client: Arc<dyn ApiClient>,
    store: Arc<dyn ConfigStore>,
    cache: Arc<StatusCache>,
    resolver: ZoneResolver,
    network_domain: String,
}

impl StatusView {
    /// Create a status view sharing the reconciler's cache
    ///
    /// Sharing matters: a credential change invalidates one cache and both
    /// consumers see fresh state.
    pub fn new(
        client: Arc<dyn ApiClient>,
        store: Arc<dyn ConfigStore>,
        cache: Arc<StatusCache>,
        config: &SyncConfig,
    ) -> Self {
        let resolver = ZoneResolver::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Arc::clone(&cache),
            config.read_retry.clone(),
        );
        Self {
            client,
            store,
            cache,
            resolver,
            network_domain: config.network_domain.clone(),
        }
    }

    /// Build the status report for the managed domain
    ///
    /// # Errors
    ///
    /// - `Error::Config` when no credential is configured
    /// - `Error::NoMatchingZone` when the token cannot see the domain
    /// - `Error::Api` with the provider's status and message verbatim
    pub async fn report(&self) -> Result<StatusReport> {
        let token = match self.store.get(API_TOKEN_KEY).await? {
            Some(token) if !token.is_empty() => token,
            _ => {
                return Err(Error::config(
                    "no API token configured; save a credential before requesting status",
                ));
            }
        };

        let domain = normalize_domain(&self.network_domain).to_string();
        let zone = self.resolver.resolve(&token, &domain).await?;

        let warning = zone.over_scoped.then(|| {
            format!(
                "API token can access {} zones; restrict its zone resources to {}",
                zone.accessible_zones, domain
            )
        });

        let listing = self
            .cache
            .get_or_fetch(Namespace::RecordList, &domain, || async {
                self.client
                    .get(&token, &format!("zones/{}/dns_records", zone.id), &[])
                    .await
            })
            .await?;

        let records = Self::rows_from_listing(&listing)?;

        Ok(StatusReport {
            domain,
            zone,
            warning,
            records,
        })
    }

    fn rows_from_listing(listing: &Value) -> Result<Vec<RecordRow>> {
        let entries = listing["result"]
            .as_array()
            .ok_or_else(|| Error::transport("record listing response missing result array"))?;

        let rows = entries
            .iter()
            .enumerate()
            .map(|(i, record)| RecordRow {
                index: i + 1,
                record_type: record["type"].as_str().unwrap_or("?").to_string(),
                name: record["name"].as_str().unwrap_or("").to_string(),
                content: record["content"].as_str().unwrap_or("").to_string(),
                ttl: record["ttl"].as_u64().unwrap_or(0),
                proxied: record["proxied"].as_bool().unwrap_or(false),
            })
            .collect();

        Ok(rows)
    }
}
