//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Consuming site lifecycle events from a SiteEventSource
//! - Resolving the network's zone via ZoneResolver (store-first, cached)
//! - Issuing the corresponding CNAME mutation through the ApiClient
//! - Evicting the status cache after every handled event
//!
//! ## Event Flow
//!
//! 1. Site lifecycle event received
//! 2. Credential checked; missing credential is a silent skip, never an error
//! 3. Zone resolved (persisted id, else provider lookup)
//! 4. Record mutation issued (created/renamed); deletes are a recorded gap
//! 5. Status cache invalidated, monitoring event emitted
//!
//! ## Failure Policy
//!
//! A DNS provider outage must never block site creation. Mutation failures
//! are swallowed at this boundary: logged, emitted as a monitoring event
//! (the admin-notice surface), and reported as a typed `Outcome` the caller
//! must acknowledge, but never propagated into the lifecycle flow.

use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tracing::{debug, error, info, warn};

use crate::cache::StatusCache;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::resolver::{ZoneResolver, normalize_domain};
use crate::traits::{
    API_TOKEN_KEY, ApiClient, ConfigStore, SiteDescriptor, SiteEvent, SiteEventSource,
    ZONE_ID_KEY,
};

/// Why an event produced no record mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No credential configured; the reconciler degrades silently
    MissingCredential,
    /// Record deletion is designed but not wired up
    DeleteNotImplemented,
}

/// Result of handling one lifecycle event
///
/// `handle_event` never returns `Err`: failures surface here so callers
/// must acknowledge them without the lifecycle flow aborting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A CNAME record creation was requested
    RecordCreated {
        /// Record name (CNAME subject)
        name: String,
        /// Record content (CNAME target, the bare root domain)
        content: String,
    },
    /// No mutation was attempted
    Skipped(SkipReason),
    /// The mutation was attempted and failed; logged and swallowed
    Failed {
        /// Rendered error, including the raw status when available
        error: String,
    },
}

/// Monitoring events emitted by the reconciler
///
/// The daemon logs these; an admin surface can turn them into notices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcilerEvent {
    /// Reconciler started consuming the event feed
    Started,
    /// A CNAME record creation was requested
    RecordCreated {
        site_host: String,
        record_name: String,
    },
    /// A sync attempt failed (swallowed; site lifecycle unaffected)
    SyncFailed { site_host: String, error: String },
    /// An event was skipped because no credential is configured
    SkippedUnconfigured { site_host: String },
    /// Reconciler stopped
    Stopped { reason: String },
}

/// Reconciles site lifecycle events against provider DNS records
///
/// ## Lifecycle
///
/// 1. Create with [`Reconciler::new()`]
/// 2. Either drive it per-event via [`Reconciler::handle_event()`] or run
///    the feed loop with [`Reconciler::run()`]
/// 3. The loop exits on shutdown signal or when the event feed ends
pub struct Reconciler {
    client: Arc<dyn ApiClient>,
    store: Arc<dyn ConfigStore>,
    cache: Arc<StatusCache>,
    resolver: ZoneResolver,
    network_domain: String,
    test_domain: Option<String>,
    event_tx: mpsc::Sender<ReconcilerEvent>,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Returns
    ///
    /// A tuple of (reconciler, event_receiver) where the receiver yields
    /// monitoring events.
    pub fn new(
        client: Arc<dyn ApiClient>,
        store: Arc<dyn ConfigStore>,
        cache: Arc<StatusCache>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<ReconcilerEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.event_channel_capacity);

        let resolver = ZoneResolver::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Arc::clone(&cache),
            config.read_retry.clone(),
        );

        let reconciler = Self {
            client,
            store,
            cache,
            resolver,
            network_domain: config.network_domain.clone(),
            test_domain: config.test_domain.clone(),
            event_tx: tx,
        };

        Ok((reconciler, rx))
    }

    /// Handle one site lifecycle event
    ///
    /// Never returns an error: failures are logged, emitted as monitoring
    /// events, and reported in the returned `Outcome`.
    pub async fn handle_event(&self, event: &SiteEvent) -> Outcome {
        let result = match event {
            SiteEvent::Created { site } => self.create_record(site).await,
            SiteEvent::Renamed { new_site, old_site } => {
                // A rename currently creates a fresh record for the new
                // host and leaves the old record in place.
                // TODO: delete the stale record for old_site.host via
                // DELETE zones/<zone_id>/dns_records/<record_id> once
                // match-by-old-host deletion is confirmed safe.
                debug!(
                    old = %old_site.host,
                    new = %new_site.host,
                    "site renamed; stale record for the old host is not removed"
                );
                self.create_record(new_site).await
            }
            SiteEvent::Deleted { old_site } => {
                // TODO: delete the record matching old_site.host via
                // DELETE zones/<zone_id>/dns_records/<record_id>.
                warn!(
                    site = %old_site.host,
                    "site deleted; record deletion is not implemented, record left in place"
                );
                Ok(Outcome::Skipped(SkipReason::DeleteNotImplemented))
            }
        };

        // The status view must not serve pre-event state.
        self.cache.invalidate_all().await;

        match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(site = event.subject_host(), error = %err, "DNS sync failed");
                self.emit_event(ReconcilerEvent::SyncFailed {
                    site_host: event.subject_host().to_string(),
                    error: err.to_string(),
                });
                Outcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Issue a CNAME creation for a site
    ///
    /// Fire-and-forget: there is no pre-check for an existing record;
    /// rejecting duplicates is the provider's responsibility.
    async fn create_record(&self, site: &SiteDescriptor) -> Result<Outcome> {
        let token = match self.store.get(API_TOKEN_KEY).await? {
            Some(token) if !token.is_empty() => token,
            _ => {
                debug!(site = %site.host, "no credential configured, skipping DNS sync");
                self.emit_event(ReconcilerEvent::SkippedUnconfigured {
                    site_host: site.host.clone(),
                });
                return Ok(Outcome::Skipped(SkipReason::MissingCredential));
            }
        };

        let zone_id = self.resolver.zone_id(&token, &self.network_domain).await?;

        let (name, content) = self.record_payload(&site.host);
        let body = json!({
            "type": "CNAME",
            "name": &name,
            "content": &content,
            "ttl": 1,
            "proxied": true,
        });

        self.client
            .post(&token, &format!("zones/{zone_id}/dns_records"), &body)
            .await?;

        info!(record = %name, content = %content, "CNAME record created");
        self.emit_event(ReconcilerEvent::RecordCreated {
            site_host: site.host.clone(),
            record_name: name.clone(),
        });

        Ok(Outcome::RecordCreated { name, content })
    }

    /// Compute the CNAME subject and content for a site host
    ///
    /// Content is the bare network root (leading `www.` stripped). With a
    /// test-domain override, both the content and the host's network-domain
    /// suffix are substituted so staging runs against a throwaway zone.
    fn record_payload(&self, site_host: &str) -> (String, String) {
        match &self.test_domain {
            Some(test_domain) => {
                let name = match site_host.strip_suffix(self.network_domain.as_str()) {
                    Some(prefix) => format!("{prefix}{test_domain}"),
                    None => site_host.to_string(),
                };
                (name, test_domain.clone())
            }
            None => (
                site_host.to_string(),
                normalize_domain(&self.network_domain).to_string(),
            ),
        }
    }

    /// Save a new credential
    ///
    /// The zone resolved under the old credential is no longer
    /// authoritative: the persisted zone id is dropped and the status cache
    /// fully evicted in the same operation.
    pub async fn save_token(&self, token: &str) -> Result<()> {
        self.store.set(API_TOKEN_KEY, token).await?;
        self.store.delete(ZONE_ID_KEY).await?;
        self.cache.invalidate_all().await;
        info!("credential updated; zone id and caches invalidated");
        Ok(())
    }

    /// Remove the credential and all derived state
    pub async fn clear_token(&self) -> Result<()> {
        self.store.delete(API_TOKEN_KEY).await?;
        self.store.delete(ZONE_ID_KEY).await?;
        self.cache.invalidate_all().await;
        info!("credential cleared");
        Ok(())
    }

    /// Run the reconciler over an event feed until shutdown
    ///
    /// Handles events sequentially. Individual sync failures never stop the
    /// loop; it exits on SIGINT or when the feed ends.
    pub async fn run(&self, source: &dyn SiteEventSource) -> Result<()> {
        self.run_internal(source, None).await
    }

    /// Test-only helper to run the loop with a controlled shutdown signal
    ///
    /// Production code should use `run()`, which shuts down on OS signals.
    pub async fn run_with_shutdown(
        &self,
        source: &dyn SiteEventSource,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.run_internal(source, shutdown_rx).await
    }

    async fn run_internal(
        &self,
        source: &dyn SiteEventSource,
        shutdown_rx: Option<tokio::sync::oneshot::Receiver<()>>,
    ) -> Result<()> {
        self.emit_event(ReconcilerEvent::Started);
        let mut events = source.watch();

        if let Some(mut rx) = shutdown_rx {
            // Test mode: wait for the provided shutdown signal
            loop {
                tokio::select! {
                    maybe_event = events.next() => match maybe_event {
                        Some(event) => {
                            let outcome = self.handle_event(&event).await;
                            debug!(?outcome, site = event.subject_host(), "event handled");
                        }
                        None => {
                            info!("event feed ended");
                            self.emit_event(ReconcilerEvent::Stopped {
                                reason: "event feed ended".to_string(),
                            });
                            break;
                        }
                    },

                    _ = &mut rx => {
                        info!("shutdown signal received");
                        self.emit_event(ReconcilerEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        } else {
            // Production mode: wait for SIGINT
            loop {
                tokio::select! {
                    maybe_event = events.next() => match maybe_event {
                        Some(event) => {
                            let outcome = self.handle_event(&event).await;
                            debug!(?outcome, site = event.subject_host(), "event handled");
                        }
                        None => {
                            info!("event feed ended");
                            self.emit_event(ReconcilerEvent::Stopped {
                                reason: "event feed ended".to_string(),
                            });
                            break;
                        }
                    },

                    _ = tokio::signal::ctrl_c() => {
                        info!("shutdown signal received");
                        self.emit_event(ReconcilerEvent::Stopped {
                            reason: "shutdown signal".to_string(),
                        });
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Emit a monitoring event, dropping it with a warning when the
    /// channel is full
    fn emit_event(&self, event: ReconcilerEvent) {
        if self.event_tx.try_send(event).is_err() {
            warn!("monitoring event channel full, dropping event");
        }
    }
}
