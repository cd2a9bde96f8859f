// # sitesyncd - Multisite DNS Synchronizer Daemon
//
// Thin integration layer over sitesync-core:
// 1. Reads configuration from environment variables
// 2. Initializes the runtime and tracing
// 3. Wires the Cloudflare client, config store, cache, and event feed
// 4. Runs the reconciler until shutdown
//
// No reconciliation logic lives here; it is all in sitesync-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Network
// - `SITESYNC_NETWORK_DOMAIN`: Root domain of the managed network (required)
// - `SITESYNC_TEST_DOMAIN`: Staging override domain (optional)
//
// ### Provider
// - `SITESYNC_API_TOKEN`: Cloudflare API token; saved into the config store
//   at startup when set. When absent (and the store holds none), events are
//   consumed but skipped.
// - `SITESYNC_API_BASE`: API base URL (default: Cloudflare v4)
// - `SITESYNC_API_TIMEOUT_SECS`: Request timeout (default: 15)
// - `SITESYNC_TLS_VERIFY`: Set to "false" for staging endpoints only
//
// ### Config Store
// - `SITESYNC_STORE_TYPE`: file or memory (default: file)
// - `SITESYNC_STORE_PATH`: Path to the store file (required for file)
//
// ### Event Feed
// - `SITESYNC_EVENTS_PATH`: JSONL feed file of site lifecycle events
//
// ### Tuning
// - `SITESYNC_CACHE_TTL_SECS`: Status cache TTL (default: 300)
// - `SITESYNC_READ_MAX_RETRIES` / `SITESYNC_READ_RETRY_DELAY_SECS`:
//   opt-in bounded retry for idempotent reads; both must be set
// - `SITESYNC_STATUS_ON_START`: Set to "true" to log a status report once
//   at startup
// - `SITESYNC_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export SITESYNC_NETWORK_DOMAIN=example.com
// export SITESYNC_API_TOKEN=your_token
// export SITESYNC_STORE_PATH=/var/lib/sitesync/config.json
// export SITESYNC_EVENTS_PATH=/var/spool/sitesync/events.jsonl
//
// sitesyncd
// ```

use anyhow::Result;
use sitesync_core::config::{RetryConfig, StoreConfig, SyncConfig};
use sitesync_core::store::{FileConfigStore, MemoryConfigStore};
use sitesync_core::traits::{ApiClient, ConfigStore};
use sitesync_core::{Reconciler, ReconcilerEvent, StatusCache, StatusView};
use sitesync_events_jsonl::JsonlEventSource;
use sitesync_provider_cloudflare::CloudflareClient;
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration, read from the environment
struct Config {
    network_domain: String,
    test_domain: Option<String>,
    api_token: Option<String>,
    api_base: Option<String>,
    api_timeout_secs: Option<u64>,
    tls_verify: bool,
    store_type: String,
    store_path: Option<String>,
    events_path: String,
    cache_ttl_secs: Option<u64>,
    read_max_retries: Option<usize>,
    read_retry_delay_secs: Option<u64>,
    status_on_start: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            network_domain: env::var("SITESYNC_NETWORK_DOMAIN").map_err(|_| {
                anyhow::anyhow!(
                    "SITESYNC_NETWORK_DOMAIN is required. \
                    Set it via: export SITESYNC_NETWORK_DOMAIN=example.com"
                )
            })?,
            test_domain: env::var("SITESYNC_TEST_DOMAIN").ok(),
            api_token: env::var("SITESYNC_API_TOKEN").ok(),
            api_base: env::var("SITESYNC_API_BASE").ok(),
            api_timeout_secs: env::var("SITESYNC_API_TIMEOUT_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SITESYNC_API_TIMEOUT_SECS is not a number: {e}"))?,
            tls_verify: env::var("SITESYNC_TLS_VERIFY")
                .map(|v| v.to_lowercase() != "false")
                .unwrap_or(true),
            store_type: env::var("SITESYNC_STORE_TYPE").unwrap_or_else(|_| "file".to_string()),
            store_path: env::var("SITESYNC_STORE_PATH").ok(),
            events_path: env::var("SITESYNC_EVENTS_PATH").map_err(|_| {
                anyhow::anyhow!(
                    "SITESYNC_EVENTS_PATH is required. \
                    Set it via: export SITESYNC_EVENTS_PATH=/var/spool/sitesync/events.jsonl"
                )
            })?,
            cache_ttl_secs: env::var("SITESYNC_CACHE_TTL_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SITESYNC_CACHE_TTL_SECS is not a number: {e}"))?,
            read_max_retries: env::var("SITESYNC_READ_MAX_RETRIES")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("SITESYNC_READ_MAX_RETRIES is not a number: {e}"))?,
            read_retry_delay_secs: env::var("SITESYNC_READ_RETRY_DELAY_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| {
                    anyhow::anyhow!("SITESYNC_READ_RETRY_DELAY_SECS is not a number: {e}")
                })?,
            status_on_start: env::var("SITESYNC_STATUS_ON_START")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            log_level: env::var("SITESYNC_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        validate_domain_name(&self.network_domain)
            .map_err(|e| anyhow::anyhow!("SITESYNC_NETWORK_DOMAIN: {e}"))?;

        if let Some(ref test_domain) = self.test_domain {
            validate_domain_name(test_domain)
                .map_err(|e| anyhow::anyhow!("SITESYNC_TEST_DOMAIN: {e}"))?;
        }

        // Catch obvious placeholder tokens before they reach the provider
        if let Some(ref token) = self.api_token {
            let token_lower = token.to_lowercase();
            if token_lower.contains("your_token")
                || token_lower.contains("replace_me")
                || token_lower == "token"
            {
                anyhow::bail!(
                    "SITESYNC_API_TOKEN appears to be a placeholder. \
                    Use an actual API token from your DNS provider."
                );
            }
        }

        match self.store_type.as_str() {
            "memory" => {}
            "file" => {
                let Some(ref path) = self.store_path else {
                    anyhow::bail!(
                        "SITESYNC_STORE_PATH is required when SITESYNC_STORE_TYPE=file. \
                        Set it via: export SITESYNC_STORE_PATH=/var/lib/sitesync/config.json"
                    );
                };
                if path.is_empty() {
                    anyhow::bail!("SITESYNC_STORE_PATH cannot be empty");
                }
            }
            other => anyhow::bail!(
                "SITESYNC_STORE_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        }

        if self.events_path.is_empty() {
            anyhow::bail!("SITESYNC_EVENTS_PATH cannot be empty");
        }

        // Retry is opt-in and requires both knobs
        match (self.read_max_retries, self.read_retry_delay_secs) {
            (None, None) | (Some(_), Some(_)) => {}
            _ => anyhow::bail!(
                "SITESYNC_READ_MAX_RETRIES and SITESYNC_READ_RETRY_DELAY_SECS \
                must be set together"
            ),
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!(
                "SITESYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                other
            ),
        }

        Ok(())
    }

    /// Build the core configuration
    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new(&self.network_domain);
        config.test_domain = self.test_domain.clone();

        if let Some(ref base) = self.api_base {
            config.api.base_url = base.clone();
        }
        if let Some(timeout) = self.api_timeout_secs {
            config.api.timeout_secs = timeout;
        }
        config.api.verify_tls = self.tls_verify;

        config.store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
            _ => StoreConfig::Memory,
        };

        if let Some(ttl) = self.cache_ttl_secs {
            config.cache_ttl_secs = ttl;
        }

        if let (Some(max_retries), Some(delay_secs)) =
            (self.read_max_retries, self.read_retry_delay_secs)
        {
            config.read_retry = Some(RetryConfig {
                max_retries,
                delay_secs,
            });
        }

        config
    }
}

/// Validate a domain name per RFC 1035 (basic checks)
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("domain name cannot be empty");
    }

    if domain.len() > 253 {
        anyhow::bail!("domain name too long: {} chars (max 253)", domain.len());
    }

    for label in domain.split('.') {
        if label.is_empty() {
            anyhow::bail!("domain name has empty label: '{}'", domain);
        }
        if label.len() > 63 {
            anyhow::bail!("domain label too long: {} chars (max 63)", label.len());
        }
        if !label.chars().all(|c| c.is_alphanumeric() || c == '-') {
            anyhow::bail!(
                "domain label contains invalid characters: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }
        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!("domain label cannot start or end with hyphen: '{}'", label);
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    info!(domain = %config.network_domain, "starting sitesyncd");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("failed to create tokio runtime: {e}");
            return DaemonExitCode::RuntimeError.into();
        }
    };

    rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("daemon error: {e}");
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    })
    .into()
}

/// Wire the components and run the reconciler until shutdown
async fn run_daemon(config: Config) -> Result<()> {
    let sync_config = config.sync_config();

    let store: Arc<dyn ConfigStore> = match &sync_config.store {
        StoreConfig::File { path } => {
            info!(path, "using file config store");
            Arc::new(FileConfigStore::new(path).await?)
        }
        StoreConfig::Memory => {
            info!("using in-memory config store");
            Arc::new(MemoryConfigStore::new())
        }
    };

    let client: Arc<dyn ApiClient> = Arc::new(CloudflareClient::new(&sync_config.api)?);
    let cache = Arc::new(StatusCache::new(sync_config.cache_ttl_secs));

    let (reconciler, mut event_rx) = Reconciler::new(
        Arc::clone(&client),
        Arc::clone(&store),
        Arc::clone(&cache),
        &sync_config,
    )?;

    // A token from the environment replaces whatever the store holds
    if let Some(ref token) = config.api_token {
        reconciler.save_token(token).await?;
        info!("API token saved to config store");
    }

    // Monitoring events become operator-visible log lines
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ReconcilerEvent::Started => info!("reconciler started"),
                ReconcilerEvent::RecordCreated {
                    site_host,
                    record_name,
                } => info!(site = %site_host, record = %record_name, "DNS record created"),
                ReconcilerEvent::SyncFailed { site_host, error } => {
                    warn!(site = %site_host, %error, "DNS sync failed; site lifecycle unaffected");
                }
                ReconcilerEvent::SkippedUnconfigured { site_host } => {
                    warn!(site = %site_host, "DNS sync skipped: no API token configured");
                }
                ReconcilerEvent::Stopped { reason } => info!(%reason, "reconciler stopped"),
            }
        }
    });

    if config.status_on_start {
        let view = StatusView::new(
            Arc::clone(&client),
            Arc::clone(&store),
            Arc::clone(&cache),
            &sync_config,
        );
        match view.report().await {
            Ok(report) => {
                for line in report.to_string().lines() {
                    info!("{line}");
                }
            }
            Err(e) => warn!("startup status report failed: {e}"),
        }
    }

    let source = JsonlEventSource::new(&config.events_path);
    info!(path = %config.events_path, "consuming site lifecycle events");

    reconciler.run(&source).await?;

    info!("shutting down");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_validation_accepts_normal_names() {
        assert!(validate_domain_name("example.com").is_ok());
        assert!(validate_domain_name("a-b.example.co.uk").is_ok());
    }

    #[test]
    fn domain_validation_rejects_bad_names() {
        assert!(validate_domain_name("").is_err());
        assert!(validate_domain_name("exa mple.com").is_err());
        assert!(validate_domain_name("-bad.example.com").is_err());
        assert!(validate_domain_name("double..dot.com").is_err());
        assert!(validate_domain_name(&"a".repeat(254)).is_err());
    }
}
