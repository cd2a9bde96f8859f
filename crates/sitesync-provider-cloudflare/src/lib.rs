// # Cloudflare API Client
//
// Thin HTTP client for the Cloudflare v4 API, implementing the core
// `ApiClient` trait.
//
// ## Responsibilities
//
// - One HTTP request per call; no retries, no backoff (owned by the core,
//   and only for idempotent reads)
// - No caching (owned by the status cache)
// - No interpretation of response payloads beyond classification:
//   - 2xx with a JSON body → `Ok(Value)`
//   - non-2xx → `Error::Api` carrying the raw status and the provider's
//     message verbatim
//   - network failure, timeout, or malformed body → `Error::Transport`
//
// ## Security
//
// - The API token is passed per call and NEVER logged
// - TLS verification can be disabled for staging endpoints only; doing so
//   logs a loud warning

use async_trait::async_trait;
use serde_json::Value;
use sitesync_core::config::ApiConfig;
use sitesync_core::traits::ApiClient;
use sitesync_core::{Error, Result};
use std::time::Duration;
use tracing::{debug, warn};

/// User agent sent with every request
const USER_AGENT: &str = concat!("sitesync/", env!("CARGO_PKG_VERSION"));

/// Cloudflare v4 API client
///
/// Holds a connection-pooled `reqwest::Client` configured from
/// [`ApiConfig`]: request timeout, user agent, and TLS verification.
#[derive(Debug, Clone)]
pub struct CloudflareClient {
    http: reqwest::Client,
    base_url: String,
}

impl CloudflareClient {
    /// Build a client from the API configuration
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT);

        if !config.verify_tls {
            warn!("TLS certificate verification is DISABLED; use only against staging endpoints");
            builder = builder.danger_accept_invalid_certs(true);
        }

        let http = builder
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Classify a response per the trust boundary
    ///
    /// The body of a failed request is reported verbatim: the Cloudflare
    /// error envelope's first message when present, the raw body otherwise.
    async fn classify(response: reqwest::Response) -> Result<Value> {
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error response".to_string());
            let message = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|envelope| {
                    envelope["errors"][0]["message"]
                        .as_str()
                        .map(str::to_string)
                })
                .unwrap_or(body);
            return Err(Error::api(status.as_u16(), message));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(format!("failed to read response body: {e}")))?;
        serde_json::from_str(&body)
            .map_err(|e| Error::transport(format!("malformed JSON response: {e}")))
    }
}

#[async_trait]
impl ApiClient for CloudflareClient {
    async fn get(&self, token: &str, path: &str, query: &[(&str, &str)]) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, "GET request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::transport(format!("GET {path} failed: {e}")))?;

        Self::classify(response).await
    }

    async fn post(&self, token: &str, path: &str, body: &Value) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, "POST request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::transport(format!("POST {path} failed: {e}")))?;

        Self::classify(response).await
    }

    async fn delete(&self, token: &str, path: &str) -> Result<Value> {
        let url = self.url(path);
        debug!(%url, "DELETE request");

        let response = self
            .http
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| Error::transport(format!("DELETE {path} failed: {e}")))?;

        Self::classify(response).await
    }
}
