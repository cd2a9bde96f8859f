// # API Client Trait
//
// Defines the low-level interface to the DNS provider's REST API.
//
// ## Implementations
//
// - Cloudflare: `sitesync-provider-cloudflare` crate
//
// ## Contract
//
// Paths are relative to the provider base URL (e.g., "zones",
// "zones/<id>/dns_records"). Every call attaches the bearer credential it
// is given and is bounded by the configured request timeout.
//
// Response classification:
// - HTTP 200 with a well-formed JSON body → `Ok(body)`
// - any non-200 → `Error::Api { status, message }` with the raw status
// - transport failure or malformed JSON → `Error::Transport`
//
// Callers never receive a partially-parsed body.
//
// ## Trust boundary
//
// Implementations perform single-shot HTTP calls only. They must not retry,
// cache, or consult the config store; retry policy (reads only, opt-in) is
// owned by the resolver, and caching is owned by `StatusCache`.

use async_trait::async_trait;
use serde_json::Value;

/// Low-level provider API client
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Perform a GET request
    ///
    /// # Parameters
    ///
    /// - `token`: bearer credential attached as `Authorization: Bearer <token>`
    /// - `path`: path relative to the provider base URL
    /// - `query`: query string pairs
    async fn get(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Value, crate::Error>;

    /// Perform a POST request with a JSON body
    async fn post(&self, token: &str, path: &str, body: &Value) -> Result<Value, crate::Error>;

    /// Perform a DELETE request
    async fn delete(&self, token: &str, path: &str) -> Result<Value, crate::Error>;
}
