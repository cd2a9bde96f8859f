// # Config Store Trait
//
// Defines the interface for persistent key-value configuration storage.
//
// ## Purpose
//
// The store holds the per-network credential and the resolved zone id:
// - `cf_api_token`: opaque bearer token, absent until configured
// - `cf_zone_id`: provider zone identifier, persisted by the resolver so it
//   acts as a cache across process restarts
//
// ## Implementations
//
// - Memory: `MemoryConfigStore` (tests, ephemeral deployments)
// - File: `FileConfigStore` (JSON with atomic writes and backup recovery)
//
// ## Usage
//
// ```rust,ignore
// use sitesync_core::traits::{ConfigStore, API_TOKEN_KEY};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let store = /* ConfigStore implementation */;
//
//     store.set(API_TOKEN_KEY, "secret").await?;
//     let token = store.get(API_TOKEN_KEY).await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Store key for the provider API token
pub const API_TOKEN_KEY: &str = "cf_api_token";

/// Store key for the resolved zone identifier
pub const ZONE_ID_KEY: &str = "cf_zone_id";

/// Trait for key-value configuration store implementations
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
/// Values are single shared strings per managed network; concurrent readers
/// may observe a stale zone id, which is acceptable because resolution is
/// rare and idempotent to re-run.
#[async_trait]
pub trait ConfigStore: Send + Sync {
    /// Get the value for a key
    ///
    /// # Returns
    ///
    /// - `Ok(Some(String))`: the stored value
    /// - `Ok(None)`: no value stored
    /// - `Err(Error)`: storage error
    async fn get(&self, key: &str) -> Result<Option<String>, crate::Error>;

    /// Set the value for a key, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<(), crate::Error>;

    /// Delete a key
    ///
    /// Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), crate::Error>;
}
