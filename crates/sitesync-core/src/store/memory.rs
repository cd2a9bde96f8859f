// # Memory Config Store
//
// In-memory implementation of ConfigStore.
//
// ## Purpose
//
// A simple, fast store with no persistence across restarts. On restart the
// credential must be re-supplied and the zone is re-resolved on the next
// event, which is harmless.
//
// ## When to Use
//
// - Testing environments
// - Container deployments where the credential arrives via environment

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ConfigStore;

/// In-memory config store implementation
///
/// All values live in a HashMap protected by a RwLock. Nothing persists
/// across restarts.
///
/// # Example
///
/// ```rust,no_run
/// use sitesync_core::store::MemoryConfigStore;
/// use sitesync_core::traits::{ConfigStore, API_TOKEN_KEY};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryConfigStore::new();
///
///     store.set(API_TOKEN_KEY, "secret").await?;
///     let token = store.get(API_TOKEN_KEY).await?;
///     assert_eq!(token.as_deref(), Some("secret"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct MemoryConfigStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryConfigStore {
    /// Create a new empty memory config store
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Number of stored values
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Remove all values
    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}

impl Default for MemoryConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.inner.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        guard.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::{API_TOKEN_KEY, ZONE_ID_KEY};

    #[tokio::test]
    async fn test_memory_store_basic() {
        let store = MemoryConfigStore::new();

        assert!(store.is_empty().await);

        store.set(API_TOKEN_KEY, "secret").await.unwrap();
        assert_eq!(store.len().await, 1);
        assert_eq!(
            store.get(API_TOKEN_KEY).await.unwrap().as_deref(),
            Some("secret")
        );

        store.delete(API_TOKEN_KEY).await.unwrap();
        assert_eq!(store.get(API_TOKEN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let store = MemoryConfigStore::new();
        store.delete(ZONE_ID_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_set_replaces_previous_value() {
        let store = MemoryConfigStore::new();

        store.set(ZONE_ID_KEY, "zone-a").await.unwrap();
        store.set(ZONE_ID_KEY, "zone-b").await.unwrap();

        assert_eq!(
            store.get(ZONE_ID_KEY).await.unwrap().as_deref(),
            Some("zone-b")
        );
    }
}
