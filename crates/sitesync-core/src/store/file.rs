// # File Config Store
//
// File-based implementation of ConfigStore with crash recovery.
//
// ## Purpose
//
// Persists the credential and resolved zone id across daemon restarts, so
// the zone does not have to be re-resolved on every start.
//
// ## Crash Recovery
//
// - Atomic writes: write-then-rename
// - Corruption detection: JSON validated on load
// - Automatic backup: `.backup` of the last known good state
// - Recovery: falls back to the backup when corruption is detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "values": {
//     "cf_api_token": "...",
//     "cf_zone_id": "..."
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::traits::ConfigStore;

/// Config file format version, for future migration
const CONFIG_FILE_VERSION: &str = "1.0";

/// File-based config store with crash recovery
///
/// Values are persisted to a JSON file with atomic writes and automatic
/// corruption recovery. Every mutation writes through to disk immediately;
/// the credential must survive a crash.
///
/// # Example
///
/// ```rust,no_run
/// use sitesync_core::store::FileConfigStore;
/// use sitesync_core::traits::{ConfigStore, API_TOKEN_KEY};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileConfigStore::new("/var/lib/sitesync/config.json").await?;
///
///     store.set(API_TOKEN_KEY, "secret").await?;
///     let token = store.get(API_TOKEN_KEY).await?;
///     assert_eq!(token.as_deref(), Some("secret"));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    values: Arc<RwLock<HashMap<String, String>>>,
}

/// Serializable config file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct ConfigFileFormat {
    version: String,
    values: HashMap<String, String>,
}

impl FileConfigStore {
    /// Create or load a file config store
    ///
    /// Loads the existing file when present, recovering from the backup if
    /// the main file is corrupted. Creates parent directories as needed.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::store(format!(
                    "failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let values = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            values: Arc::new(RwLock::new(values)),
        })
    }

    /// Load values, falling back to the backup on corruption
    ///
    /// Recovery order: main file, then backup, then empty. A corrupted
    /// store means the credential must be re-supplied, which is preferable
    /// to refusing to start.
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, String>, Error> {
        match Self::load(path).await {
            Ok(values) => {
                tracing::debug!(count = values.len(), "loaded config store");
                Ok(values)
            }
            Err(e) if e.is_corruption() => {
                tracing::warn!(error = %e, "config file corrupted, attempting backup recovery");

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("no backup file found, starting with empty config");
                    return Ok(HashMap::new());
                }

                match Self::load(&backup_path).await {
                    Ok(values) => {
                        tracing::info!(count = values.len(), "recovered config from backup");
                        if let Err(restore_err) = fs::copy(&backup_path, path).await {
                            tracing::error!(
                                error = %restore_err,
                                "failed to restore config file from backup"
                            );
                        }
                        Ok(values)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            error = %backup_err,
                            "backup also corrupted, starting with empty config"
                        );
                        Ok(HashMap::new())
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<HashMap<String, String>, Error> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file does not exist");
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!(
                "failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let file: ConfigFileFormat = serde_json::from_str(&content)?;

        if file.version != CONFIG_FILE_VERSION {
            tracing::warn!(
                expected = CONFIG_FILE_VERSION,
                got = %file.version,
                "config file version mismatch, loading anyway"
            );
        }

        Ok(file.values)
    }

    /// Write values to disk atomically
    async fn write(&self) -> Result<(), Error> {
        let values = self.values.read().await.clone();

        let file = ConfigFileFormat {
            version: CONFIG_FILE_VERSION.to_string(),
            values,
        };
        let json = serde_json::to_string_pretty(&file)?;

        // Write to a temporary file first
        let temp_path = self.temp_path();
        {
            let mut f = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            f.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "failed to write temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            f.flush().await.map_err(|e| {
                Error::store(format!(
                    "failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        // Keep the last known good state around
        if self.path.exists()
            && let Err(e) = fs::copy(&self.path, Self::backup_path(&self.path)).await
        {
            tracing::warn!(error = %e, "failed to create config backup");
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(path = %self.path.display(), "config written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

#[async_trait]
impl ConfigStore for FileConfigStore {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let guard = self.values.read().await;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), Error> {
        {
            let mut guard = self.values.write().await;
            guard.insert(key.to_string(), value.to_string());
        }
        self.write().await
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        {
            let mut guard = self.values.write().await;
            guard.remove(key);
        }
        self.write().await
    }
}
