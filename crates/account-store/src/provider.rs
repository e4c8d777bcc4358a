//! Admin configuration providers.

use crate::error::StoreError;
use crate::file::{read_json, write_json};
use crate::types::AdminConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

/// Loads and persists the cached admin configuration.
#[async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Current configuration. Callers receive their own copy.
    async fn get(&self) -> Result<AdminConfig, StoreError>;

    /// Replace the stored configuration.
    async fn save(&self, config: &AdminConfig) -> Result<(), StoreError>;
}

/// Configuration held in process memory only.
#[derive(Default)]
pub struct MemoryConfigProvider {
    config: RwLock<AdminConfig>,
}

impl MemoryConfigProvider {
    pub fn new(config: AdminConfig) -> Self {
        Self {
            config: RwLock::new(config),
        }
    }
}

#[async_trait]
impl ConfigProvider for MemoryConfigProvider {
    async fn get(&self) -> Result<AdminConfig, StoreError> {
        Ok(self.config.read().await.clone())
    }

    async fn save(&self, config: &AdminConfig) -> Result<(), StoreError> {
        *self.config.write().await = config.clone();
        debug!("Memory config provider: saved {} users", config.users().len());
        Ok(())
    }
}

/// Configuration persisted as a JSON file and cached in memory.
pub struct FileConfigProvider {
    path: PathBuf,
    cache: RwLock<AdminConfig>,
}

impl FileConfigProvider {
    /// Open the provider, loading the file if it exists.
    ///
    /// A missing file yields an empty configuration.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let config: AdminConfig = read_json(&path).await?.unwrap_or_default();

        info!(
            "Loaded admin config with {} users from {:?}",
            config.users().len(),
            path
        );

        Ok(Self {
            path,
            cache: RwLock::new(config),
        })
    }
}

#[async_trait]
impl ConfigProvider for FileConfigProvider {
    async fn get(&self) -> Result<AdminConfig, StoreError> {
        Ok(self.cache.read().await.clone())
    }

    #[instrument(skip(self, config), fields(path = ?self.path))]
    async fn save(&self, config: &AdminConfig) -> Result<(), StoreError> {
        let mut cache = self.cache.write().await;
        write_json(&self.path, config).await?;
        *cache = config.clone();
        Ok(())
    }
}
