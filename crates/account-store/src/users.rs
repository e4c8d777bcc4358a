//! Durable credential stores.

use crate::error::StoreError;
use crate::file::{read_json, write_json};
use crate::types::UserAccount;
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// Creates durable credentials for new users.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Register a new credential. Fails if the username already holds one.
    async fn register(&self, username: &str, password: &SecretString) -> Result<(), StoreError>;
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryUserStore {
    accounts: RwLock<HashMap<String, UserAccount>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get an account by username.
    pub async fn get(&self, username: &str) -> Option<UserAccount> {
        self.accounts.read().await.get(username).cloned()
    }

    /// Number of stored credentials.
    pub async fn count(&self) -> usize {
        self.accounts.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    #[instrument(skip(self, password))]
    async fn register(&self, username: &str, password: &SecretString) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(username) {
            return Err(StoreError::AlreadyExists(username.to_string()));
        }

        let account = UserAccount::new(username, password.expose_secret())?;
        accounts.insert(username.to_string(), account);
        info!("Stored credential for {}", username);
        Ok(())
    }
}

/// Credential store persisted as a JSON file.
///
/// The write lock is held across the file write, so registrations are
/// applied one at a time.
pub struct FileUserStore {
    path: PathBuf,
    accounts: RwLock<HashMap<String, UserAccount>>,
}

impl FileUserStore {
    /// Open the store, loading the file if it exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let accounts: HashMap<String, UserAccount> = read_json(&path).await?.unwrap_or_default();

        info!("Loaded {} credentials from {:?}", accounts.len(), path);

        Ok(Self {
            path,
            accounts: RwLock::new(accounts),
        })
    }

    /// Get an account by username.
    pub async fn get(&self, username: &str) -> Option<UserAccount> {
        self.accounts.read().await.get(username).cloned()
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    #[instrument(skip(self, password))]
    async fn register(&self, username: &str, password: &SecretString) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(username) {
            return Err(StoreError::AlreadyExists(username.to_string()));
        }

        let mut updated = accounts.clone();
        updated.insert(
            username.to_string(),
            UserAccount::new(username, password.expose_secret())?,
        );
        write_json(&self.path, &updated).await?;
        *accounts = updated;

        info!("Stored credential for {}", username);
        Ok(())
    }
}
