//! Account storage for self-registration.
//!
//! Two collaborators live here:
//! - a [`ConfigProvider`] holding the cached [`AdminConfig`] aggregate,
//!   whose user list mirrors registered accounts
//! - a [`UserStore`] holding durable, hashed credentials
//!
//! The user store is the source of truth. The admin config user list is a
//! mirror and may lag behind it if a save fails after registration.

mod error;
mod file;
mod provider;
mod types;
mod users;

pub use error::StoreError;
pub use provider::{ConfigProvider, FileConfigProvider, MemoryConfigProvider};
pub use types::*;
pub use users::{FileUserStore, MemoryUserStore, UserStore};

use std::path::Path;
use std::sync::Arc;

/// File name of the persisted admin config inside the data directory.
pub const ADMIN_CONFIG_FILE: &str = "admin_config.json";

/// File name of the persisted credentials inside the data directory.
pub const USERS_FILE: &str = "users.json";

/// A matched pair of collaborators.
#[derive(Clone)]
pub struct Stores {
    pub config: Arc<dyn ConfigProvider>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    /// In-memory stores (no persistence).
    pub fn memory() -> Self {
        Self {
            config: Arc::new(MemoryConfigProvider::default()),
            users: Arc::new(MemoryUserStore::new()),
        }
    }

    /// File-backed stores under `dir`.
    pub async fn file(dir: &Path) -> Result<Self, StoreError> {
        let config = FileConfigProvider::open(dir.join(ADMIN_CONFIG_FILE)).await?;
        let users = FileUserStore::open(dir.join(USERS_FILE)).await?;

        Ok(Self {
            config: Arc::new(config),
            users: Arc::new(users),
        })
    }
}
