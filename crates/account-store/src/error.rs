//! Storage errors shared by the config provider and user store.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("User already exists: {0}")]
    AlreadyExists(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
