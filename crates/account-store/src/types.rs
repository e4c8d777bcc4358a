//! Admin configuration and account types.

use crate::error::StoreError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a user in the admin configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Site owner, configured out of band
    Owner,
    Admin,
    User,
}

/// One entry in the admin configuration's user list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub username: String,
    pub role: Role,
    #[serde(default)]
    pub banned: bool,
}

impl UserRecord {
    /// Record for a self-registered account: plain user, not banned.
    pub fn new_user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::User,
            banned: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct UserConfig {
    #[serde(rename = "Users", default)]
    pub users: Vec<UserRecord>,
}

/// Cached configuration aggregate.
///
/// Only the user list is interpreted here. Every other top-level field is
/// kept in `extra` so a load/save cycle never drops settings owned by other
/// parts of the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AdminConfig {
    #[serde(rename = "UserConfig", default)]
    pub user_config: UserConfig,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AdminConfig {
    /// Users known to the configuration, in insertion order.
    pub fn users(&self) -> &[UserRecord] {
        &self.user_config.users
    }

    /// Look up a user by exact (case-sensitive) username.
    pub fn find_user(&self, username: &str) -> Option<&UserRecord> {
        self.user_config.users.iter().find(|u| u.username == username)
    }

    /// Append a user record.
    ///
    /// Uniqueness is the caller's responsibility.
    pub fn push_user(&mut self, record: UserRecord) {
        self.user_config.users.push(record);
    }
}

/// A durable credential held by a user store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub username: String,
    /// Argon2id hash in PHC string format (salt included)
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    /// Create a new account, hashing the password with a random salt.
    pub fn new(username: impl Into<String>, password: &str) -> Result<Self, StoreError> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| StoreError::PasswordHash(e.to_string()))?;

        Ok(Self {
            username: username.into(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        })
    }

    /// Check a candidate password against the stored hash.
    pub fn verify_password(&self, password: &str) -> bool {
        match PasswordHash::new(&self.password_hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
