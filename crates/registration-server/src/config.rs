//! Configuration for the registration server.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Storage mode selection
    #[serde(default)]
    pub storage: StorageConfig,

    /// Registration feature switches
    #[serde(default)]
    pub registration: RegistrationConfig,

    /// Site owner account
    #[serde(default)]
    pub owner: OwnerConfig,

    /// Where the account store keeps its files
    #[serde(default)]
    pub data: DataConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

/// Where user data lives.
///
/// `localstorage` keeps everything client side, so there is nowhere on the
/// server to create an account. Any other non-empty value names a
/// server-backed store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum StorageMode {
    #[default]
    LocalStorage,
    Server(String),
}

impl StorageMode {
    pub fn is_server_backed(&self) -> bool {
        matches!(self, StorageMode::Server(_))
    }
}

impl From<String> for StorageMode {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "localstorage" {
            StorageMode::LocalStorage
        } else {
            StorageMode::Server(value)
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::LocalStorage => f.write_str("localstorage"),
            StorageMode::Server(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Storage mode (`localstorage`, `redis`, `upstash`, ...)
    #[serde(default)]
    pub mode: StorageMode,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationConfig {
    /// Raw feature flag. Only the exact string "true" enables registration.
    pub enabled: Option<String>,

    /// Apply registrations one at a time (closes the duplicate race)
    #[serde(default)]
    pub serialize: bool,
}

impl RegistrationConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.as_deref() == Some("true")
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OwnerConfig {
    /// Username reserved for the site owner
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Directory holding the admin config and credential files
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,

    /// Enable persistence (if false, stores are in-memory only)
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
            persist: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            port: default_port(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("/data")
}

fn default_true() -> bool {
    true
}

fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".into()
}

/// Process-wide values the registration pipeline reads on every request.
#[derive(Debug, Clone, Default)]
pub struct RegistrationSettings {
    pub storage_mode: StorageMode,
    pub registration_enabled: bool,
    pub owner_username: Option<String>,
    pub serialize: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Settings consumed by the registration pipeline.
    pub fn registration_settings(&self) -> RegistrationSettings {
        RegistrationSettings {
            storage_mode: self.storage.mode.clone(),
            registration_enabled: self.registration.is_enabled(),
            owner_username: self.owner.username.clone(),
            serialize: self.registration.serialize,
        }
    }
}
