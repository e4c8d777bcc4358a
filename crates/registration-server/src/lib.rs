//! Registration Server - user self-registration endpoint.
//!
//! Accepts a username/password pair, checks it against the deployment's
//! storage mode, the registration feature flag, the reserved owner name and
//! the existing user list, then creates the credential and mirrors the new
//! user into the cached admin configuration.

pub mod api;
pub mod config;
pub mod error;
pub mod registrar;

pub use config::{Config, RegistrationSettings, StorageMode};
pub use error::{ErrorKind, RegisterError};
pub use registrar::Registrar;
