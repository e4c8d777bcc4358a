//! API request and response types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Self-registration request body.
///
/// Absent or `null` fields read as empty and are rejected during
/// validation rather than parsing.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Successful registration.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub ok: bool,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub storage_mode: String,
    pub registration_enabled: bool,
}
