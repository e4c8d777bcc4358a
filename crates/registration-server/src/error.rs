//! Error types for the registration server.

use account_store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Registration failures.
///
/// Every variant except `Internal` is an expected outcome with a stable
/// message. `Internal` carries the underlying failure message.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error("registration is not supported in localstorage mode")]
    StorageModeUnsupported,

    #[error("user registration is disabled")]
    RegistrationDisabled,

    #[error("username and password are required")]
    MissingCredentials,

    #[error("this username is reserved for the site owner")]
    ReservedUsername,

    #[error("user already exists")]
    UserExists,

    #[error("server error: {0}")]
    Internal(String),
}

/// Broad class of a registration failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Forbidden,
    Conflict,
    Internal,
}

impl RegisterError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegisterError::StorageModeUnsupported
            | RegisterError::MissingCredentials
            | RegisterError::ReservedUsername => ErrorKind::Validation,
            RegisterError::RegistrationDisabled => ErrorKind::Forbidden,
            RegisterError::UserExists => ErrorKind::Conflict,
            RegisterError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Conflict => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for RegisterError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            RegisterError::Internal(details) => ErrorResponse {
                error: "server error".to_string(),
                details: Some(details),
            },
            other => ErrorResponse {
                error: other.to_string(),
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        RegisterError::Internal(e.to_string())
    }
}

impl From<serde_json::Error> for RegisterError {
    fn from(e: serde_json::Error) -> Self {
        RegisterError::Internal(format!("invalid request body: {}", e))
    }
}
