//! HTTP request handlers.

use super::types::{HealthResponse, RegisterResponse};
use super::AppState;
use crate::error::RegisterError;
use axum::{
    body::Bytes,
    extract::State,
    http::header,
    response::IntoResponse,
    Json,
};

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let settings = state.registrar.settings();

    Json(HealthResponse {
        status: "ok".to_string(),
        storage_mode: settings.storage_mode.to_string(),
        registration_enabled: settings.registration_enabled,
    })
}

/// Register a new user.
///
/// The body is taken raw so that malformed JSON goes through the same
/// failure path as store errors.
pub async fn register(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, RegisterError> {
    state.registrar.handle(&body).await?;

    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(RegisterResponse { ok: true }),
    ))
}
