//! Provider schema, probe and settings endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use modeldesk_core::{
    all_schemas, mask_secret, ProviderConfig, ProviderSchema, ProviderSettings,
    TestConnectionResult,
};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CreatedProvider {
    pub id: String,
    pub result: TestConnectionResult,
}

#[derive(Debug, Serialize)]
pub struct ProbeRejected {
    pub result: TestConnectionResult,
}

#[derive(Debug, Deserialize)]
pub struct DefaultProviderRequest {
    pub id: String,
}

/// GET /api/providers/schema
pub async fn list_schemas() -> Json<Vec<ProviderSchema>> {
    Json(all_schemas())
}

/// POST /api/providers/test
pub async fn test_provider(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProviderConfig>, JsonRejection>,
) -> Result<Json<TestConnectionResult>, ApiError> {
    let Json(config) = body?;
    Ok(Json(state.validator.test(&config).await))
}

/// GET /api/providers
///
/// Secret keys are masked.
pub async fn list_providers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ProviderSettings>, ApiError> {
    let settings = state.with_store(|store| store.load_or_default())?;
    Ok(Json(settings.redacted()))
}

/// POST /api/providers
///
/// Validate, probe, then save. A failed probe saves nothing.
pub async fn create_provider(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProviderConfig>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(config) = body?;
    config.validate()?;

    let result = state.validator.test(&config).await;
    if !result.success {
        return Ok((StatusCode::BAD_REQUEST, Json(ProbeRejected { result })).into_response());
    }

    let provider_type = config.provider_type();
    let id = state.with_store(|store| store.add_provider(config))?;
    tracing::info!(id = %id, provider = %provider_type, "Provider saved");

    Ok((StatusCode::CREATED, Json(CreatedProvider { id, result })).into_response())
}

/// PUT /api/providers/{id}
///
/// A secret key sent back in its masked form keeps the stored key.
pub async fn replace_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ProviderConfig>, JsonRejection>,
) -> Result<Json<ProviderConfig>, ApiError> {
    let Json(mut config) = body?;
    config.validate()?;

    state.with_store(|store| {
        let mut settings = store.load_or_default()?;
        let stored_key = settings
            .get(&id)
            .and_then(|existing| existing.common().api_key.clone());

        let incoming_key = config.common().api_key.clone();
        if let (Some(stored), Some(incoming)) = (stored_key, incoming_key) {
            if incoming == mask_secret(&stored) {
                config.common_mut().api_key = Some(stored);
            }
        }

        settings.replace(&id, config.clone())?;
        store.save(&settings)
    })?;

    tracing::info!(id = %id, "Provider replaced");
    Ok(Json(config.redacted()))
}

/// PUT /api/providers/default
pub async fn set_default_provider(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DefaultProviderRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(request) = body?;
    state.with_store(|store| store.set_default_provider(&request.id))?;
    tracing::info!(id = %request.id, "Default provider selected");
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/providers
pub async fn clear_providers(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    state.with_store(|store| store.clear())?;
    tracing::info!("Provider settings cleared");
    Ok(StatusCode::NO_CONTENT)
}
