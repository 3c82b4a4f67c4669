//! Branding endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::header,
    response::IntoResponse,
    Json,
};

use modeldesk_core::{BrandingConfig, BrandingPatch};

use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/branding
pub async fn get_branding(State(state): State<Arc<AppState>>) -> Json<BrandingConfig> {
    Json(state.branding.snapshot().as_ref().clone())
}

/// PUT /api/branding
///
/// Merges the patch into a new snapshot and persists it. The snapshot is
/// only served once it is stored.
pub async fn update_branding(
    State(state): State<Arc<AppState>>,
    body: Result<Json<BrandingPatch>, JsonRejection>,
) -> Result<Json<BrandingConfig>, ApiError> {
    let Json(patch) = body?;
    let next = state.with_db(|db| state.branding.apply(db, &patch))?;
    tracing::info!(name = %next.name, "Branding saved");
    Ok(Json(next.as_ref().clone()))
}

/// DELETE /api/branding
pub async fn reset_branding(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BrandingConfig>, ApiError> {
    let next = state.with_db(|db| state.branding.reset(db))?;
    tracing::info!("Branding reset to defaults");
    Ok(Json(next.as_ref().clone()))
}

/// GET /api/branding/preview.css
pub async fn preview_css(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        state.branding.snapshot().css_root_block(),
    )
}
