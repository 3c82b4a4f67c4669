//! HTTP API.
//!
//! This module provides:
//! - `providers` - schemas, probes and the provider settings store
//! - `wizard` - setup-wizard credential checks and env file saves
//! - `branding` - branding snapshot, updates and CSS preview
//! - `health` - liveness

mod branding;
mod health;
mod providers;
mod wizard;

use std::sync::Arc;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/providers/schema", get(providers::list_schemas))
        .route("/api/providers/test", post(providers::test_provider))
        .route(
            "/api/providers",
            get(providers::list_providers)
                .post(providers::create_provider)
                .delete(providers::clear_providers),
        )
        .route("/api/providers/default", put(providers::set_default_provider))
        .route("/api/providers/{id}", put(providers::replace_provider))
        .route("/api/validate-credentials", post(wizard::validate_credentials))
        .route("/api/save-config", post(wizard::save_config))
        .route(
            "/api/branding",
            get(branding::get_branding)
                .put(branding::update_branding)
                .delete(branding::reset_branding),
        )
        .route("/api/branding/preview.css", get(branding::preview_css))
        .with_state(state)
}
