//! HTTP error mapping.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use modeldesk_core::{ProviderConfigError, StoreError, ValidationErrors};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
    #[error("{0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Validation(errors) = &self {
            let body = Json(json!({
                "error": "validation_failed",
                "message": errors.to_string(),
                "fields": errors.errors,
            }));
            return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
        }

        let (status, kind) = match &self {
            ApiError::Store(StoreError::Provider(ProviderConfigError::ProviderNotFound(_))) => {
                (StatusCode::NOT_FOUND, "not_found")
            }
            ApiError::Store(StoreError::Provider(ProviderConfigError::UnknownProvider(_))) => {
                (StatusCode::BAD_REQUEST, "unknown_provider")
            }
            ApiError::Store(StoreError::Corrupt(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "corrupt_settings")
            }
            ApiError::Store(StoreError::Cipher { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "secret_unreadable")
            }
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
            ApiError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_failed"),
            ApiError::Body(rejection) => (rejection.status(), "invalid_request"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": kind,
            "message": self.to_string(),
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let err = ApiError::Store(StoreError::Provider(ProviderConfigError::ProviderNotFound(
            "openai-1".to_string(),
        )));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_corrupt_maps_to_500() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{{").unwrap_err();
        let err = ApiError::Store(StoreError::Corrupt(parse_err));
        assert_eq!(
            err.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_maps_to_422() {
        let err = ApiError::Validation(ValidationErrors::default());
        assert_eq!(
            err.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
