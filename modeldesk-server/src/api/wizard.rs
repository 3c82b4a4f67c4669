//! Setup-wizard endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use modeldesk_core::{CredentialsRequest, CredentialsValidation};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SaveConfigResponse {
    pub success: bool,
    pub message: String,
}

impl SaveConfigResponse {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// POST /api/validate-credentials
pub async fn validate_credentials(
    State(state): State<Arc<AppState>>,
    request: Result<Json<CredentialsRequest>, JsonRejection>,
) -> (StatusCode, Json<CredentialsValidation>) {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            tracing::error!(error = %rejection, "Credential validation request rejected");
            let body = CredentialsValidation {
                valid: false,
                message: "Validation service error".to_string(),
            };
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body));
        }
    };

    let result = state.validator.validate_credentials(&request).await;
    tracing::info!(provider = %request.provider, valid = result.valid, "Credentials checked");
    (StatusCode::OK, Json(result))
}

/// POST /api/save-config
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    request: Result<Json<CredentialsRequest>, JsonRejection>,
) -> (StatusCode, Json<SaveConfigResponse>) {
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SaveConfigResponse::failed(rejection.body_text())),
            );
        }
    };

    match state.save_env_config(&request) {
        Ok(()) => (
            StatusCode::OK,
            Json(SaveConfigResponse {
                success: true,
                message: "Configuration saved successfully".to_string(),
            }),
        ),
        Err(e) if e.is_input_error() => {
            (StatusCode::BAD_REQUEST, Json(SaveConfigResponse::failed(e.to_string())))
        }
        Err(e) => {
            tracing::error!(error = %e, path = %state.env_file.display(), "Failed to save configuration");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveConfigResponse::failed("Failed to save configuration")),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::test_support::spawn;

    #[tokio::test]
    async fn test_validate_credentials_success() {
        let upstream = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "sk-ant-1"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&upstream)
            .await;

        let server = spawn().await;
        let resp = server
            .client
            .post(server.url("/api/validate-credentials"))
            .json(&json!({
                "provider": "anthropic",
                "apiKey": "sk-ant-1",
                "endpoint": format!("{}/v1", upstream.uri())
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["valid"], true);
        assert_eq!(body["message"], "Anthropic credentials validated successfully");
    }

    #[tokio::test]
    async fn test_validate_credentials_unknown_provider() {
        let server = spawn().await;
        let body: Value = server
            .client
            .post(server.url("/api/validate-credentials"))
            .json(&json!({"provider": "cohere", "apiKey": "k"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body, json!({"valid": false, "message": "Unknown provider"}));
    }

    #[tokio::test]
    async fn test_validate_credentials_malformed_body() {
        let server = spawn().await;
        let resp = server
            .client
            .post(server.url("/api/validate-credentials"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body,
            json!({"valid": false, "message": "Validation service error"})
        );
    }

    #[tokio::test]
    async fn test_save_config_merges_env_file() {
        let server = spawn().await;
        std::fs::write(server.env_file(), "FOO=bar\n").unwrap();

        let resp = server
            .client
            .post(server.url("/api/save-config"))
            .json(&json!({
                "provider": "mistral",
                "apiKey": "mk-1",
                "model": "mistral-large-latest"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], true);

        let content = std::fs::read_to_string(server.env_file()).unwrap();
        assert_eq!(
            content,
            "FOO=bar\nMISTRAL_API_KEY=mk-1\nMISTRAL_MODEL=mistral-large-latest\nACTIVE_AI_PROVIDER=mistral\n"
        );
    }

    #[tokio::test]
    async fn test_save_config_rejects_injection() {
        let server = spawn().await;
        let resp = server
            .client
            .post(server.url("/api/save-config"))
            .json(&json!({"provider": "openai", "apiKey": "sk\nACTIVE_AI_PROVIDER=x"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(!server.env_file().exists());
    }

    #[tokio::test]
    async fn test_save_config_write_failure_is_500() {
        let server = spawn().await;
        // a directory at the env file path can be neither read nor replaced
        std::fs::create_dir_all(server.env_file()).unwrap();
        std::fs::write(server.env_file().join("keep"), "x").unwrap();

        let resp = server
            .client
            .post(server.url("/api/save-config"))
            .json(&json!({"provider": "ollama", "endpoint": "http://localhost:11434"}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 500);

        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["message"], "Failed to save configuration");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_saves_keep_every_provider() {
        let server = spawn().await;
        let providers = ["openai", "anthropic", "mistral", "ollama"];

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let provider = providers[i % providers.len()];
                let client = server.client.clone();
                let url = server.url("/api/save-config");
                tokio::spawn(async move {
                    client
                        .post(url)
                        .json(&json!({"provider": provider, "model": format!("model-{i}")}))
                        .send()
                        .await
                        .unwrap()
                        .status()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 200);
        }

        let content = std::fs::read_to_string(server.env_file()).unwrap();
        for provider in providers {
            let key = format!("{}_MODEL=", provider.to_ascii_uppercase());
            assert!(content.contains(&key), "missing {key} in {content}");
        }
    }
}
