//! Setup-wizard credential checks: a flat `{provider, apiKey, endpoint, model}`
//! request mapped onto a provider probe.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::providers::registry::allowed_models;
use crate::providers::{CommonConfig, ProviderConfig, ProviderConfigError, ProviderType};

use super::CredentialValidator;

/// Body of the validate-credentials and save-config endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialsRequest {
    pub provider: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// `{valid, message}` answer of the validate-credentials endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsValidation {
    pub valid: bool,
    pub message: String,
}

impl CredentialsValidation {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: message.into(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl CredentialsRequest {
    pub fn provider_type(&self) -> Result<ProviderType, ProviderConfigError> {
        self.provider.parse()
    }

    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    pub fn endpoint(&self) -> Option<&str> {
        non_blank(self.endpoint.as_deref())
    }

    pub fn model(&self) -> Option<&str> {
        non_blank(self.model.as_deref())
    }

    /// Build a probe-ready config. A missing model falls back to the first
    /// registry model for the type.
    pub fn to_provider_config(&self) -> Result<ProviderConfig, ProviderConfigError> {
        let provider_type = self.provider_type()?;
        let model = self
            .model()
            .or_else(|| allowed_models(provider_type).first().copied())
            .unwrap_or_default();

        Ok(ProviderConfig::new(
            provider_type,
            CommonConfig {
                name: provider_type.label().to_string(),
                api_key: self.api_key().map(str::to_string),
                base_url: self.endpoint().map(str::to_string),
                model: model.to_string(),
                ..Default::default()
            },
        ))
    }
}

impl CredentialValidator {
    /// Probe the provider named in a wizard request.
    pub async fn validate_credentials(&self, request: &CredentialsRequest) -> CredentialsValidation {
        let config = match request.to_provider_config() {
            Ok(config) => config,
            Err(e) => {
                debug!(error = %e, "Rejecting credentials for unknown provider");
                return CredentialsValidation::invalid("Unknown provider");
            }
        };

        let provider_type = config.provider_type();
        if provider_type.requires_api_key() && request.api_key().is_none() {
            return CredentialsValidation::invalid("API key is required");
        }

        let result = self.test(&config).await;
        let label = provider_type.label();

        let message = match (result.success, provider_type) {
            (true, ProviderType::Ollama) => "Ollama connection validated successfully".to_string(),
            (true, _) => format!("{label} credentials validated successfully"),
            (false, _) => format!("{label} validation failed: {}", result.message),
        };

        CredentialsValidation {
            valid: result.success,
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(provider: &str, api_key: Option<&str>, endpoint: Option<String>) -> CredentialsRequest {
        CredentialsRequest {
            provider: provider.to_string(),
            api_key: api_key.map(str::to_string),
            endpoint,
            model: None,
        }
    }

    #[test]
    fn test_request_deserializes_camel_case() {
        let request: CredentialsRequest = serde_json::from_value(json!({
            "provider": "openai",
            "apiKey": "sk-1",
            "endpoint": "https://api.openai.com/v1"
        }))
        .unwrap();
        assert_eq!(request.api_key(), Some("sk-1"));
        assert!(request.model().is_none());
    }

    #[test]
    fn test_to_provider_config_defaults_model() {
        let config = request("anthropic", Some("k"), None).to_provider_config().unwrap();
        assert_eq!(config.provider_type(), ProviderType::Anthropic);
        assert_eq!(
            config.common().model,
            allowed_models(ProviderType::Anthropic)[0]
        );
        assert_eq!(config.common().name, "Anthropic");
    }

    #[test]
    fn test_to_provider_config_rejects_unknown() {
        assert_eq!(
            request("cohere", None, None).to_provider_config(),
            Err(ProviderConfigError::UnknownProvider("cohere".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let result = CredentialValidator::new()
            .validate_credentials(&request("cohere", Some("k"), None))
            .await;
        assert_eq!(result, CredentialsValidation::invalid("Unknown provider"));
    }

    #[tokio::test]
    async fn test_missing_key() {
        let result = CredentialValidator::new()
            .validate_credentials(&request("mistral", Some(""), None))
            .await;
        assert_eq!(result, CredentialsValidation::invalid("API key is required"));
    }

    #[tokio::test]
    async fn test_openai_success_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", "Bearer sk-live"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = CredentialValidator::new()
            .validate_credentials(&request(
                "openai",
                Some("sk-live"),
                Some(format!("{}/v1", server.uri())),
            ))
            .await;
        assert!(result.valid);
        assert_eq!(result.message, "OpenAI credentials validated successfully");
    }

    #[tokio::test]
    async fn test_failure_message_carries_detail() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/models"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let result = CredentialValidator::new()
            .validate_credentials(&request("mistral", Some("mk"), Some(server.uri())))
            .await;
        assert!(!result.valid);
        assert_eq!(
            result.message,
            "Mistral validation failed: Mistral API error: 401 bad key"
        );
    }

    #[tokio::test]
    async fn test_ollama_success_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let result = CredentialValidator::new()
            .validate_credentials(&request("ollama", None, Some(server.uri())))
            .await;
        assert!(result.valid);
        assert_eq!(result.message, "Ollama connection validated successfully");
    }
}
