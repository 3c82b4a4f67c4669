//! Provider configuration structs.
//!
//! A [`ProviderConfig`] is a tagged union serialized as
//! `{"type": "openai", "config": {...}}`. Every variant flattens a
//! [`CommonConfig`] and adds its own sampling/auth parameters. Unknown
//! fields in the `config` object are ignored.

use std::collections::BTreeMap;

use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use url::Url;

use super::registry;
use super::types::{AuthType, ProviderType};

// =============================================================================
// Common Fields
// =============================================================================

/// Fields shared by every provider variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommonConfig {
    /// Display name shown in the console.
    #[serde(default)]
    pub name: String,
    /// Secret key. Optional for Ollama and custom endpoints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Overrides the provider's default base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Model identifier. The registry's model list is advisory only.
    #[serde(default)]
    pub model: String,
    /// Sampling temperature (0.0 - 2.0).
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Maximum output tokens (1 - 100000).
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

impl Default for CommonConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            api_key: None,
            base_url: None,
            model: String::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// =============================================================================
// Variants
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenAiConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnthropicConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MistralConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_prompt: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OllamaConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// How long the model stays loaded, e.g. "5m".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_ctx: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_last_n: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_penalty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tfs_z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomConfig {
    #[serde(flatten)]
    pub common: CommonConfig,
    /// Extra headers sent with every request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_type: Option<AuthType>,
    /// Header name used when `auth_type` is `custom`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_auth_header: Option<String>,
}

/// Configuration for one provider instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "config", rename_all = "lowercase")]
pub enum ProviderConfig {
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    Mistral(MistralConfig),
    Ollama(OllamaConfig),
    Custom(CustomConfig),
}

impl ProviderConfig {
    /// Build a config of the given type with schema defaults for the
    /// variant-specific fields.
    pub fn new(provider_type: ProviderType, common: CommonConfig) -> Self {
        match provider_type {
            ProviderType::OpenAi => Self::OpenAi(OpenAiConfig {
                common,
                ..Default::default()
            }),
            ProviderType::Anthropic => Self::Anthropic(AnthropicConfig {
                common,
                ..Default::default()
            }),
            ProviderType::Mistral => Self::Mistral(MistralConfig {
                common,
                ..Default::default()
            }),
            ProviderType::Ollama => Self::Ollama(OllamaConfig {
                common,
                keep_alive: Some(registry::DEFAULT_OLLAMA_KEEP_ALIVE.to_string()),
                ..Default::default()
            }),
            ProviderType::Custom => Self::Custom(CustomConfig {
                common,
                auth_type: Some(AuthType::default()),
                ..Default::default()
            }),
        }
    }

    /// The provider type named by the `type` tag.
    pub fn provider_type(&self) -> ProviderType {
        match self {
            Self::OpenAi(_) => ProviderType::OpenAi,
            Self::Anthropic(_) => ProviderType::Anthropic,
            Self::Mistral(_) => ProviderType::Mistral,
            Self::Ollama(_) => ProviderType::Ollama,
            Self::Custom(_) => ProviderType::Custom,
        }
    }

    /// Fields shared by every provider type.
    ///
    /// The variant-specific fields stay reachable through the enum itself.
    pub fn common(&self) -> &CommonConfig {
        match self {
            Self::OpenAi(c) => &c.common,
            Self::Anthropic(c) => &c.common,
            Self::Mistral(c) => &c.common,
            Self::Ollama(c) => &c.common,
            Self::Custom(c) => &c.common,
        }
    }

    /// Mutable access to the shared fields, used when a stored secret key
    /// is restored into an incoming config.
    pub fn common_mut(&mut self) -> &mut CommonConfig {
        match self {
            Self::OpenAi(c) => &mut c.common,
            Self::Anthropic(c) => &mut c.common,
            Self::Mistral(c) => &mut c.common,
            Self::Ollama(c) => &mut c.common,
            Self::Custom(c) => &mut c.common,
        }
    }

    /// The secret key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        non_blank(self.common().api_key.as_deref())
    }

    /// The base URL to probe: the configured one, or the registry default.
    ///
    /// Custom providers have no default.
    pub fn effective_base_url(&self) -> Option<String> {
        non_blank(self.common().base_url.as_deref())
            .or_else(|| registry::default_base_url(self.provider_type()))
            .map(|url| url.trim().trim_end_matches('/').to_string())
    }

    /// Copy of this config with the secret key masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        let common = copy.common_mut();
        common.api_key = common.api_key.as_deref().map(mask_secret);
        copy
    }

    /// Check field constraints. Every violation is reported.
    ///
    /// The model only has to be non-empty; it is not checked against the
    /// registry's model list.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        let common = self.common();

        if common.name.trim().is_empty() {
            errors.push("name", "Name is required");
        }
        if common.model.trim().is_empty() {
            errors.push("model", "Model is required");
        }
        if let Some(base_url) = non_blank(common.base_url.as_deref()) {
            if Url::parse(base_url.trim()).is_err() {
                errors.push("baseUrl", "Invalid URL format");
            }
        }
        errors.check_range("temperature", Some(common.temperature), 0.0, 2.0);
        if !(1..=100_000).contains(&common.max_tokens) {
            errors.push("maxTokens", "maxTokens must be between 1 and 100000");
        }

        match self {
            Self::OpenAi(c) => {
                errors.check_range("topP", c.top_p, 0.0, 1.0);
                errors.check_range("frequencyPenalty", c.frequency_penalty, -2.0, 2.0);
                errors.check_range("presencePenalty", c.presence_penalty, -2.0, 2.0);
            }
            Self::Anthropic(c) => {
                errors.check_min("topK", c.top_k, 0);
                errors.check_range("topP", c.top_p, 0.0, 1.0);
            }
            Self::Mistral(c) => {
                errors.check_range("topP", c.top_p, 0.0, 1.0);
            }
            Self::Ollama(c) => {
                errors.check_min("numCtx", c.num_ctx, 1);
                errors.check_min("repeatLastN", c.repeat_last_n, 0);
                if c.repeat_penalty.is_some_and(|p| p < 0.0) {
                    errors.push("repeatPenalty", "repeatPenalty must be at least 0");
                }
                errors.check_range("tfsZ", c.tfs_z, 0.0, 1.0);
                errors.check_min("topK", c.top_k, 0);
                errors.check_range("topP", c.top_p, 0.0, 1.0);
            }
            Self::Custom(c) => {
                for name in c.headers.iter().flat_map(|h| h.keys()) {
                    if HeaderName::from_bytes(name.as_bytes()).is_err() {
                        errors.push("headers", format!("Invalid header name: {name}"));
                    }
                }
                if c.auth_type == Some(AuthType::Custom) {
                    match non_blank(c.custom_auth_header.as_deref()) {
                        None => errors.push(
                            "customAuthHeader",
                            "Custom auth header is required for custom auth",
                        ),
                        Some(name) if HeaderName::from_bytes(name.as_bytes()).is_err() => {
                            errors.push("customAuthHeader", format!("Invalid header name: {name}"))
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        errors.into_result()
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Mask a secret for display: `sk-...ab`.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{head}...{tail}")
}

// =============================================================================
// Validation Errors
// =============================================================================

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All field-level failures for one config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationErrors {
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    fn check_range(&mut self, field: &'static str, value: Option<f64>, min: f64, max: f64) {
        if let Some(v) = value {
            if !(min..=max).contains(&v) {
                self.push(field, format!("{field} must be between {min} and {max}"));
            }
        }
    }

    fn check_min(&mut self, field: &'static str, value: Option<i64>, min: i64) {
        if value.is_some_and(|v| v < min) {
            self.push(field, format!("{field} must be at least {min}"));
        }
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Whether a given field failed.
    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<&str> = self.errors.iter().map(|e| e.message.as_str()).collect();
        write!(f, "{}", messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    fn common(name: &str, model: &str) -> CommonConfig {
        CommonConfig {
            name: name.to_string(),
            model: model.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_common_defaults() {
        let config = CommonConfig::default();
        assert!((config.temperature - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.max_tokens, 2048);
    }

    #[test]
    fn test_tagged_json_shape() {
        let json = r#"{
            "type": "openai",
            "config": {
                "name": "P1",
                "apiKey": "sk-test",
                "baseUrl": "https://api.openai.com/v1",
                "model": "gpt-4o",
                "temperature": 0.7,
                "maxTokens": 2048,
                "topP": 0.9
            }
        }"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.provider_type(), ProviderType::OpenAi);
        assert_eq!(config.api_key(), Some("sk-test"));
        match &config {
            ProviderConfig::OpenAi(c) => assert_eq!(c.top_p, Some(0.9)),
            other => panic!("unexpected variant: {other:?}"),
        }

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["type"], "openai");
        assert_eq!(value["config"]["maxTokens"], 2048);
        assert!(value["config"].get("organization").is_none());
    }

    #[test]
    fn test_fields_outside_variant_are_ignored() {
        let json = r#"{"type": "mistral", "config": {"name": "M", "model": "mistral-small-latest", "systemPrompt": "ignored", "keepAlive": "1m"}}"#;
        let config: ProviderConfig = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        let value = serde_json::to_value(&config).unwrap();
        assert!(value["config"].get("systemPrompt").is_none());
        assert!(value["config"].get("keepAlive").is_none());
    }

    #[test]
    fn test_model_outside_registry_is_accepted() {
        for provider_type in ProviderType::all() {
            let config = ProviderConfig::new(*provider_type, common("X", "not-a-listed-model"));
            assert!(
                config.validate().is_ok(),
                "{provider_type} rejected an unlisted model"
            );
        }
    }

    #[test]
    fn test_validate_reports_every_field() {
        let mut base = common("", "");
        base.base_url = Some("not a url".to_string());
        base.temperature = 2.5;
        base.max_tokens = 0;
        let config = ProviderConfig::OpenAi(OpenAiConfig {
            common: base,
            top_p: Some(1.5),
            frequency_penalty: Some(-3.0),
            ..Default::default()
        });

        let errors = config.validate().unwrap_err();
        for field in [
            "name",
            "model",
            "baseUrl",
            "temperature",
            "maxTokens",
            "topP",
            "frequencyPenalty",
        ] {
            assert!(errors.has(field), "missing error for {field}");
        }
        assert!(!errors.has("presencePenalty"));
        assert!(errors.to_string().contains("Name is required"));
    }

    #[test]
    fn test_blank_base_url_counts_as_absent() {
        let mut base = common("O", "llama3.2");
        base.base_url = Some("  ".to_string());
        let config = ProviderConfig::new(ProviderType::Ollama, base);
        assert!(config.validate().is_ok());
        assert_eq!(
            config.effective_base_url().as_deref(),
            Some("http://localhost:11434")
        );
    }

    #[test]
    fn test_ollama_ranges() {
        let config = ProviderConfig::Ollama(OllamaConfig {
            common: common("O", "llama3.2"),
            num_ctx: Some(0),
            repeat_penalty: Some(-0.1),
            tfs_z: Some(1.1),
            ..Default::default()
        });
        let errors = config.validate().unwrap_err();
        assert!(errors.has("numCtx"));
        assert!(errors.has("repeatPenalty"));
        assert!(errors.has("tfsZ"));
    }

    #[test]
    fn test_custom_auth_header_required_for_custom_auth() {
        let config = ProviderConfig::Custom(CustomConfig {
            common: common("C", "m"),
            auth_type: Some(AuthType::Custom),
            ..Default::default()
        });
        assert!(config.validate().unwrap_err().has("customAuthHeader"));

        let config = ProviderConfig::Custom(CustomConfig {
            common: common("C", "m"),
            auth_type: Some(AuthType::Custom),
            custom_auth_header: Some("X-Token".to_string()),
            headers: Some(BTreeMap::from([("bad header".to_string(), "v".to_string())])),
        });
        let errors = config.validate().unwrap_err();
        assert!(!errors.has("customAuthHeader"));
        assert!(errors.has("headers"));
    }

    #[test]
    fn test_new_applies_schema_defaults() {
        match ProviderConfig::new(ProviderType::Ollama, common("O", "phi3")) {
            ProviderConfig::Ollama(c) => assert_eq!(c.keep_alive.as_deref(), Some("5m")),
            other => panic!("unexpected variant: {other:?}"),
        }
        match ProviderConfig::new(ProviderType::Custom, common("C", "m")) {
            ProviderConfig::Custom(c) => assert_eq!(c.auth_type, Some(AuthType::Bearer)),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn test_effective_base_url_trims_trailing_slash() {
        let mut base = common("A", "gpt-4o");
        base.base_url = Some("https://proxy.example.com/v1/".to_string());
        let config = ProviderConfig::new(ProviderType::OpenAi, base);
        assert_eq!(
            config.effective_base_url().as_deref(),
            Some("https://proxy.example.com/v1")
        );

        let config = ProviderConfig::new(ProviderType::Custom, common("C", "m"));
        assert!(config.effective_base_url().is_none());
    }

    #[test]
    fn test_redacted_masks_key() {
        let mut base = common("A", "gpt-4o");
        base.api_key = Some("sk-proj-1234567890ab".to_string());
        let config = ProviderConfig::new(ProviderType::OpenAi, base);
        assert_eq!(config.redacted().api_key(), Some("sk-...ab"));
        assert_eq!(config.api_key(), Some("sk-proj-1234567890ab"));
        assert_eq!(mask_secret("short"), "****");
    }
}
