//! Static provider schema registry.
//!
//! Model lists only populate selection UIs. Submitted configs are never
//! checked against them.

use serde::Serialize;

use super::types::{AuthType, ProviderType};

/// Default keep-alive for new Ollama configs.
pub const DEFAULT_OLLAMA_KEEP_ALIVE: &str = "5m";

/// Default model used by the Anthropic probe when the config has none.
pub const ANTHROPIC_FALLBACK_MODEL: &str = "claude-3-haiku-20240307";

const OPENAI_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4o-mini",
    "gpt-4-turbo",
    "gpt-4",
    "gpt-3.5-turbo",
    "gpt-3.5-turbo-16k",
];

const ANTHROPIC_MODELS: &[&str] = &[
    "claude-3-5-sonnet-20241022",
    "claude-3-5-haiku-20241022",
    "claude-3-opus-20240229",
    "claude-3-sonnet-20240229",
    "claude-3-haiku-20240307",
];

const MISTRAL_MODELS: &[&str] = &[
    "mistral-large-latest",
    "mistral-small-latest",
    "codestral-latest",
    "mistral-embed",
];

const OLLAMA_MODELS: &[&str] = &["llama3.2", "llama3.1", "phi3", "gemma2", "codegemma", "qwen2.5"];

const COMMON_FIELDS: &[&str] = &["name", "apiKey", "baseUrl", "model", "temperature", "maxTokens"];

/// Ordered allowed model identifiers for a provider type.
pub fn allowed_models(provider_type: ProviderType) -> &'static [&'static str] {
    match provider_type {
        ProviderType::OpenAi => OPENAI_MODELS,
        ProviderType::Anthropic => ANTHROPIC_MODELS,
        ProviderType::Mistral => MISTRAL_MODELS,
        ProviderType::Ollama => OLLAMA_MODELS,
        ProviderType::Custom => &[],
    }
}

/// Default base URL, if the provider type has one.
pub fn default_base_url(provider_type: ProviderType) -> Option<&'static str> {
    match provider_type {
        ProviderType::OpenAi => Some("https://api.openai.com/v1"),
        ProviderType::Anthropic => Some("https://api.anthropic.com"),
        ProviderType::Mistral => Some("https://api.mistral.ai/v1"),
        ProviderType::Ollama => Some("http://localhost:11434"),
        ProviderType::Custom => None,
    }
}

/// Variant-specific field names, in form order.
pub fn variant_fields(provider_type: ProviderType) -> &'static [&'static str] {
    match provider_type {
        ProviderType::OpenAi => &["organization", "topP", "frequencyPenalty", "presencePenalty"],
        ProviderType::Anthropic => &["topK", "topP", "systemPrompt"],
        ProviderType::Mistral => &["topP", "randomSeed", "safePrompt"],
        ProviderType::Ollama => &[
            "keepAlive",
            "numCtx",
            "repeatLastN",
            "repeatPenalty",
            "seed",
            "stop",
            "tfsZ",
            "topK",
            "topP",
        ],
        ProviderType::Custom => &["headers", "authType", "customAuthHeader"],
    }
}

/// Serializable description of one provider type's form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSchema {
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    pub label: &'static str,
    pub default_base_url: Option<&'static str>,
    pub requires_api_key: bool,
    pub models: &'static [&'static str],
    pub fields: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_keep_alive: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_auth_type: Option<AuthType>,
}

/// Schema for a single provider type.
pub fn schema(provider_type: ProviderType) -> ProviderSchema {
    let fields = COMMON_FIELDS
        .iter()
        .chain(variant_fields(provider_type))
        .copied()
        .collect();

    ProviderSchema {
        provider_type,
        label: provider_type.label(),
        default_base_url: default_base_url(provider_type),
        requires_api_key: provider_type.requires_api_key(),
        models: allowed_models(provider_type),
        fields,
        default_keep_alive: (provider_type == ProviderType::Ollama)
            .then_some(DEFAULT_OLLAMA_KEEP_ALIVE),
        default_auth_type: (provider_type == ProviderType::Custom).then(AuthType::default),
    }
}

/// Schemas for every provider type, in display order.
pub fn all_schemas() -> Vec<ProviderSchema> {
    ProviderType::all().iter().map(|t| schema(*t)).collect()
}
