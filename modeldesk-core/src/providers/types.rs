//! Core provider type definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while handling provider configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProviderConfigError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),
}

/// Supported provider types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    OpenAi,
    Anthropic,
    Mistral,
    Ollama,
    Custom,
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = ProviderConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ProviderType::OpenAi),
            "anthropic" => Ok(ProviderType::Anthropic),
            "mistral" => Ok(ProviderType::Mistral),
            "ollama" => Ok(ProviderType::Ollama),
            "custom" => Ok(ProviderType::Custom),
            _ => Err(ProviderConfigError::UnknownProvider(s.to_string())),
        }
    }
}

impl ProviderType {
    /// Get all provider types, in display order.
    pub fn all() -> &'static [ProviderType] {
        &[
            Self::OpenAi,
            Self::Anthropic,
            Self::Mistral,
            Self::Ollama,
            Self::Custom,
        ]
    }

    /// Wire name used in JSON, ids and environment keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Mistral => "mistral",
            Self::Ollama => "ollama",
            Self::Custom => "custom",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OpenAi => "OpenAI",
            Self::Anthropic => "Anthropic",
            Self::Mistral => "Mistral",
            Self::Ollama => "Ollama",
            Self::Custom => "Custom",
        }
    }

    /// Whether a probe needs a secret key before any request is made.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::OpenAi | Self::Anthropic | Self::Mistral)
    }
}

/// Authentication strategy for custom endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AuthType {
    None,
    /// `Authorization: Bearer <key>`
    #[default]
    Bearer,
    /// `X-API-Key: <key>`
    ApiKey,
    /// `<customAuthHeader>: <key>`
    Custom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_type_display() {
        assert_eq!(ProviderType::OpenAi.to_string(), "openai");
        assert_eq!(ProviderType::Custom.to_string(), "custom");
    }

    #[test]
    fn test_provider_type_from_str() {
        assert_eq!("openai".parse(), Ok(ProviderType::OpenAi));
        assert_eq!(" Anthropic ".parse(), Ok(ProviderType::Anthropic));
        assert_eq!(
            "gemini".parse::<ProviderType>(),
            Err(ProviderConfigError::UnknownProvider("gemini".to_string()))
        );
    }

    #[test]
    fn test_provider_type_serialization() {
        let json = serde_json::to_string(&ProviderType::OpenAi).unwrap();
        assert_eq!(json, "\"openai\"");
        let parsed: ProviderType = serde_json::from_str("\"ollama\"").unwrap();
        assert_eq!(parsed, ProviderType::Ollama);
    }

    #[test]
    fn test_requires_api_key() {
        assert!(ProviderType::OpenAi.requires_api_key());
        assert!(ProviderType::Mistral.requires_api_key());
        assert!(!ProviderType::Ollama.requires_api_key());
        assert!(!ProviderType::Custom.requires_api_key());
    }

    #[test]
    fn test_auth_type_serialization() {
        assert_eq!(serde_json::to_string(&AuthType::ApiKey).unwrap(), "\"api-key\"");
        assert_eq!(AuthType::default(), AuthType::Bearer);
    }
}
