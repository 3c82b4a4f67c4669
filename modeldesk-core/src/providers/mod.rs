//! Provider configuration and schema registry.
//!
//! This module provides:
//! - `ProviderType` - Supported AI provider types
//! - `ProviderConfig` - Per-instance configuration (tagged union)
//! - `registry` - Static schemas, default base URLs and model lists

mod config;
pub mod registry;
mod types;

pub use config::{
    mask_secret, AnthropicConfig, CommonConfig, CustomConfig, FieldError, MistralConfig,
    OllamaConfig, OpenAiConfig, ProviderConfig, ValidationErrors,
};
pub use registry::{all_schemas, ProviderSchema};
pub use types::{AuthType, ProviderConfigError, ProviderType};
