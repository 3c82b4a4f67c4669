//! The provider settings document.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::providers::{ProviderConfig, ProviderConfigError, ProviderType};

/// Every configured provider instance plus the default selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderSettings {
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_provider: Option<String>,
}

/// Generate a provider-instance id: `{type}-{uuid}`.
pub fn new_provider_id(provider_type: ProviderType) -> String {
    format!("{}-{}", provider_type, Uuid::new_v4())
}

impl ProviderSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a config under a freshly generated id and return the id.
    pub fn insert(&mut self, config: ProviderConfig) -> String {
        let id = new_provider_id(config.provider_type());
        self.providers.insert(id.clone(), config);
        id
    }

    /// Replace the config stored under `id` wholesale.
    pub fn replace(&mut self, id: &str, config: ProviderConfig) -> Result<(), ProviderConfigError> {
        match self.providers.get_mut(id) {
            Some(slot) => {
                *slot = config;
                Ok(())
            }
            None => Err(ProviderConfigError::ProviderNotFound(id.to_string())),
        }
    }

    pub fn get(&self, id: &str) -> Option<&ProviderConfig> {
        self.providers.get(id)
    }

    /// First stored config of a given type, used to prefill forms.
    pub fn find_by_type(&self, provider_type: ProviderType) -> Option<(&str, &ProviderConfig)> {
        self.providers
            .iter()
            .find(|(_, config)| config.provider_type() == provider_type)
            .map(|(id, config)| (id.as_str(), config))
    }

    /// Mark an existing provider as the default.
    pub fn set_default(&mut self, id: &str) -> Result<(), ProviderConfigError> {
        if !self.providers.contains_key(id) {
            return Err(ProviderConfigError::ProviderNotFound(id.to_string()));
        }
        self.default_provider = Some(id.to_string());
        Ok(())
    }

    /// The default provider's config, if one is selected and still present.
    pub fn default_config(&self) -> Option<&ProviderConfig> {
        self.default_provider
            .as_deref()
            .and_then(|id| self.providers.get(id))
    }

    /// Copy with every secret key masked.
    pub fn redacted(&self) -> Self {
        Self {
            providers: self
                .providers
                .iter()
                .map(|(id, config)| (id.clone(), config.redacted()))
                .collect(),
            default_provider: self.default_provider.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }
}
