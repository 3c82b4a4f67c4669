//! Modeldesk Core Library
//!
//! This crate provides the core functionality for Modeldesk, an admin console
//! for configuring AI model providers. It includes:
//!
//! - Provider schemas and typed provider configuration
//! - Credential validation against the providers' live APIs
//! - Settings storage in SQLite with obfuscated secret keys
//! - Env file merging for the setup wizard
//! - Branding configuration with immutable snapshots
//! - Layered runtime configuration

pub mod branding;
pub mod config;
pub mod db;
pub mod envfile;
pub mod providers;
pub mod secrets;
pub mod store;
pub mod validator;

// Re-exports for convenience
pub use config::AppConfig;
pub use db::Database;

// Re-export providers
pub use providers::{
    all_schemas, mask_secret, AuthType, CommonConfig, ProviderConfig, ProviderConfigError,
    ProviderSchema, ProviderType, ValidationErrors,
};

// Re-export secrets
pub use secrets::{CipherError, Obfuscator, SecretProvider, StaticSecret};

// Re-export settings store
pub use store::{ProviderSettings, SettingsStore, StoreError};

// Re-export validator
pub use validator::{
    CredentialValidator, CredentialsRequest, CredentialsValidation, TestConnectionResult,
};

// Re-export env file handling
pub use envfile::{save_provider_config, EnvFile, EnvFileError};

// Re-export branding
pub use branding::{BrandingConfig, BrandingHandle, BrandingPatch};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn exports_are_accessible() {
        fn _check_types(
            _db: &Database,
            _config: &AppConfig,
            _settings: &ProviderSettings,
            _store: &SettingsStore<'_>,
            _validator: &CredentialValidator,
            _branding: &BrandingHandle,
            _env: &EnvFile,
            _secret: &dyn SecretProvider,
        ) {
        }
    }

    #[test]
    fn schemas_cover_every_provider() {
        let schemas = all_schemas();
        assert_eq!(schemas.len(), ProviderType::all().len());
    }
}
