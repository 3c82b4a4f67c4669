//! Provider settings persistence with obfuscated secrets.

use thiserror::Error;
use tracing::{debug, warn};

use crate::db::Database;
use crate::providers::{ProviderConfig, ProviderConfigError};
use crate::secrets::{CipherError, Obfuscator};

use super::settings::ProviderSettings;

/// Key of the settings entry holding the serialized provider settings.
pub const STORAGE_KEY: &str = "provider-settings";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Failed to serialize settings: {0}")]
    Serialize(serde_json::Error),
    #[error("Stored settings are corrupt: {0}")]
    Corrupt(serde_json::Error),
    #[error("Failed to process secret for provider {provider}: {source}")]
    Cipher {
        provider: String,
        #[source]
        source: CipherError,
    },
    #[error(transparent)]
    Provider(#[from] ProviderConfigError),
}

/// Settings store operations.
pub struct SettingsStore<'a> {
    db: &'a Database,
    obfuscator: &'a Obfuscator,
}

impl<'a> SettingsStore<'a> {
    /// Create a store over a migrated database.
    ///
    /// Secret keys pass through `obfuscator` on every save and load.
    pub fn new(db: &'a Database, obfuscator: &'a Obfuscator) -> Self {
        Self { db, obfuscator }
    }

    /// Persist the whole settings document, obfuscating every secret key.
    pub fn save(&self, settings: &ProviderSettings) -> Result<(), StoreError> {
        let mut stored = settings.clone();
        for (id, config) in stored.providers.iter_mut() {
            self.transform_secret(id, config, |ob, key| ob.obfuscate(key))?;
        }

        let json = serde_json::to_string(&stored).map_err(StoreError::Serialize)?;
        self.db.set_setting(STORAGE_KEY, &json).inspect_err(|e| {
            warn!(error = %e, "Failed to save provider settings");
        })?;

        debug!(providers = stored.providers.len(), "Saved provider settings");
        Ok(())
    }

    /// Load the settings document.
    ///
    /// Returns `Ok(None)` when nothing has been saved yet. Malformed JSON and
    /// undecryptable secrets are errors, not absence.
    pub fn load(&self) -> Result<Option<ProviderSettings>, StoreError> {
        let Some(json) = self.db.get_setting(STORAGE_KEY).inspect_err(|e| {
            warn!(error = %e, "Failed to read provider settings");
        })?
        else {
            return Ok(None);
        };

        let mut settings: ProviderSettings = serde_json::from_str(&json).map_err(|e| {
            warn!(error = %e, "Stored provider settings are not valid JSON");
            StoreError::Corrupt(e)
        })?;

        for (id, config) in settings.providers.iter_mut() {
            self.transform_secret(id, config, |ob, key| ob.deobfuscate(key))?;
        }

        debug!(providers = settings.providers.len(), "Loaded provider settings");
        Ok(Some(settings))
    }

    /// Load, or start from empty settings when nothing is stored.
    pub fn load_or_default(&self) -> Result<ProviderSettings, StoreError> {
        Ok(self.load()?.unwrap_or_default())
    }

    /// Delete all stored provider settings.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.db.delete_setting(STORAGE_KEY)?;
        debug!("Cleared provider settings");
        Ok(())
    }

    /// Add a provider and persist. Returns the new id.
    pub fn add_provider(&self, config: ProviderConfig) -> Result<String, StoreError> {
        let mut settings = self.load_or_default()?;
        let id = settings.insert(config);
        self.save(&settings)?;
        Ok(id)
    }

    /// Replace an existing provider and persist.
    pub fn replace_provider(&self, id: &str, config: ProviderConfig) -> Result<(), StoreError> {
        let mut settings = self.load_or_default()?;
        settings.replace(id, config)?;
        self.save(&settings)
    }

    /// Select the default provider and persist.
    pub fn set_default_provider(&self, id: &str) -> Result<(), StoreError> {
        let mut settings = self.load_or_default()?;
        settings.set_default(id)?;
        self.save(&settings)
    }

    fn transform_secret(
        &self,
        id: &str,
        config: &mut ProviderConfig,
        op: impl Fn(&Obfuscator, &str) -> Result<String, CipherError>,
    ) -> Result<(), StoreError> {
        let common = config.common_mut();
        let Some(key) = common.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(());
        };

        let transformed = op(self.obfuscator, key).map_err(|source| {
            warn!(provider = %id, error = %source, "Secret transform failed");
            StoreError::Cipher {
                provider: id.to_string(),
                source,
            }
        })?;
        common.api_key = Some(transformed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CommonConfig, ProviderType};
    use crate::secrets::StaticSecret;
    use secrecy::SecretString;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Database, Obfuscator) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_at(temp_dir.path().join("test.db")).unwrap();
        db.migrate().unwrap();
        let obfuscator = Obfuscator::new(&StaticSecret::default());
        (temp_dir, db, obfuscator)
    }

    fn openai(api_key: Option<&str>) -> ProviderConfig {
        ProviderConfig::new(
            ProviderType::OpenAi,
            CommonConfig {
                name: "P1".to_string(),
                api_key: api_key.map(str::to_string),
                base_url: Some("https://api.openai.com/v1".to_string()),
                model: "gpt-4o".to_string(),
                temperature: 0.7,
                max_tokens: 2048,
            },
        )
    }

    fn sample_settings() -> ProviderSettings {
        let mut settings = ProviderSettings::new();
        let id = settings.insert(openai(Some("sk-test")));
        settings.insert(ProviderConfig::new(
            ProviderType::Ollama,
            CommonConfig {
                name: "local".to_string(),
                model: "llama3.2".to_string(),
                ..Default::default()
            },
        ));
        settings.set_default(&id).unwrap();
        settings
    }

    #[test]
    fn test_load_returns_none_when_missing() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);

        let settings = sample_settings();
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_secrets_are_not_stored_in_plaintext() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);

        store.save(&sample_settings()).unwrap();

        let raw = db.get_setting(STORAGE_KEY).unwrap().unwrap();
        assert!(!raw.contains("sk-test"));
        assert!(raw.contains("\"apiKey\""));
    }

    #[test]
    fn test_save_clear_load_returns_none() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);

        store.save(&sample_settings()).unwrap();
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_json_is_reported() {
        let (_temp, db, ob) = setup();
        db.set_setting(STORAGE_KEY, "not valid json {{").unwrap();

        let store = SettingsStore::new(&db, &ob);
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn test_wrong_passphrase_is_reported() {
        let (_temp, db, ob) = setup();
        SettingsStore::new(&db, &ob).save(&sample_settings()).unwrap();

        let other = Obfuscator::new(&StaticSecret::new(SecretString::from(
            "another-passphrase".to_string(),
        )));
        let result = SettingsStore::new(&db, &other).load();
        assert!(matches!(result, Err(StoreError::Cipher { .. })));
    }

    #[test]
    fn test_add_provider_persists() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);

        let first = store.add_provider(openai(Some("sk-one"))).unwrap();
        let second = store.add_provider(openai(None)).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get(&first).unwrap().api_key(), Some("sk-one"));
        assert_eq!(loaded.get(&second).unwrap().api_key(), None);
    }

    #[test]
    fn test_replace_and_default() {
        let (_temp, db, ob) = setup();
        let store = SettingsStore::new(&db, &ob);

        let id = store.add_provider(openai(Some("sk-one"))).unwrap();
        store.replace_provider(&id, openai(Some("sk-two"))).unwrap();
        store.set_default_provider(&id).unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.get(&id).unwrap().api_key(), Some("sk-two"));
        assert_eq!(loaded.default_provider.as_deref(), Some(id.as_str()));

        assert!(matches!(
            store.set_default_provider("missing"),
            Err(StoreError::Provider(ProviderConfigError::ProviderNotFound(_)))
        ));
    }
}
