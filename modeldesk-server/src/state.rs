//! Shared application state.

use std::path::PathBuf;

use parking_lot::Mutex;

use modeldesk_core::{
    save_provider_config, BrandingConfig, BrandingHandle, CredentialValidator,
    CredentialsRequest, Database, EnvFileError, Obfuscator, SecretProvider, SettingsStore,
    StoreError,
};

/// Everything the request handlers share.
///
/// The database and env file locks are only taken for synchronous calls,
/// never across an `.await`.
pub struct AppState {
    db: Mutex<Database>,
    env_lock: Mutex<()>,
    obfuscator: Obfuscator,
    pub validator: CredentialValidator,
    pub branding: BrandingHandle,
    pub env_file: PathBuf,
}

impl AppState {
    /// Build the state from a migrated database. Branding is loaded from the
    /// database once, here.
    pub fn new(
        db: Database,
        secret: &dyn SecretProvider,
        validator: CredentialValidator,
        env_file: PathBuf,
    ) -> Self {
        let branding = BrandingHandle::new(BrandingConfig::load(&db));
        Self {
            db: Mutex::new(db),
            env_lock: Mutex::new(()),
            obfuscator: Obfuscator::new(secret),
            validator,
            branding,
            env_file,
        }
    }

    /// Run `f` against the settings store while holding the database lock.
    pub fn with_store<T>(
        &self,
        f: impl FnOnce(&SettingsStore<'_>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let db = self.db.lock();
        let store = SettingsStore::new(&db, &self.obfuscator);
        f(&store)
    }

    /// Run `f` against the raw database while holding the lock.
    pub fn with_db<T>(&self, f: impl FnOnce(&Database) -> T) -> T {
        let db = self.db.lock();
        f(&db)
    }

    /// Merge a wizard request into the env file. Saves run one at a time so
    /// no merge is lost.
    pub fn save_env_config(&self, request: &CredentialsRequest) -> Result<(), EnvFileError> {
        let _guard = self.env_lock.lock();
        save_provider_config(&self.env_file, request)
    }
}
