//! Current branding snapshot and its persistence.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::db::Database;

use super::{BrandingConfig, BrandingPatch};

/// Settings key holding the serialized branding.
pub const BRANDING_KEY: &str = "branding";

impl BrandingConfig {
    /// Load branding from the database.
    ///
    /// Falls back to defaults when nothing is stored or the entry can't be parsed.
    pub fn load(db: &Database) -> Self {
        match db.get_setting(BRANDING_KEY) {
            Ok(Some(json)) => match serde_json::from_str::<BrandingConfig>(&json) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to parse branding, using defaults");
                    Self::default()
                }
            },
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read branding, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self, db: &Database) -> anyhow::Result<()> {
        let json = serde_json::to_string(self)?;
        db.set_setting(BRANDING_KEY, &json)?;
        Ok(())
    }
}

/// Holder of the current branding snapshot.
///
/// Readers get an `Arc` that never changes; updates swap in a new one.
#[derive(Debug, Default)]
pub struct BrandingHandle {
    current: RwLock<Arc<BrandingConfig>>,
}

impl BrandingHandle {
    pub fn new(config: BrandingConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<BrandingConfig> {
        self.current.read().clone()
    }

    /// Merge `patch` into the current snapshot, persist it, then install it.
    ///
    /// The write lock is held throughout, so concurrent updates are stored in
    /// the order they are served. When saving fails the current snapshot is
    /// left as it was.
    pub fn apply(&self, db: &Database, patch: &BrandingPatch) -> anyhow::Result<Arc<BrandingConfig>> {
        let mut current = self.current.write();
        let next = current.merged(patch);
        next.save(db)?;

        let next = Arc::new(next);
        *current = Arc::clone(&next);
        tracing::debug!(name = %next.name, "Branding updated");
        Ok(next)
    }

    /// Remove the stored branding and install the defaults.
    pub fn reset(&self, db: &Database) -> anyhow::Result<Arc<BrandingConfig>> {
        let mut current = self.current.write();
        db.delete_setting(BRANDING_KEY)?;

        let next = Arc::new(BrandingConfig::default());
        *current = Arc::clone(&next);
        Ok(next)
    }
}
