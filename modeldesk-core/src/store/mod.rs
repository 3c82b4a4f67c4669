//! Provider settings store.
//!
//! This module provides:
//! - `ProviderSettings` - id → config map plus the default selection
//! - `SettingsStore` - SQLite-backed persistence with obfuscated secrets

mod settings;
mod storage;

pub use settings::{new_provider_id, ProviderSettings};
pub use storage::{SettingsStore, StoreError, STORAGE_KEY};
