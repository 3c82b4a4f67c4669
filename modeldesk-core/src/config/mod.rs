//! Runtime configuration for Modeldesk.
//!
//! Sources, later ones overriding earlier ones:
//! 1. built-in defaults
//! 2. `modeldesk.toml` in the working directory (optional)
//! 3. `MODELDESK__<SECTION>__<KEY>` environment variables

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use secrecy::SecretString;
use serde::Deserialize;

use crate::db::Database;
use crate::secrets::DEFAULT_PASSPHRASE;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "modeldesk.toml";

const ENV_PREFIX: &str = "MODELDESK";

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Open the console in the default browser after binding.
    pub open_browser: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    /// SQLite file. Defaults to the platform data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Env file written by the setup wizard.
    pub env_file: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProbeSettings {
    pub timeout_secs: u64,
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecretSettings {
    /// Passphrase the secret-obfuscation key is derived from.
    pub passphrase: SecretString,
}

/// Top-level configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub probe: ProbeSettings,
    pub secrets: SecretSettings,
}

impl AppConfig {
    /// Load from `modeldesk.toml` (if present) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Some(Path::new(CONFIG_FILE)), None)
    }

    /// Load from an optional file, with environment variables taken from
    /// `env` instead of the process when given.
    pub fn load_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.open_browser", false)?
            .set_default("storage.env_file", ".env.local")?
            .set_default("probe.timeout_secs", 10)?
            .set_default("secrets.passphrase", DEFAULT_PASSPHRASE)?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(false));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .source(env),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Listen address as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Configured database path, or the platform default.
    pub fn database_path(&self) -> anyhow::Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Database::default_path(),
        }
    }
}
