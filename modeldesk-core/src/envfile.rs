//! `KEY=VALUE` environment file handling for the setup wizard.
//!
//! Lines are split at the first `=` with key and value trimmed. `#` comments
//! are kept as written; blank lines and lines without `=` are dropped. Keys
//! keep the position where they were first seen.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

use crate::providers::{ProviderConfigError, ProviderType};
use crate::validator::CredentialsRequest;

/// Key naming the provider selected by the wizard.
pub const ACTIVE_PROVIDER_KEY: &str = "ACTIVE_AI_PROVIDER";

#[derive(Debug, Error)]
pub enum EnvFileError {
    #[error("Failed to access env file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid env key: {0}")]
    InvalidKey(String),
    #[error("Value for {0} must not contain line breaks")]
    InvalidValue(String),
    #[error(transparent)]
    Provider(#[from] ProviderConfigError),
}

impl EnvFileError {
    /// Whether the caller supplied bad input, as opposed to a write failure.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    Comment(String),
    Entry { key: String, value: String },
}

/// An ordered env file document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvFile {
    lines: Vec<Line>,
}

static KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("env key pattern compiles"));

fn is_valid_key(key: &str) -> bool {
    KEY_PATTERN.is_match(key)
}

impl EnvFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parse(content: &str) -> Self {
        let mut file = Self::new();
        for raw in content.lines() {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                continue;
            }
            if trimmed.starts_with('#') {
                file.lines.push(Line::Comment(raw.trim_end().to_string()));
                continue;
            }
            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            file.upsert(key, value.trim());
        }
        file
    }

    /// Read an env file. A missing file is an empty document.
    pub fn load(path: &Path) -> Result<Self, EnvFileError> {
        match fs::read_to_string(path) {
            Ok(content) => Ok(Self::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Env file not found, starting empty");
                Ok(Self::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Set a key, replacing an existing value in place.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), EnvFileError> {
        if !is_valid_key(key) {
            return Err(EnvFileError::InvalidKey(key.to_string()));
        }
        if value.contains(['\n', '\r']) {
            return Err(EnvFileError::InvalidValue(key.to_string()));
        }
        self.upsert(key, value.trim());
        Ok(())
    }

    fn upsert(&mut self, key: &str, value: &str) {
        for line in &mut self.lines {
            if let Line::Entry { key: k, value: v } = line {
                if k == key {
                    *v = value.to_string();
                    return;
                }
            }
        }
        self.lines.push(Line::Entry {
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    /// Entry keys in file order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, .. } => Some(key.as_str()),
            Line::Comment(_) => None,
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                Line::Comment(text) => out.push_str(text),
                Line::Entry { key, value } => {
                    out.push_str(key);
                    out.push('=');
                    out.push_str(value);
                }
            }
            out.push('\n');
        }
        out
    }

    /// Write via a uniquely named sibling temp file and rename. The file is
    /// 0600 on Unix.
    ///
    /// Readers see either the old or the new content. Callers doing a
    /// load-modify-write must still serialize among themselves.
    pub fn write_atomic(&self, path: &Path) -> Result<(), EnvFileError> {
        let dir = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => {
                fs::create_dir_all(parent)?;
                parent
            }
            None => Path::new("."),
        };

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(self.render().as_bytes())?;
        temp.as_file().sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o600))?;
        }

        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Merge a wizard request into the env file at `path`.
///
/// Sets `{PROVIDER}_API_KEY`, `{PROVIDER}_ENDPOINT` and `{PROVIDER}_MODEL`
/// for the fields that are present, plus `ACTIVE_AI_PROVIDER`. Other keys
/// are preserved.
pub fn save_provider_config(path: &Path, request: &CredentialsRequest) -> Result<(), EnvFileError> {
    let provider_type: ProviderType = request.provider_type()?;
    let prefix = provider_type.as_str().to_ascii_uppercase();

    let mut env = EnvFile::load(path)?;
    let mut updated = Vec::new();

    for (suffix, value) in [
        ("API_KEY", request.api_key()),
        ("ENDPOINT", request.endpoint()),
        ("MODEL", request.model()),
    ] {
        if let Some(value) = value {
            let key = format!("{prefix}_{suffix}");
            env.set(&key, value)?;
            updated.push(key);
        }
    }
    env.set(ACTIVE_PROVIDER_KEY, provider_type.as_str())?;

    env.write_atomic(path)?;
    info!(path = %path.display(), provider = %provider_type, keys = ?updated, "Saved provider configuration to env file");
    Ok(())
}
