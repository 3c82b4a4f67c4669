//! SQLite persistence for Modeldesk.
//!
//! One key-value `settings` table holds the provider settings document and
//! the branding snapshot, both as JSON text.

mod migrations;

use std::path::{Path, PathBuf};
use std::time::Duration;

use rusqlite::{Connection, OptionalExtension};

const DATA_DIR_NAME: &str = "modeldesk";
const DB_FILE_NAME: &str = "modeldesk.db";

/// An open settings database.
pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    /// Open `modeldesk/modeldesk.db` under the platform data directory.
    pub fn open() -> anyhow::Result<Self> {
        Self::open_at(Self::default_path()?)
    }

    /// Open or create the database file at `path`, creating missing parent
    /// directories. On Unix the file is made owner-only, since stored
    /// settings carry secret keys.
    pub fn open_at(path: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }

        let conn = Connection::open(&path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        restrict_permissions(&path);

        tracing::debug!(path = %path.display(), "Opened database");
        Ok(Self { conn, path })
    }

    /// `~/.local/share/modeldesk/modeldesk.db` or the platform equivalent.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let base = dirs::data_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".local").join("share")))
            .ok_or_else(|| anyhow::anyhow!("No data directory available for the database"))?;

        Ok(base.join(DATA_DIR_NAME).join(DB_FILE_NAME))
    }

    /// Bring the schema up to date. Idempotent.
    pub fn migrate(&self) -> anyhow::Result<()> {
        let applied = migrations::apply_pending(&self.conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %self.path.display(), "Database schema updated");
        }
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Insert or overwrite a settings entry.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = unixepoch()",
            [key, value],
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
    }

    /// Remove an entry. Returns whether one existed.
    pub fn delete_setting(&self, key: &str) -> Result<bool, rusqlite::Error> {
        let removed = self
            .conn
            .execute("DELETE FROM settings WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    let private = std::fs::Permissions::from_mode(0o600);
    if let Err(e) = std::fs::set_permissions(path, private) {
        tracing::warn!(path = %path.display(), error = %e, "Could not restrict database permissions");
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
