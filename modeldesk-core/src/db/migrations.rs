//! Schema migrations, applied in order and recorded by name.

use rusqlite::{Connection, OptionalExtension};

struct Migration {
    name: &'static str,
    sql: &'static str,
}

/// Key-value settings: the provider settings document and the branding.
const CREATE_SETTINGS: &str = "
CREATE TABLE settings (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    updated_at INTEGER NOT NULL DEFAULT (unixepoch())
);
";

const MIGRATIONS: &[Migration] = &[Migration {
    name: "001_settings",
    sql: CREATE_SETTINGS,
}];

/// Apply every migration not yet recorded. Returns how many ran.
///
/// Each migration runs in its own transaction together with its record.
pub fn apply_pending(conn: &Connection) -> anyhow::Result<usize> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            name TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL DEFAULT (unixepoch())
        );",
    )?;

    let mut applied = 0;
    for migration in MIGRATIONS {
        let done = conn
            .query_row(
                "SELECT 1 FROM schema_migrations WHERE name = ?1",
                [migration.name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        if done {
            continue;
        }

        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (name) VALUES (?1)",
            [migration.name],
        )?;
        tx.commit()?;

        tracing::info!(migration = migration.name, "Applied migration");
        applied += 1;
    }

    Ok(applied)
}
