//! Database migration system
//!
//! Tracks schema versions and applies migrations in order.

use rusqlite::Connection;
use tracing::{info, instrument};

use crate::error::Result;

/// A database migration
pub struct Migration {
    /// Version number (must be sequential starting from 1)
    pub version: u32,
    /// Description of what this migration does
    pub description: &'static str,
    /// SQL to run for this migration
    pub sql: &'static str,
}

/// All migrations in order
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema",
        sql: r#"
            -- Teams table: one row per chat group
            CREATE TABLE IF NOT EXISTS teams (
                id TEXT PRIMARY KEY,
                chat_id INTEGER NOT NULL UNIQUE,
                name TEXT NOT NULL,
                -- JSON array of weekly slots
                schedule TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            -- Matches table: one row per materialized occurrence.
            -- UNIQUE(team_id, date) is the conditional-insert primitive two
            -- racing writers resolve through: only one insert survives.
            CREATE TABLE IF NOT EXISTS matches (
                id TEXT PRIMARY KEY,
                team_id INTEGER NOT NULL,
                date TEXT NOT NULL,
                -- JSON array of players in first-confirmation order
                squad TEXT NOT NULL,
                completed INTEGER NOT NULL DEFAULT 0,
                message_ref INTEGER,
                created_at TEXT NOT NULL,
                UNIQUE(team_id, date),
                FOREIGN KEY (team_id) REFERENCES teams(chat_id) ON DELETE CASCADE
            );

            -- Processed confirmation ids, the idempotency gate for updates
            CREATE TABLE IF NOT EXISTS confirmations (
                update_id TEXT PRIMARY KEY,
                processed_at TEXT NOT NULL
            );
        "#,
    },
    Migration {
        version: 2,
        description: "Add indexes for match and purge lookups",
        sql: r#"
            CREATE INDEX IF NOT EXISTS idx_matches_team_date ON matches(team_id, date);
            CREATE INDEX IF NOT EXISTS idx_matches_team_completed ON matches(team_id, completed);
            CREATE INDEX IF NOT EXISTS idx_confirmations_processed ON confirmations(processed_at);
        "#,
    },
];

/// Initialize the migrations table
fn init_migrations_table(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            description TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version
fn get_current_version(conn: &Connection) -> Result<u32> {
    let version: Option<u32> = conn
        .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
            row.get(0)
        })
        .unwrap_or(None);
    Ok(version.unwrap_or(0))
}

/// Record that a migration was applied
fn record_migration(conn: &Connection, migration: &Migration) -> Result<()> {
    conn.execute(
        "INSERT INTO schema_migrations (version, description, applied_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![
            migration.version,
            migration.description,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Run all pending migrations
#[instrument(skip(conn))]
pub fn run_migrations(conn: &Connection) -> Result<()> {
    init_migrations_table(conn)?;

    let current_version = get_current_version(conn)?;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                description = migration.description,
                "Applying migration"
            );

            conn.execute_batch(migration.sql)?;
            record_migration(conn, migration)?;
        }
    }

    let new_version = get_current_version(conn)?;
    if new_version > current_version {
        info!(
            from = current_version,
            to = new_version,
            "Database schema updated"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latest_version() -> u32 {
        MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
    }

    #[test]
    fn migrations_run() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        assert_eq!(get_current_version(&conn).unwrap(), latest_version());
    }

    #[test]
    fn migrations_sequential() {
        for (i, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(
                migration.version as usize,
                i + 1,
                "Migration {} should have version {}",
                migration.description,
                i + 1
            );
        }
    }
}
