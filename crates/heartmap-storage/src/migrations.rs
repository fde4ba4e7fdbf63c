//! Database schema migrations.
//!
//! Applies the initial schema: the health_records table, its filter
//! indexes, and the schema_migrations tracking table.

use rusqlite::Connection;
use tracing::info;

use heartmap_core::error::HeartMapError;

/// Run all pending database migrations.
pub fn run_migrations(conn: &Connection) -> Result<(), HeartMapError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version     INTEGER PRIMARY KEY NOT NULL,
            name        TEXT NOT NULL,
            applied_at  INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        );",
    )
    .map_err(|e| HeartMapError::Storage(format!("Failed to create migrations table: {}", e)))?;

    let current_version: i64 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .map_err(|e| HeartMapError::Storage(format!("Failed to query migration version: {}", e)))?;

    if current_version < 1 {
        apply_v1(conn)?;
        info!("Applied migration v1: initial_schema");
    }

    Ok(())
}

/// Version 1: Initial schema.
fn apply_v1(conn: &Connection) -> Result<(), HeartMapError> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS health_records (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            year            INTEGER NOT NULL,
            state_abbr      TEXT NOT NULL CHECK (state_abbr <> 'US'),
            state_name      TEXT NOT NULL DEFAULT '',
            topic           TEXT NOT NULL,
            indicator       TEXT NOT NULL DEFAULT '',
            value           REAL,
            unit            TEXT NOT NULL DEFAULT '',
            demographic     TEXT NOT NULL DEFAULT 'Overall'
        );

        CREATE INDEX IF NOT EXISTS idx_health_records_topic
            ON health_records (topic);

        CREATE INDEX IF NOT EXISTS idx_health_records_year
            ON health_records (year);

        CREATE INDEX IF NOT EXISTS idx_health_records_demographic
            ON health_records (demographic);

        INSERT OR IGNORE INTO schema_migrations (version, name) VALUES (1, 'initial_schema');
        ",
    )
    .map_err(|e| HeartMapError::Storage(format!("Failed to apply migration v1: {}", e)))?;

    Ok(())
}
