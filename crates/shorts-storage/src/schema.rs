//! Database schema and migrations.

use rusqlite::Connection;
use tracing::info;

use crate::error::{Result, StorageError};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;

    if current_version > SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "database schema v{} is newer than supported v{}",
            current_version, SCHEMA_VERSION
        )));
    }

    if current_version < SCHEMA_VERSION {
        info!(
            "Running migrations from version {} to {}",
            current_version, SCHEMA_VERSION
        );

        if current_version < 1 {
            migrate_v1(conn)?;
        }

        if current_version < 2 {
            migrate_v2(conn)?;
        }

        set_schema_version(conn, SCHEMA_VERSION)?;
        info!("Migrations complete");
    }

    Ok(())
}

fn get_schema_version(conn: &Connection) -> Result<i32> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        )",
        [],
    )?;

    let version: Option<i32> = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
            row.get(0)
        })
        .ok();

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration to version 1: installations, settings toggles, statistics and
/// aggregate snapshots.
fn migrate_v1(conn: &Connection) -> Result<()> {
    info!("Applying migration v1: Initial schema");

    conn.execute(
        "CREATE TABLE IF NOT EXISTS installations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            installation_id TEXT NOT NULL UNIQUE,
            first_installed TEXT NOT NULL,
            last_active TEXT NOT NULL,
            version TEXT NOT NULL,
            browser_info TEXT NOT NULL DEFAULT ''
        )",
        [],
    )?;

    // Active-installation counts scan by last_active
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_installations_last_active ON installations (last_active)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            installation_id TEXT NOT NULL UNIQUE
                REFERENCES installations (installation_id) ON DELETE CASCADE,
            hide_shorts INTEGER NOT NULL DEFAULT 1,
            block_shorts INTEGER NOT NULL DEFAULT 0,
            use_statistics INTEGER NOT NULL DEFAULT 1,
            last_updated TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS statistics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            installation_id TEXT NOT NULL UNIQUE
                REFERENCES installations (installation_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            shorts_blocked INTEGER NOT NULL DEFAULT 0 CHECK (shorts_blocked >= 0),
            shorts_hidden INTEGER NOT NULL DEFAULT 0 CHECK (shorts_hidden >= 0),
            last_reset TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS aggregate_stats (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT NOT NULL,
            total_installations INTEGER NOT NULL DEFAULT 0,
            total_active INTEGER NOT NULL DEFAULT 0,
            total_shorts_blocked INTEGER NOT NULL DEFAULT 0,
            total_shorts_hidden INTEGER NOT NULL DEFAULT 0
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_aggregate_stats_date ON aggregate_stats (date)",
        [],
    )?;

    Ok(())
}

/// Migration to version 2: filter and whitelist lists on settings.
fn migrate_v2(conn: &Connection) -> Result<()> {
    info!("Applying migration v2: Settings lists");

    for column in ["custom_filters", "category_filters", "whitelist"] {
        let has_column: bool = conn
            .prepare(&format!("SELECT {} FROM settings LIMIT 1", column))
            .is_ok();
        if !has_column {
            conn.execute(
                &format!(
                    "ALTER TABLE settings ADD COLUMN {} TEXT NOT NULL DEFAULT '[]'",
                    column
                ),
                [],
            )?;
        }
    }

    Ok(())
}
