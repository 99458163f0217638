//! High-level database interface.

use std::path::PathBuf;

use directories::ProjectDirs;
use shorts_core::SettingsPatch;
use tracing::{debug, info};

use crate::error::{Result, StorageError};
use crate::models::{
    AggregateStats, Installation, NewInstallation, StoredSettings, StoredStatistics,
};
use crate::pool::ConnectionPool;
use crate::repository::{AggregateRepo, InstallationsRepo, SettingsRepo, StatisticsRepo};

/// Default database file name.
pub const DB_FILE_NAME: &str = "shorts-blocker.db";

/// Outcome of a registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub installation: Installation,
    /// False when the id was already registered and only touched.
    pub created: bool,
}

/// High-level database interface for the backend.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_db_path()?)
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "shorts-blocker", "shorts-blocker")
            .ok_or(StorageError::NoDataDir)?;

        Ok(proj_dirs.data_dir().join(DB_FILE_NAME))
    }

    // === Installations ===

    /// Register an installation, or refresh its last-active time if known.
    pub fn register_installation(&self, new: &NewInstallation) -> Result<Registration> {
        self.pool.transaction(|conn| {
            if InstallationsRepo::touch(conn, &new.installation_id)? {
                let installation = InstallationsRepo::get(conn, &new.installation_id)?
                    .ok_or_else(|| StorageError::NotFound(new.installation_id.clone()))?;
                debug!(installation_id = %new.installation_id, "Installation touched");
                return Ok(Registration {
                    installation,
                    created: false,
                });
            }

            let installation = InstallationsRepo::insert(conn, new)?;
            info!(installation_id = %new.installation_id, version = %new.version, "Installation registered");
            Ok(Registration {
                installation,
                created: true,
            })
        })
    }

    /// Get an installation by id.
    pub fn get_installation(&self, installation_id: &str) -> Result<Option<Installation>> {
        let conn = self.pool.get()?;
        InstallationsRepo::get(&conn, installation_id)
    }

    /// Delete an installation together with its settings and statistics.
    pub fn delete_installation(&self, installation_id: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        InstallationsRepo::delete(&conn, installation_id)
    }

    // === Settings ===

    /// Get stored settings.
    pub fn get_settings(&self, installation_id: &str) -> Result<Option<StoredSettings>> {
        let conn = self.pool.get()?;
        SettingsRepo::get(&conn, installation_id)
    }

    /// Upsert settings for a registered installation.
    pub fn save_settings(
        &self,
        installation_id: &str,
        patch: SettingsPatch,
    ) -> Result<StoredSettings> {
        let conn = self.pool.get()?;
        SettingsRepo::upsert(&conn, installation_id, patch)
    }

    // === Statistics ===

    /// Get stored statistics.
    pub fn get_statistics(&self, installation_id: &str) -> Result<Option<StoredStatistics>> {
        let conn = self.pool.get()?;
        StatisticsRepo::get(&conn, installation_id)
    }

    /// Add deltas to an installation's counters.
    pub fn update_statistics(
        &self,
        installation_id: &str,
        blocked_delta: u64,
        hidden_delta: u64,
    ) -> Result<StoredStatistics> {
        self.pool.transaction(|conn| {
            StatisticsRepo::update(conn, installation_id, blocked_delta, hidden_delta)
        })
    }

    /// Zero an installation's counters.
    pub fn reset_statistics(&self, installation_id: &str) -> Result<StoredStatistics> {
        let conn = self.pool.get()?;
        StatisticsRepo::reset(&conn, installation_id)
    }

    // === Aggregates ===

    /// Recompute totals, append a snapshot and return the latest one.
    pub fn refresh_aggregate(&self) -> Result<AggregateStats> {
        self.pool.transaction(|conn| {
            let totals = AggregateRepo::compute(conn)?;
            AggregateRepo::insert(conn, totals)?;
            info!(
                installations = totals.total_installations,
                active = totals.total_active,
                "Aggregate statistics recomputed"
            );

            AggregateRepo::latest(conn)?
                .ok_or_else(|| StorageError::NotFound("aggregate snapshot".to_string()))
        })
    }

    /// The most recent aggregate snapshot, if any.
    pub fn latest_aggregate(&self) -> Result<Option<AggregateStats>> {
        let conn = self.pool.get()?;
        AggregateRepo::latest(&conn)
    }

    /// Recent aggregate snapshots, newest first.
    pub fn list_aggregates(&self, limit: i64) -> Result<Vec<AggregateStats>> {
        let conn = self.pool.get()?;
        AggregateRepo::list(&conn, limit)
    }
}
