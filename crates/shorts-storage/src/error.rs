//! Storage error types.

use thiserror::Error;

/// Errors raised by the backend store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// SQLite failure other than the cases below.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A settings or statistics write referenced an unregistered installation.
    #[error("Unknown installation: {0}")]
    UnknownInstallation(String),

    /// A list column could not be encoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Creating the database directory failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Record not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// No platform data directory to place the default database in.
    #[error("Could not determine app data directory")]
    NoDataDir,

    /// A request panicked while holding the connection.
    #[error("Connection pool poisoned")]
    PoolPoisoned,

    /// Stored schema is newer than this build or a migration failed.
    #[error("Migration error: {0}")]
    Migration(String),
}

impl StorageError {
    /// Maps a foreign key violation on `installation_id` to
    /// [`StorageError::UnknownInstallation`].
    pub(crate) fn from_reference(err: rusqlite::Error, installation_id: &str) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _)
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
            {
                StorageError::UnknownInstallation(installation_id.to_string())
            }
            _ => StorageError::Database(err),
        }
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
