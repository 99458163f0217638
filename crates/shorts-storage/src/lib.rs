//! Shorts Blocker Storage - SQLite persistence for the backend.
//!
//! Four tables back the REST API:
//!
//! - `installations`: one row per registered extension install
//! - `settings` and `statistics`: one row per installation, deleted with it
//! - `aggregate_stats`: append-only snapshots of cross-installation totals
//!
//! # Example
//!
//! ```
//! use shorts_storage::{Database, models::NewInstallation};
//!
//! let db = Database::in_memory().unwrap();
//! db.register_installation(&NewInstallation::new("abc")).unwrap();
//!
//! let stats = db.update_statistics("abc", 2, 1).unwrap();
//! assert_eq!(stats.statistics.shorts_blocked, 2);
//! ```

mod database;
pub mod error;
pub mod models;
mod pool;
pub mod repository;
mod schema;

pub use database::{Database, Registration, DB_FILE_NAME};
pub use error::{Result, StorageError};
pub use models::{
    AggregateStats, AggregateTotals, Installation, NewInstallation, StoredSettings,
    StoredStatistics,
};
pub use pool::ConnectionPool;
pub use repository::{AggregateRepo, InstallationsRepo, SettingsRepo, StatisticsRepo};
