//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shorts_core::api::{AggregateStatsResponse, SettingsResponse, StatisticsResponse};
use shorts_core::installation::DEFAULT_CLIENT_VERSION;
use shorts_core::{Settings, Statistics};

/// A registered extension installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installation {
    /// Row id.
    pub id: i64,
    /// Opaque client identifier, unique and immutable.
    pub installation_id: String,
    pub first_installed: DateTime<Utc>,
    /// Refreshed on every registration call.
    pub last_active: DateTime<Utc>,
    /// Client version at registration.
    pub version: String,
    /// Free-text browser descriptor.
    pub browser_info: String,
}

/// Data for registering an installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallation {
    pub installation_id: String,
    pub version: String,
    pub browser_info: String,
}

impl NewInstallation {
    /// Installation with the default client version and no browser info.
    pub fn new(installation_id: impl Into<String>) -> Self {
        Self {
            installation_id: installation_id.into(),
            version: DEFAULT_CLIENT_VERSION.to_string(),
            browser_info: String::new(),
        }
    }
}

/// Settings row for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSettings {
    pub installation_id: String,
    pub settings: Settings,
    pub last_updated: DateTime<Utc>,
}

impl From<StoredSettings> for SettingsResponse {
    fn from(s: StoredSettings) -> Self {
        Self {
            installation_id: s.installation_id,
            settings: s.settings,
            last_updated: Some(s.last_updated),
        }
    }
}

/// Statistics row for one installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStatistics {
    pub installation_id: String,
    pub statistics: Statistics,
    /// Time of the last write.
    pub date: DateTime<Utc>,
}

impl From<StoredStatistics> for StatisticsResponse {
    fn from(s: StoredStatistics) -> Self {
        Self {
            installation_id: s.installation_id,
            statistics: s.statistics,
            date: Some(s.date),
        }
    }
}

/// Totals computed across all installations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateTotals {
    pub total_installations: u64,
    /// Installations active within the last seven days.
    pub total_active: u64,
    pub total_shorts_blocked: u64,
    pub total_shorts_hidden: u64,
}

/// One appended aggregate snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub totals: AggregateTotals,
}

impl From<AggregateStats> for AggregateStatsResponse {
    fn from(a: AggregateStats) -> Self {
        Self {
            id: a.id,
            date: a.date,
            total_installations: a.totals.total_installations,
            total_active: a.totals.total_active,
            total_shorts_blocked: a.totals.total_shorts_blocked,
            total_shorts_hidden: a.totals.total_shorts_hidden,
        }
    }
}
