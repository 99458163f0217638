//! JSON bodies exchanged with the backend.
//!
//! Shared by the server handlers and [`RemoteClient`](crate::remote::RemoteClient)
//! so both sides agree on the camelCase wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::settings::{Settings, SettingsPatch};
use crate::statistics::Statistics;

/// `POST /api/extension/register` body. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_info: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub installation_id: String,
}

/// `POST /api/extension/settings` body: an id plus any settings fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub installation_id: String,
    #[serde(flatten)]
    pub patch: SettingsPatch,
}

/// Settings as stored for one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub installation_id: String,
    #[serde(flatten)]
    pub settings: Settings,
    /// Absent when the defaults were returned for an unknown installation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

/// Counters for one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsResponse {
    pub installation_id: String,
    #[serde(flatten)]
    pub statistics: Statistics,
    /// Time of the last write; absent for defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
}

/// `POST /api/extension/statistics/update` body.
///
/// Deltas are signed on the wire so negative values can be rejected with a
/// message instead of a parse error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateStatisticsRequest {
    pub installation_id: String,
    pub blocked_delta: i64,
    pub hidden_delta: i64,
}

/// `POST /api/extension/statistics/reset` body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResetStatisticsRequest {
    pub installation_id: String,
}

/// One aggregate snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatsResponse {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub total_installations: u64,
    pub total_active: u64,
    pub total_shorts_blocked: u64,
    pub total_shorts_hidden: u64,
}

/// `GET /api/health` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body returned with every 4xx/5xx status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
