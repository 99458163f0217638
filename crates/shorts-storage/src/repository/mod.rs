//! Database repositories for each table.

pub mod aggregate;
pub mod installations;
pub mod settings;
pub mod statistics;

pub use aggregate::AggregateRepo;
pub use installations::InstallationsRepo;
pub use settings::SettingsRepo;
pub use statistics::StatisticsRepo;

use chrono::{DateTime, SecondsFormat, Utc};

/// Formats a timestamp for storage.
///
/// Fixed width and always UTC, so text comparison in SQL orders correctly.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
        })
        .unwrap_or_else(|_| Utc::now())
}

/// Counters are `INTEGER` columns; values beyond `i64::MAX` saturate.
pub(crate) fn to_sql_count(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub(crate) fn from_sql_count(n: i64) -> u64 {
    u64::try_from(n).unwrap_or(0)
}
