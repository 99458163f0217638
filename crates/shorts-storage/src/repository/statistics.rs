//! Per-installation statistics repository.

use chrono::Utc;
use rusqlite::{params, Connection};
use shorts_core::Statistics;

use super::{format_datetime, from_sql_count, parse_datetime, to_sql_count};
use crate::error::{Result, StorageError};
use crate::models::StoredStatistics;

/// Repository for statistics operations.
pub struct StatisticsRepo;

impl StatisticsRepo {
    /// Get the statistics row for an installation.
    pub fn get(conn: &Connection, installation_id: &str) -> Result<Option<StoredStatistics>> {
        let mut stmt = conn.prepare(
            "SELECT installation_id, shorts_blocked, shorts_hidden, last_reset, date
             FROM statistics WHERE installation_id = ?1",
        )?;

        let stored = stmt
            .query_row([installation_id], |row| {
                Ok(StoredStatistics {
                    installation_id: row.get(0)?,
                    statistics: Statistics {
                        shorts_blocked: from_sql_count(row.get(1)?),
                        shorts_hidden: from_sql_count(row.get(2)?),
                        last_reset: parse_datetime(&row.get::<_, String>(3)?),
                    },
                    date: parse_datetime(&row.get::<_, String>(4)?),
                })
            })
            .ok();

        Ok(stored)
    }

    /// Add deltas to the counters, creating the row on first use.
    ///
    /// Read-modify-write: callers must hold the connection for the whole
    /// call to keep concurrent updates from interleaving.
    pub fn update(
        conn: &Connection,
        installation_id: &str,
        blocked_delta: u64,
        hidden_delta: u64,
    ) -> Result<StoredStatistics> {
        let mut statistics = match Self::get(conn, installation_id)? {
            Some(existing) => existing.statistics,
            None => Statistics::zeroed(parse_datetime(&format_datetime(&Utc::now()))),
        };
        statistics.add(blocked_delta, hidden_delta);

        Self::write(conn, installation_id, statistics)
    }

    /// Zero the counters and stamp the reset time.
    pub fn reset(conn: &Connection, installation_id: &str) -> Result<StoredStatistics> {
        let now = parse_datetime(&format_datetime(&Utc::now()));
        Self::write(conn, installation_id, Statistics::zeroed(now))
    }

    /// Sum of counters across all installations.
    pub fn totals(conn: &Connection) -> Result<(u64, u64)> {
        let (blocked, hidden): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(shorts_blocked), 0), COALESCE(SUM(shorts_hidden), 0)
             FROM statistics",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((from_sql_count(blocked), from_sql_count(hidden)))
    }

    fn write(
        conn: &Connection,
        installation_id: &str,
        statistics: Statistics,
    ) -> Result<StoredStatistics> {
        let date_str = format_datetime(&Utc::now());

        conn.execute(
            "INSERT INTO statistics (installation_id, date, shorts_blocked, shorts_hidden, last_reset)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (installation_id) DO UPDATE SET
                date = excluded.date,
                shorts_blocked = excluded.shorts_blocked,
                shorts_hidden = excluded.shorts_hidden,
                last_reset = excluded.last_reset",
            params![
                installation_id,
                date_str,
                to_sql_count(statistics.shorts_blocked),
                to_sql_count(statistics.shorts_hidden),
                format_datetime(&statistics.last_reset),
            ],
        )
        .map_err(|e| StorageError::from_reference(e, installation_id))?;

        Ok(StoredStatistics {
            installation_id: installation_id.to_string(),
            statistics,
            date: parse_datetime(&date_str),
        })
    }
}
