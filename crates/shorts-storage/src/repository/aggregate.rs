//! Aggregate snapshot repository. Snapshots are append-only.

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, Row};

use super::{format_datetime, from_sql_count, parse_datetime, to_sql_count};
use super::{InstallationsRepo, StatisticsRepo};
use crate::error::Result;
use crate::models::{AggregateStats, AggregateTotals};

/// Installations seen within this window count as active.
pub const ACTIVE_WINDOW_DAYS: i64 = 7;

/// Repository for aggregate statistics.
pub struct AggregateRepo;

impl AggregateRepo {
    /// Compute totals from the installation and statistics tables.
    pub fn compute(conn: &Connection) -> Result<AggregateTotals> {
        let since = Utc::now() - Duration::days(ACTIVE_WINDOW_DAYS);
        let (blocked, hidden) = StatisticsRepo::totals(conn)?;

        Ok(AggregateTotals {
            total_installations: InstallationsRepo::count(conn)?,
            total_active: InstallationsRepo::count_active_since(conn, since)?,
            total_shorts_blocked: blocked,
            total_shorts_hidden: hidden,
        })
    }

    /// Append a snapshot.
    pub fn insert(conn: &Connection, totals: AggregateTotals) -> Result<AggregateStats> {
        let date_str = format_datetime(&Utc::now());

        conn.execute(
            "INSERT INTO aggregate_stats (date, total_installations, total_active,
                                          total_shorts_blocked, total_shorts_hidden)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                date_str,
                to_sql_count(totals.total_installations),
                to_sql_count(totals.total_active),
                to_sql_count(totals.total_shorts_blocked),
                to_sql_count(totals.total_shorts_hidden),
            ],
        )?;

        Ok(AggregateStats {
            id: conn.last_insert_rowid(),
            date: parse_datetime(&date_str),
            totals,
        })
    }

    /// The most recent snapshot.
    pub fn latest(conn: &Connection) -> Result<Option<AggregateStats>> {
        let mut stmt = conn.prepare(
            "SELECT id, date, total_installations, total_active, total_shorts_blocked, total_shorts_hidden
             FROM aggregate_stats ORDER BY date DESC, id DESC LIMIT 1",
        )?;

        let latest = stmt.query_row([], Self::from_row).ok();

        Ok(latest)
    }

    /// Recent snapshots, newest first.
    pub fn list(conn: &Connection, limit: i64) -> Result<Vec<AggregateStats>> {
        let mut stmt = conn.prepare(
            "SELECT id, date, total_installations, total_active, total_shorts_blocked, total_shorts_hidden
             FROM aggregate_stats ORDER BY date DESC, id DESC LIMIT ?1",
        )?;

        let snapshots = stmt
            .query_map([limit], Self::from_row)?
            .filter_map(|r| r.ok())
            .collect();

        Ok(snapshots)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<AggregateStats> {
        Ok(AggregateStats {
            id: row.get(0)?,
            date: parse_datetime(&row.get::<_, String>(1)?),
            totals: AggregateTotals {
                total_installations: from_sql_count(row.get(2)?),
                total_active: from_sql_count(row.get(3)?),
                total_shorts_blocked: from_sql_count(row.get(4)?),
                total_shorts_hidden: from_sql_count(row.get(5)?),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewInstallation;
    use crate::schema::run_migrations;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_compute_empty() {
        let conn = setup_db();
        assert_eq!(AggregateRepo::compute(&conn).unwrap(), AggregateTotals::default());
    }

    #[test]
    fn test_compute_counts_active_and_sums() {
        let conn = setup_db();
        InstallationsRepo::insert(&conn, &NewInstallation::new("a")).unwrap();
        InstallationsRepo::insert(&conn, &NewInstallation::new("b")).unwrap();
        conn.execute(
            "UPDATE installations SET last_active = ?1 WHERE installation_id = 'b'",
            [format_datetime(&(Utc::now() - Duration::days(8)))],
        )
        .unwrap();
        StatisticsRepo::update(&conn, "a", 4, 1).unwrap();
        StatisticsRepo::update(&conn, "b", 1, 2).unwrap();

        let totals = AggregateRepo::compute(&conn).unwrap();
        assert_eq!(totals.total_installations, 2);
        assert_eq!(totals.total_active, 1);
        assert_eq!(totals.total_shorts_blocked, 5);
        assert_eq!(totals.total_shorts_hidden, 3);
    }

    #[test]
    fn test_snapshots_append() {
        let conn = setup_db();
        assert!(AggregateRepo::latest(&conn).unwrap().is_none());

        let first = AggregateRepo::insert(&conn, AggregateTotals::default()).unwrap();
        let second = AggregateRepo::insert(
            &conn,
            AggregateTotals {
                total_installations: 1,
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(AggregateRepo::latest(&conn).unwrap(), Some(second.clone()));
        let all = AggregateRepo::list(&conn, 10).unwrap();
        assert_eq!(all, vec![second, first]);
    }
}
