//! Installations repository.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use super::{format_datetime, parse_datetime};
use crate::error::Result;
use crate::models::{Installation, NewInstallation};

const COLUMNS: &str =
    "id, installation_id, first_installed, last_active, version, browser_info";

/// Repository for installation operations.
pub struct InstallationsRepo;

impl InstallationsRepo {
    /// Insert a new installation. Fails if the id is already registered.
    pub fn insert(conn: &Connection, new: &NewInstallation) -> Result<Installation> {
        let now_str = format_datetime(&Utc::now());
        let now = parse_datetime(&now_str);

        conn.execute(
            "INSERT INTO installations (installation_id, first_installed, last_active, version, browser_info)
             VALUES (?1, ?2, ?2, ?3, ?4)",
            params![new.installation_id, now_str, new.version, new.browser_info],
        )?;

        Ok(Installation {
            id: conn.last_insert_rowid(),
            installation_id: new.installation_id.clone(),
            first_installed: now,
            last_active: now,
            version: new.version.clone(),
            browser_info: new.browser_info.clone(),
        })
    }

    /// Get an installation by its client identifier.
    pub fn get(conn: &Connection, installation_id: &str) -> Result<Option<Installation>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM installations WHERE installation_id = ?1",
            COLUMNS
        ))?;

        let installation = stmt.query_row([installation_id], Self::from_row).ok();

        Ok(installation)
    }

    /// Refresh the last-active timestamp. Returns false if not registered.
    pub fn touch(conn: &Connection, installation_id: &str) -> Result<bool> {
        let rows = conn.execute(
            "UPDATE installations SET last_active = ?1 WHERE installation_id = ?2",
            params![format_datetime(&Utc::now()), installation_id],
        )?;
        Ok(rows > 0)
    }

    /// Delete an installation and, by cascade, its settings and statistics.
    pub fn delete(conn: &Connection, installation_id: &str) -> Result<bool> {
        let rows = conn.execute(
            "DELETE FROM installations WHERE installation_id = ?1",
            [installation_id],
        )?;
        Ok(rows > 0)
    }

    /// Total registered installations.
    pub fn count(conn: &Connection) -> Result<u64> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM installations", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Installations whose last activity is after `since`.
    pub fn count_active_since(conn: &Connection, since: DateTime<Utc>) -> Result<u64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM installations WHERE last_active > ?1",
            [format_datetime(&since)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Installation> {
        Ok(Installation {
            id: row.get(0)?,
            installation_id: row.get(1)?,
            first_installed: parse_datetime(&row.get::<_, String>(2)?),
            last_active: parse_datetime(&row.get::<_, String>(3)?),
            version: row.get(4)?,
            browser_info: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::run_migrations;
    use chrono::Duration;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_insert_and_get() {
        let conn = setup_db();

        let new = NewInstallation {
            installation_id: "install-1".to_string(),
            version: "1.2.0".to_string(),
            browser_info: "Firefox".to_string(),
        };
        let created = InstallationsRepo::insert(&conn, &new).unwrap();
        assert!(created.id > 0);

        let fetched = InstallationsRepo::get(&conn, "install-1").unwrap().unwrap();
        assert_eq!(fetched.version, "1.2.0");
        assert_eq!(fetched.browser_info, "Firefox");
        assert_eq!(fetched.first_installed, fetched.last_active);
    }

    #[test]
    fn test_get_missing() {
        let conn = setup_db();
        assert!(InstallationsRepo::get(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let conn = setup_db();
        let new = NewInstallation::new("dup");

        InstallationsRepo::insert(&conn, &new).unwrap();
        assert!(InstallationsRepo::insert(&conn, &new).is_err());
        assert_eq!(InstallationsRepo::count(&conn).unwrap(), 1);
    }

    #[test]
    fn test_touch() {
        let conn = setup_db();
        let created = InstallationsRepo::insert(&conn, &NewInstallation::new("t")).unwrap();

        assert!(InstallationsRepo::touch(&conn, "t").unwrap());
        assert!(!InstallationsRepo::touch(&conn, "missing").unwrap());

        let fetched = InstallationsRepo::get(&conn, "t").unwrap().unwrap();
        assert!(fetched.last_active >= created.last_active);
        assert_eq!(fetched.first_installed, created.first_installed);
    }

    #[test]
    fn test_count_active_since() {
        let conn = setup_db();
        InstallationsRepo::insert(&conn, &NewInstallation::new("recent")).unwrap();
        InstallationsRepo::insert(&conn, &NewInstallation::new("stale")).unwrap();
        conn.execute(
            "UPDATE installations SET last_active = ?1 WHERE installation_id = 'stale'",
            [format_datetime(&(Utc::now() - Duration::days(30)))],
        )
        .unwrap();

        let week_ago = Utc::now() - Duration::days(7);
        assert_eq!(InstallationsRepo::count(&conn).unwrap(), 2);
        assert_eq!(
            InstallationsRepo::count_active_since(&conn, week_ago).unwrap(),
            1
        );
    }

    #[test]
    fn test_delete() {
        let conn = setup_db();
        InstallationsRepo::insert(&conn, &NewInstallation::new("gone")).unwrap();

        assert!(InstallationsRepo::delete(&conn, "gone").unwrap());
        assert!(!InstallationsRepo::delete(&conn, "gone").unwrap());
    }
}
