//! Per-installation settings repository.

use chrono::Utc;
use rusqlite::{params, Connection};
use shorts_core::{Settings, SettingsPatch};

use super::{format_datetime, parse_datetime};
use crate::error::{Result, StorageError};
use crate::models::StoredSettings;

/// Repository for settings operations.
pub struct SettingsRepo;

impl SettingsRepo {
    /// Get the settings row for an installation.
    pub fn get(conn: &Connection, installation_id: &str) -> Result<Option<StoredSettings>> {
        let mut stmt = conn.prepare(
            "SELECT installation_id, hide_shorts, block_shorts, use_statistics,
                    custom_filters, category_filters, whitelist, last_updated
             FROM settings WHERE installation_id = ?1",
        )?;

        let stored = stmt
            .query_row([installation_id], |row| {
                let custom_filters: String = row.get(4)?;
                let category_filters: String = row.get(5)?;
                let whitelist: String = row.get(6)?;

                Ok(StoredSettings {
                    installation_id: row.get(0)?,
                    settings: Settings {
                        hide_shorts: row.get::<_, i32>(1)? != 0,
                        block_shorts: row.get::<_, i32>(2)? != 0,
                        use_statistics: row.get::<_, i32>(3)? != 0,
                        custom_filters: serde_json::from_str(&custom_filters).unwrap_or_default(),
                        category_filters: serde_json::from_str(&category_filters)
                            .unwrap_or_default(),
                        whitelist: serde_json::from_str(&whitelist).unwrap_or_default(),
                    },
                    last_updated: parse_datetime(&row.get::<_, String>(7)?),
                })
            })
            .ok();

        Ok(stored)
    }

    /// Insert or update settings.
    ///
    /// A new row starts from the defaults; an existing row keeps every field
    /// the patch omits. The installation must already be registered.
    pub fn upsert(
        conn: &Connection,
        installation_id: &str,
        patch: SettingsPatch,
    ) -> Result<StoredSettings> {
        let settings = match Self::get(conn, installation_id)? {
            Some(existing) => {
                let mut settings = existing.settings;
                settings.apply(patch);
                settings
            }
            None => patch.with_defaults(),
        };

        let last_updated_str = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO settings (installation_id, hide_shorts, block_shorts, use_statistics,
                                   custom_filters, category_filters, whitelist, last_updated)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (installation_id) DO UPDATE SET
                hide_shorts = excluded.hide_shorts,
                block_shorts = excluded.block_shorts,
                use_statistics = excluded.use_statistics,
                custom_filters = excluded.custom_filters,
                category_filters = excluded.category_filters,
                whitelist = excluded.whitelist,
                last_updated = excluded.last_updated",
            params![
                installation_id,
                settings.hide_shorts as i32,
                settings.block_shorts as i32,
                settings.use_statistics as i32,
                serde_json::to_string(&settings.custom_filters)?,
                serde_json::to_string(&settings.category_filters)?,
                serde_json::to_string(&settings.whitelist)?,
                last_updated_str,
            ],
        )
        .map_err(|e| StorageError::from_reference(e, installation_id))?;

        Ok(StoredSettings {
            installation_id: installation_id.to_string(),
            settings,
            last_updated: parse_datetime(&last_updated_str),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NewInstallation;
    use crate::repository::InstallationsRepo;
    use crate::schema::run_migrations;
    use shorts_core::FilterRule;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        InstallationsRepo::insert(&conn, &NewInstallation::new("inst")).unwrap();
        conn
    }

    #[test]
    fn test_get_missing() {
        let conn = setup_db();
        assert!(SettingsRepo::get(&conn, "inst").unwrap().is_none());
    }

    #[test]
    fn test_upsert_fills_defaults() {
        let conn = setup_db();

        let stored = SettingsRepo::upsert(
            &conn,
            "inst",
            SettingsPatch {
                block_shorts: Some(true),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(stored.settings.hide_shorts);
        assert!(stored.settings.block_shorts);
        assert!(stored.settings.use_statistics);
        assert_eq!(SettingsRepo::get(&conn, "inst").unwrap(), Some(stored));
    }

    #[test]
    fn test_upsert_keeps_omitted_fields() {
        let conn = setup_db();
        SettingsRepo::upsert(
            &conn,
            "inst",
            SettingsPatch {
                hide_shorts: Some(false),
                custom_filters: Some(vec![FilterRule::new("1", "clips")]),
                ..Default::default()
            },
        )
        .unwrap();

        let stored = SettingsRepo::upsert(
            &conn,
            "inst",
            SettingsPatch {
                whitelist: Some(vec!["a".into(), "a".into()]),
                ..Default::default()
            },
        )
        .unwrap();

        assert!(!stored.settings.hide_shorts);
        assert_eq!(stored.settings.custom_filters.len(), 1);
        assert_eq!(stored.settings.whitelist, vec!["a"]);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM settings", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unknown_installation_rejected() {
        let conn = setup_db();
        let result = SettingsRepo::upsert(&conn, "stranger", SettingsPatch::default());
        assert!(result.is_err());
    }

    #[test]
    fn test_cascade_delete() {
        let conn = setup_db();
        SettingsRepo::upsert(&conn, "inst", SettingsPatch::default()).unwrap();

        InstallationsRepo::delete(&conn, "inst").unwrap();
        assert!(SettingsRepo::get(&conn, "inst").unwrap().is_none());
    }
}
