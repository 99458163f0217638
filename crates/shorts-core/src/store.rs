//! Settings and statistics persistence over browser storage.
//!
//! Settings live in the sync partition, one key per field, so a partially
//! written store still resolves through the normalizer. Statistics live in
//! the local partition under a single key.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::Result;
use crate::installation::{generate_installation_id, validate_installation_id};
use crate::platform::{PersistenceCapability, StorageArea};
use crate::settings::{Settings, SettingsPatch};
use crate::statistics::{StatKind, Statistics};

pub const HIDE_SHORTS_KEY: &str = "hideShorts";
pub const BLOCK_SHORTS_KEY: &str = "blockShorts";
pub const USE_STATISTICS_KEY: &str = "useStatistics";
pub const CUSTOM_FILTERS_KEY: &str = "customFilters";
pub const CATEGORY_FILTERS_KEY: &str = "categoryFilters";
pub const WHITELIST_KEY: &str = "whitelist";
pub const INSTALLATION_ID_KEY: &str = "installationId";
pub const STATISTICS_KEY: &str = "statistics";

/// Reads a typed value, treating malformed data as absent.
fn read_key<P, T>(persistence: &P, area: StorageArea, key: &str) -> Result<Option<T>>
where
    P: PersistenceCapability,
    T: DeserializeOwned,
{
    let Some(value) = persistence.get(area, key)? else {
        return Ok(None);
    };
    match serde_json::from_value(value) {
        Ok(v) => Ok(Some(v)),
        Err(e) => {
            debug!(key, area = area.as_str(), "Ignoring malformed stored value: {}", e);
            Ok(None)
        }
    }
}

/// User preferences backed by the sync partition.
#[derive(Debug, Clone)]
pub struct SettingsStore<P> {
    persistence: P,
}

impl<P: PersistenceCapability> SettingsStore<P> {
    /// Creates a store over `persistence`.
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    /// Returns the underlying persistence.
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Current settings, or the defaults if storage is unavailable.
    pub fn get(&self) -> Settings {
        match self.try_get() {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to read settings, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    /// Current settings, surfacing storage failures.
    pub fn try_get(&self) -> Result<Settings> {
        let p = &self.persistence;
        let area = StorageArea::Sync;
        let patch = SettingsPatch {
            hide_shorts: read_key(p, area, HIDE_SHORTS_KEY)?,
            block_shorts: read_key(p, area, BLOCK_SHORTS_KEY)?,
            use_statistics: read_key(p, area, USE_STATISTICS_KEY)?,
            custom_filters: read_key(p, area, CUSTOM_FILTERS_KEY)?,
            category_filters: read_key(p, area, CATEGORY_FILTERS_KEY)?,
            whitelist: read_key(p, area, WHITELIST_KEY)?,
        };
        Ok(patch.with_defaults())
    }

    /// Upserts the provided fields and returns the resulting settings.
    pub fn set(&self, patch: SettingsPatch) -> Result<Settings> {
        let mut settings = self.try_get()?;
        settings.apply(patch);
        self.replace(&settings)?;
        Ok(settings)
    }

    /// Overwrites every stored field with `settings`.
    pub fn replace(&self, settings: &Settings) -> Result<()> {
        let p = &self.persistence;
        let area = StorageArea::Sync;
        p.set(area, HIDE_SHORTS_KEY, Value::Bool(settings.hide_shorts))?;
        p.set(area, BLOCK_SHORTS_KEY, Value::Bool(settings.block_shorts))?;
        p.set(area, USE_STATISTICS_KEY, Value::Bool(settings.use_statistics))?;
        p.set(
            area,
            CUSTOM_FILTERS_KEY,
            serde_json::to_value(&settings.custom_filters)?,
        )?;
        p.set(
            area,
            CATEGORY_FILTERS_KEY,
            serde_json::to_value(&settings.category_filters)?,
        )?;
        p.set(area, WHITELIST_KEY, serde_json::to_value(&settings.whitelist)?)?;
        Ok(())
    }

    /// Returns true if `shorts_id` is whitelisted.
    pub fn is_whitelisted(&self, shorts_id: &str) -> bool {
        self.get().is_whitelisted(shorts_id)
    }

    /// Adds `shorts_id` to the whitelist. Returns false if already present.
    pub fn whitelist_add(&self, shorts_id: &str) -> Result<bool> {
        let mut settings = self.try_get()?;
        if !settings.whitelist_add(shorts_id) {
            return Ok(false);
        }
        self.persistence.set(
            StorageArea::Sync,
            WHITELIST_KEY,
            serde_json::to_value(&settings.whitelist)?,
        )?;
        Ok(true)
    }

    /// Removes `shorts_id` from the whitelist. Returns false if absent.
    pub fn whitelist_remove(&self, shorts_id: &str) -> Result<bool> {
        let mut settings = self.try_get()?;
        if !settings.whitelist_remove(shorts_id) {
            return Ok(false);
        }
        self.persistence.set(
            StorageArea::Sync,
            WHITELIST_KEY,
            serde_json::to_value(&settings.whitelist)?,
        )?;
        Ok(true)
    }

    /// Returns the installation id, generating and storing one on first use.
    pub fn installation_id(&self) -> Result<String> {
        let stored: Option<String> =
            read_key(&self.persistence, StorageArea::Sync, INSTALLATION_ID_KEY)?;
        if let Some(id) = stored {
            if validate_installation_id(&id).is_ok() {
                return Ok(id);
            }
            warn!("Stored installation id is malformed, generating a new one");
        }

        let id = generate_installation_id();
        self.persistence.set(
            StorageArea::Sync,
            INSTALLATION_ID_KEY,
            Value::String(id.clone()),
        )?;
        Ok(id)
    }

    /// Stores an installation id assigned by the backend.
    pub fn set_installation_id(&self, id: &str) -> Result<()> {
        validate_installation_id(id)?;
        self.persistence.set(
            StorageArea::Sync,
            INSTALLATION_ID_KEY,
            Value::String(id.to_string()),
        )
    }
}

/// Blocked/hidden counters backed by the local partition.
///
/// Updates are read-modify-write; concurrent writers from several tabs are
/// last-write-wins.
#[derive(Debug, Clone)]
pub struct StatisticsCounter<P> {
    persistence: P,
}

impl<P: PersistenceCapability> StatisticsCounter<P> {
    /// Creates a counter over `persistence`.
    pub fn new(persistence: P) -> Self {
        Self { persistence }
    }

    /// Current counters, or zeroes stamped now.
    pub fn get(&self) -> Statistics {
        match read_key(&self.persistence, StorageArea::Local, STATISTICS_KEY) {
            Ok(Some(stats)) => stats,
            Ok(None) => Statistics::default(),
            Err(e) => {
                warn!("Failed to read statistics, using defaults: {}", e);
                Statistics::default()
            }
        }
    }

    /// Adds the deltas and returns the new counters.
    pub fn update(&self, blocked_delta: u64, hidden_delta: u64) -> Result<Statistics> {
        let mut stats: Statistics =
            read_key(&self.persistence, StorageArea::Local, STATISTICS_KEY)?.unwrap_or_default();
        stats.add(blocked_delta, hidden_delta);
        self.write(&stats)?;
        Ok(stats)
    }

    /// Adds `count` to the counter for `kind`.
    pub fn record(&self, kind: StatKind, count: u64) -> Result<Statistics> {
        match kind {
            StatKind::Blocked => self.update(count, 0),
            StatKind::Hidden => self.update(0, count),
        }
    }

    /// Zeroes both counters and stamps the reset time.
    pub fn reset(&self) -> Result<Statistics> {
        let stats = Statistics::zeroed(Utc::now());
        self.write(&stats)?;
        Ok(stats)
    }

    fn write(&self, stats: &Statistics) -> Result<()> {
        self.persistence.set(
            StorageArea::Local,
            STATISTICS_KEY,
            serde_json::to_value(stats)?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryPersistence;
    use crate::settings::FilterRule;
    use serde_json::json;

    #[test]
    fn test_get_defaults_when_empty() {
        let store = SettingsStore::new(MemoryPersistence::new());
        assert_eq!(store.get(), Settings::default());
    }

    #[test]
    fn test_toggle_and_reload() {
        let persistence = MemoryPersistence::new();
        let store = SettingsStore::new(persistence.clone());

        let initial = store.get();
        assert!(initial.hide_shorts);
        assert!(!initial.block_shorts);

        store
            .set(SettingsPatch {
                hide_shorts: Some(false),
                ..Default::default()
            })
            .unwrap();

        // A fresh store over the same storage sees the change
        let reloaded = SettingsStore::new(persistence).get();
        assert!(!reloaded.hide_shorts);
        assert!(!reloaded.block_shorts);
    }

    #[test]
    fn test_set_keeps_unmentioned_fields() {
        let store = SettingsStore::new(MemoryPersistence::new());
        store
            .set(SettingsPatch {
                custom_filters: Some(vec![FilterRule::new("f", "clip")]),
                ..Default::default()
            })
            .unwrap();
        let settings = store
            .set(SettingsPatch {
                block_shorts: Some(true),
                ..Default::default()
            })
            .unwrap();

        assert!(settings.block_shorts);
        assert_eq!(settings.custom_filters.len(), 1);
    }

    #[test]
    fn test_unavailable_storage_falls_back() {
        let persistence = MemoryPersistence::new();
        let store = SettingsStore::new(persistence.clone());
        persistence.set_available(false);

        assert_eq!(store.get(), Settings::default());
        assert!(store.set(SettingsPatch::default()).is_err());
    }

    #[test]
    fn test_malformed_value_ignored() {
        let persistence = MemoryPersistence::new();
        persistence
            .set(StorageArea::Sync, HIDE_SHORTS_KEY, json!("not a bool"))
            .unwrap();
        persistence
            .set(StorageArea::Sync, BLOCK_SHORTS_KEY, json!(true))
            .unwrap();

        let settings = SettingsStore::new(persistence).get();
        assert!(settings.hide_shorts);
        assert!(settings.block_shorts);
    }

    #[test]
    fn test_whitelist_round() {
        let store = SettingsStore::new(MemoryPersistence::new());

        assert!(store.whitelist_add("abc123").unwrap());
        assert!(store.is_whitelisted("abc123"));
        assert!(!store.whitelist_add("abc123").unwrap());
        assert_eq!(store.get().whitelist, vec!["abc123"]);

        assert!(store.whitelist_remove("abc123").unwrap());
        assert!(!store.is_whitelisted("abc123"));
    }

    #[test]
    fn test_installation_id_is_stable() {
        let store = SettingsStore::new(MemoryPersistence::new());
        let first = store.installation_id().unwrap();
        let second = store.installation_id().unwrap();
        assert_eq!(first, second);

        store.set_installation_id("server-assigned").unwrap();
        assert_eq!(store.installation_id().unwrap(), "server-assigned");
        assert!(store.set_installation_id("").is_err());
    }

    #[test]
    fn test_statistics_update_twice() {
        let counter = StatisticsCounter::new(MemoryPersistence::new());
        for (b, h) in [(0u64, 0u64), (1, 0), (3, 7), (100, 42)] {
            let before = counter.get();
            counter.update(b, h).unwrap();
            let after = counter.update(b, h).unwrap();
            assert_eq!(after.shorts_blocked, before.shorts_blocked + 2 * b);
            assert_eq!(after.shorts_hidden, before.shorts_hidden + 2 * h);
        }
    }

    #[test]
    fn test_statistics_reset() {
        let counter = StatisticsCounter::new(MemoryPersistence::new());
        counter.update(5, 2).unwrap();
        let written_at = Utc::now();
        let reset = counter.reset().unwrap();

        assert_eq!(reset.shorts_blocked, 0);
        assert_eq!(reset.shorts_hidden, 0);
        assert!(reset.last_reset >= written_at);
        assert_eq!(counter.get(), reset);
    }

    #[test]
    fn test_statistics_live_in_local_area() {
        let persistence = MemoryPersistence::new();
        let counter = StatisticsCounter::new(persistence.clone());
        counter.record(StatKind::Hidden, 3).unwrap();

        assert_eq!(persistence.len(StorageArea::Local), 1);
        assert_eq!(persistence.len(StorageArea::Sync), 0);
        assert_eq!(counter.get().shorts_hidden, 3);
    }
}
