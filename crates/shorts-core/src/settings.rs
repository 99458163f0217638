//! User preferences.
//!
//! [`Settings`] is the one canonical configuration type. Every partial
//! source (stored keys, API bodies, UI toggles) arrives as a
//! [`SettingsPatch`] and goes through [`SettingsPatch::with_defaults`] or
//! [`Settings::apply`], which fill omitted fields and drop duplicate list
//! entries.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// A user-defined text pattern that dims matching content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRule {
    /// Stable identifier, unique within a settings object.
    pub id: String,
    /// Text matched against titles and labels.
    pub pattern: String,
    /// Disabled rules are kept but not applied.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl FilterRule {
    /// Creates an enabled rule.
    pub fn new(id: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pattern: pattern.into(),
            enabled: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Complete user preferences for one installation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// CSS-only suppression of Shorts shelves and items.
    pub hide_shorts: bool,
    /// Click interception and redirect away from Shorts pages.
    pub block_shorts: bool,
    /// Whether blocked/hidden counters are recorded.
    pub use_statistics: bool,
    /// Text-pattern rules layered on top of hide/block.
    pub custom_filters: Vec<FilterRule>,
    /// Category names whose videos are hidden.
    pub category_filters: Vec<String>,
    /// Shorts ids exempt from filtering.
    pub whitelist: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hide_shorts: true,
            block_shorts: false,
            use_statistics: true,
            custom_filters: Vec::new(),
            category_filters: Vec::new(),
            whitelist: Vec::new(),
        }
    }
}

impl Settings {
    /// Settings written on first install.
    pub fn install_defaults() -> Self {
        Self {
            custom_filters: vec![
                FilterRule::new("default-1", "Shorts shelf"),
                FilterRule::new("default-2", "Shorts feed"),
            ],
            ..Self::default()
        }
    }

    /// Returns true if either hide or block mode is on.
    pub fn is_active(&self) -> bool {
        self.hide_shorts || self.block_shorts
    }

    /// Overwrites the fields present in `patch`.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.hide_shorts {
            self.hide_shorts = v;
        }
        if let Some(v) = patch.block_shorts {
            self.block_shorts = v;
        }
        if let Some(v) = patch.use_statistics {
            self.use_statistics = v;
        }
        if let Some(v) = patch.custom_filters {
            self.custom_filters = v;
        }
        if let Some(v) = patch.category_filters {
            self.category_filters = v;
        }
        if let Some(v) = patch.whitelist {
            self.whitelist = v;
        }
        self.normalize();
    }

    /// Removes duplicate list entries, keeping the first occurrence.
    pub fn normalize(&mut self) {
        dedup_by_key(&mut self.custom_filters, |f| f.id.clone());
        dedup_by_key(&mut self.category_filters, |c| c.clone());
        dedup_by_key(&mut self.whitelist, |w| w.clone());
    }

    /// Enabled custom filters only.
    pub fn active_filters(&self) -> impl Iterator<Item = &FilterRule> {
        self.custom_filters.iter().filter(|f| f.enabled)
    }

    /// Returns true if `shorts_id` is exempt from filtering.
    pub fn is_whitelisted(&self, shorts_id: &str) -> bool {
        self.whitelist.iter().any(|id| id == shorts_id)
    }

    /// Adds `shorts_id` to the whitelist. Returns false if already present.
    pub fn whitelist_add(&mut self, shorts_id: &str) -> bool {
        if self.is_whitelisted(shorts_id) {
            return false;
        }
        self.whitelist.push(shorts_id.to_string());
        true
    }

    /// Removes `shorts_id` from the whitelist. Returns false if absent.
    pub fn whitelist_remove(&mut self, shorts_id: &str) -> bool {
        let before = self.whitelist.len();
        self.whitelist.retain(|id| id != shorts_id);
        self.whitelist.len() != before
    }
}

/// A partial settings update; `None` means "leave unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide_shorts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_shorts: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub use_statistics: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_filters: Option<Vec<FilterRule>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_filters: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<String>>,
}

impl SettingsPatch {
    /// Resolves the patch against the hardcoded defaults.
    pub fn with_defaults(self) -> Settings {
        let mut settings = Settings::default();
        settings.apply(self);
        settings
    }

    /// Returns true if no field is set.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<Settings> for SettingsPatch {
    fn from(s: Settings) -> Self {
        Self {
            hide_shorts: Some(s.hide_shorts),
            block_shorts: Some(s.block_shorts),
            use_statistics: Some(s.use_statistics),
            custom_filters: Some(s.custom_filters),
            category_filters: Some(s.category_filters),
            whitelist: Some(s.whitelist),
        }
    }
}

fn dedup_by_key<T, K, F>(items: &mut Vec<T>, key: F)
where
    K: Eq + std::hash::Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert(key(item)));
}
