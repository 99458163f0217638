//! Blocked/hidden counters kept on the client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which counter an event increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    /// A click or direct visit was intercepted.
    Blocked,
    /// Items were suppressed by the hiding style.
    Hidden,
}

impl StatKind {
    /// Returns the kind as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Blocked => "blocked",
            StatKind::Hidden => "hidden",
        }
    }
}

/// Client-side usage counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub shorts_blocked: u64,
    pub shorts_hidden: u64,
    pub last_reset: DateTime<Utc>,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::zeroed(Utc::now())
    }
}

impl Statistics {
    /// Zero counters stamped with `at`.
    pub fn zeroed(at: DateTime<Utc>) -> Self {
        Self {
            shorts_blocked: 0,
            shorts_hidden: 0,
            last_reset: at,
        }
    }

    /// Adds the deltas. Counters saturate instead of wrapping.
    pub fn add(&mut self, blocked: u64, hidden: u64) {
        self.shorts_blocked = self.shorts_blocked.saturating_add(blocked);
        self.shorts_hidden = self.shorts_hidden.saturating_add(hidden);
    }

    /// Adds `count` to the counter for `kind`.
    pub fn record(&mut self, kind: StatKind, count: u64) {
        match kind {
            StatKind::Blocked => self.add(count, 0),
            StatKind::Hidden => self.add(0, count),
        }
    }
}
