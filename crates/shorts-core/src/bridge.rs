//! Messaging bridge between the background process, UI and pages.
//!
//! Pages and UI surfaces send [`Message`]s to the [`Background`], which owns
//! the settings store and statistics counter and answers with a
//! [`Response`]. Settings changes are pushed to every open site tab as a
//! full [`Message::SettingsUpdated`] snapshot. Pushes are best-effort: a
//! failed send is logged and never retried.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::engine::SiteConfig;
use crate::error::{CoreError, Result};
use crate::platform::{MessagingCapability, PersistenceCapability, TabId, TabsCapability};
use crate::settings::{Settings, SettingsPatch};
use crate::statistics::{StatKind, Statistics};
use crate::store::{SettingsStore, StatisticsCounter};

fn default_count() -> u64 {
    1
}

/// Requests and pushes exchanged over the runtime messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Message {
    /// Page/UI asks for the current settings.
    GetSettings,
    /// Background pushes a full settings snapshot to a page.
    SettingsUpdated { settings: Settings },
    /// Page reports blocked or hidden items.
    TrackStatistic {
        stats_type: StatKind,
        shorts_id: Option<String>,
        #[serde(default = "default_count")]
        count: u64,
    },
    /// Page asks whether a Shorts id is exempt.
    CheckWhitelist { shorts_id: String },
    /// UI exempts a Shorts id.
    AddToWhitelist { shorts_id: String },
    /// UI removes an exemption.
    RemoveFromWhitelist { shorts_id: String },
    /// UI asks for the counters.
    GetStatistics,
    /// UI zeroes the counters.
    ResetStatistics,
}

impl Message {
    /// The wire `action` tag.
    pub fn action(&self) -> &'static str {
        match self {
            Message::GetSettings => "getSettings",
            Message::SettingsUpdated { .. } => "settingsUpdated",
            Message::TrackStatistic { .. } => "trackStatistic",
            Message::CheckWhitelist { .. } => "checkWhitelist",
            Message::AddToWhitelist { .. } => "addToWhitelist",
            Message::RemoveFromWhitelist { .. } => "removeFromWhitelist",
            Message::GetStatistics => "getStatistics",
            Message::ResetStatistics => "resetStatistics",
        }
    }
}

/// Replies to a [`Message`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Response {
    Settings(Settings),
    Statistics(Statistics),
    Whitelist { is_whitelisted: bool },
    Ack { success: bool },
}

impl Response {
    /// Extracts a settings reply.
    pub fn into_settings(self) -> Result<Settings> {
        match self {
            Response::Settings(s) => Ok(s),
            _ => Err(CoreError::UnexpectedResponse("getSettings")),
        }
    }

    /// Extracts a statistics reply.
    pub fn into_statistics(self) -> Result<Statistics> {
        match self {
            Response::Statistics(s) => Ok(s),
            _ => Err(CoreError::UnexpectedResponse("getStatistics")),
        }
    }

    /// Extracts a whitelist reply.
    pub fn into_whitelisted(self) -> Result<bool> {
        match self {
            Response::Whitelist { is_whitelisted } => Ok(is_whitelisted),
            _ => Err(CoreError::UnexpectedResponse("checkWhitelist")),
        }
    }
}

/// Toolbar badge state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: &'static str,
    pub color: &'static str,
}

impl Badge {
    pub const ON: Badge = Badge {
        text: "ON",
        color: "#FF0000",
    };
    pub const OFF: Badge = Badge {
        text: "OFF",
        color: "#AAAAAA",
    };

    /// Badge reflecting whether hide or block is on.
    pub fn for_settings(settings: &Settings) -> Self {
        if settings.is_active() {
            Self::ON
        } else {
            Self::OFF
        }
    }
}

/// The extension's background process.
pub struct Background<P, T> {
    settings: SettingsStore<P>,
    statistics: StatisticsCounter<P>,
    tabs: T,
    site: SiteConfig,
}

impl<P, T> Background<P, T>
where
    P: PersistenceCapability + Clone,
    T: TabsCapability,
{
    /// Creates a background over shared persistence and the tabs API.
    pub fn new(persistence: P, tabs: T) -> Self {
        Self::with_site(persistence, tabs, SiteConfig::default())
    }

    /// Creates a background for a specific site.
    pub fn with_site(persistence: P, tabs: T, site: SiteConfig) -> Self {
        Self {
            settings: SettingsStore::new(persistence.clone()),
            statistics: StatisticsCounter::new(persistence),
            tabs,
            site,
        }
    }

    /// The settings store.
    pub fn settings(&self) -> &SettingsStore<P> {
        &self.settings
    }

    /// The statistics counter.
    pub fn statistics(&self) -> &StatisticsCounter<P> {
        &self.statistics
    }

    /// The tabs capability.
    pub fn tabs(&self) -> &T {
        &self.tabs
    }

    /// First-run initialization: default settings and zeroed counters.
    pub fn on_installed(&self) -> Result<()> {
        self.settings.replace(&Settings::install_defaults())?;
        self.statistics.reset()?;
        self.refresh_badge();
        info!("Initialized with default settings");
        Ok(())
    }

    /// Handles a request from a page or UI surface.
    pub fn handle(&self, message: Message) -> Response {
        debug!(action = message.action(), "Handling message");

        match message {
            Message::GetSettings => Response::Settings(self.settings.get()),

            Message::SettingsUpdated { .. } => {
                // Pages receive this; the background has nothing to do
                Response::Ack { success: false }
            }

            Message::TrackStatistic {
                stats_type, count, ..
            } => {
                if !self.settings.get().use_statistics {
                    debug!("Statistics disabled, ignoring {}", stats_type.as_str());
                    return Response::Ack { success: true };
                }
                match self.statistics.record(stats_type, count) {
                    Ok(_) => Response::Ack { success: true },
                    Err(e) => {
                        warn!("Failed to record statistic: {}", e);
                        Response::Ack { success: false }
                    }
                }
            }

            Message::CheckWhitelist { shorts_id } => Response::Whitelist {
                is_whitelisted: self.settings.is_whitelisted(&shorts_id),
            },

            Message::AddToWhitelist { shorts_id } => {
                let success = match self.settings.whitelist_add(&shorts_id) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Failed to whitelist {}: {}", shorts_id, e);
                        false
                    }
                };
                Response::Ack { success }
            }

            Message::RemoveFromWhitelist { shorts_id } => {
                let success = match self.settings.whitelist_remove(&shorts_id) {
                    Ok(_) => true,
                    Err(e) => {
                        warn!("Failed to remove {} from whitelist: {}", shorts_id, e);
                        false
                    }
                };
                Response::Ack { success }
            }

            Message::GetStatistics => Response::Statistics(self.statistics.get()),

            Message::ResetStatistics => match self.statistics.reset() {
                Ok(_) => Response::Ack { success: true },
                Err(e) => {
                    warn!("Failed to reset statistics: {}", e);
                    Response::Ack { success: false }
                }
            },
        }
    }

    /// Persists a UI change and pushes the new snapshot to open site tabs.
    pub fn update_settings(&self, patch: SettingsPatch) -> Result<Settings> {
        let settings = self.settings.set(patch)?;
        self.refresh_badge();
        self.broadcast(&settings);
        Ok(settings)
    }

    /// Pushes `settings` to every tab on the site. Returns the number reached.
    pub fn broadcast(&self, settings: &Settings) -> usize {
        let tabs = match self.tabs.query(&self.site.tab_pattern()) {
            Ok(tabs) => tabs,
            Err(e) => {
                warn!("Failed to query tabs: {}", e);
                return 0;
            }
        };

        let message = Message::SettingsUpdated {
            settings: settings.clone(),
        };
        let mut delivered = 0;
        for tab in tabs {
            match self.tabs.send(tab, &message) {
                Ok(()) => delivered += 1,
                Err(e) => debug!(tab, "Settings push failed: {}", e),
            }
        }
        delivered
    }

    /// A tab finished loading; make sure its content script is current.
    pub fn on_tab_complete(&self, tab: TabId, url: &str) {
        if !self.site.matches_url(url) {
            return;
        }

        let settings = self.settings.get();
        if !settings.is_active() {
            return;
        }

        let message = Message::SettingsUpdated { settings };
        if let Err(e) = self.tabs.send(tab, &message) {
            debug!(tab, "Content script not ready ({}), injecting it", e);
            if let Err(e) = self.tabs.inject_content_script(tab) {
                warn!(tab, "Error injecting content script: {}", e);
            }
        }
    }

    /// Recomputes the toolbar badge from stored settings.
    pub fn refresh_badge(&self) -> Badge {
        let badge = Badge::for_settings(&self.settings.get());
        self.tabs.set_badge(&badge);
        badge
    }
}

impl<P, T> MessagingCapability for Background<P, T>
where
    P: PersistenceCapability + Clone,
    T: TabsCapability,
{
    fn send(&self, message: Message) -> Result<Response> {
        Ok(self.handle(message))
    }
}
