//! Per-page content filter.
//!
//! A [`ContentFilter`] lives as long as one page context. It owns every
//! effect it puts on the page (style elements, the click interceptor, the
//! mutation observers) and removes all of them in [`ContentFilter::stop`],
//! which also runs on drop.
//!
//! Two independent modes are driven by [`Settings`]:
//!
//! - **Hide**: a single style element built from the [`SelectorCatalog`].
//! - **Block**: a capturing click interceptor, a marker on every Shorts
//!   link, and a redirect away from Shorts pages.
//!
//! Custom and category filters are separate style elements layered on top.

mod selectors;
mod site;

#[cfg(test)]
pub(crate) mod fake_page;

pub use selectors::{escape_css_string, SelectorCatalog};
pub use site::SiteConfig;

use std::time::Duration;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::bridge::{Message, Response};
use crate::platform::{MessagingCapability, NodeId, ObserverKind, PageCapability};
use crate::settings::Settings;
use crate::statistics::StatKind;

/// Base hide-mode style element.
pub const HIDE_STYLE_ID: &str = "yt-shorts-blocker-style";
/// Custom filter style element.
pub const CUSTOM_FILTERS_STYLE_ID: &str = "yt-shorts-custom-filters-style";
/// Category filter style element.
pub const CATEGORY_FILTERS_STYLE_ID: &str = "yt-category-filters-style";
/// Masking style shown while redirecting away from a Shorts page.
pub const OVERLAY_STYLE_ID: &str = "yt-shorts-blocker-overlay";

/// Attribute set on every Shorts link handled by block mode.
pub const BLOCKED_MARKER: &str = "data-shorts-blocked";
/// Attribute the site sets on Shorts renderers.
pub const SHORTS_ATTRIBUTE: &str = "is-shorts";

/// How long the "blocked" notice stays on screen.
pub const NOTICE_DURATION: Duration = Duration::from_secs(3);
/// Delay between masking a Shorts page and leaving it.
pub const REDIRECT_DELAY: Duration = Duration::from_millis(50);

const NOTICE_TEXT: &str = "YouTube Shorts blocked";

/// Upper bound on the ancestor walk from a click target.
const MAX_ANCESTOR_DEPTH: usize = 64;

/// What the click interceptor should do with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickDecision {
    /// Call `preventDefault` and `stopPropagation`.
    Prevent,
    /// Let the click through.
    Allow,
}

#[derive(Debug, Default)]
struct FilterState {
    running: bool,
    last_url: String,
    settings: Option<Settings>,
    intercepting: bool,
    block_observer: bool,
    /// Shorts page already masked and scheduled for redirect.
    guarded_url: Option<String>,
}

/// Applies settings to one page.
pub struct ContentFilter<D: PageCapability, M: MessagingCapability> {
    page: D,
    bridge: M,
    site: SiteConfig,
    catalog: SelectorCatalog,
    shorts_id: Regex,
    state: FilterState,
}

impl<D: PageCapability, M: MessagingCapability> ContentFilter<D, M> {
    /// Creates a filter for the default site and selectors.
    pub fn new(page: D, bridge: M) -> Self {
        Self::with_config(page, bridge, SiteConfig::default(), SelectorCatalog::default())
    }

    /// Creates a filter with a custom site and selector catalog.
    pub fn with_config(page: D, bridge: M, site: SiteConfig, catalog: SelectorCatalog) -> Self {
        let shorts_id = site.shorts_id_pattern();
        Self {
            page,
            bridge,
            site,
            catalog,
            shorts_id,
            state: FilterState::default(),
        }
    }

    pub fn page(&self) -> &D {
        &self.page
    }

    /// Settings from the last apply, if any.
    pub fn settings(&self) -> Option<&Settings> {
        self.state.settings.as_ref()
    }

    pub fn is_running(&self) -> bool {
        self.state.running
    }

    /// Returns true while the click interceptor is installed.
    pub fn is_intercepting(&self) -> bool {
        self.state.intercepting
    }

    // === Lifecycle ===

    /// Connects the navigation observer and applies stored settings.
    ///
    /// Returns false, doing nothing, when the page is not on the site.
    pub fn start(&mut self) -> bool {
        if self.state.running {
            return true;
        }

        let url = self.page.location();
        if !self.site.matches_url(&url) {
            debug!(url = %url, "Not on target site, filter idle");
            return false;
        }

        self.page.observe(ObserverKind::Navigation);
        self.state.running = true;
        self.state.last_url = url;
        info!("Content filter started");

        self.refresh();
        true
    }

    /// Removes every effect this filter put on the page.
    pub fn stop(&mut self) {
        if !self.state.running {
            return;
        }

        self.page.disconnect(ObserverKind::Navigation);
        if self.state.block_observer {
            self.page.disconnect(ObserverKind::Block);
            self.state.block_observer = false;
        }
        if self.state.intercepting {
            self.page.remove_click_interceptor();
            self.state.intercepting = false;
        }
        self.remove_filter_styles();
        self.page.remove_element(OVERLAY_STYLE_ID);

        self.state.running = false;
        self.state.guarded_url = None;
        self.state.settings = None;
        info!("Content filter stopped");
    }

    // === Events ===

    /// Re-reads settings from the background and applies them.
    pub fn refresh(&mut self) {
        if !self.state.running {
            return;
        }

        let settings = match self
            .bridge
            .send(Message::GetSettings)
            .and_then(Response::into_settings)
        {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                Settings::default()
            }
        };
        self.apply(settings);
    }

    /// DOMContentLoaded.
    pub fn on_dom_ready(&mut self) {
        self.refresh();
    }

    /// The site's in-app navigation finished.
    pub fn on_navigate_finish(&mut self) {
        self.state.last_url = self.page.location();
        debug!(url = %self.state.last_url, "In-app navigation detected");
        self.refresh();
    }

    /// A pushed settings snapshot arrived.
    pub fn on_settings_updated(&mut self, settings: Settings) {
        self.apply(settings);
    }

    /// Routes a background push. Returns false for messages pages don't handle.
    pub fn on_message(&mut self, message: Message) -> bool {
        match message {
            Message::SettingsUpdated { settings } => {
                self.on_settings_updated(settings);
                true
            }
            other => {
                debug!(action = other.action(), "Ignoring message");
                false
            }
        }
    }

    /// A mutation observer fired with `added_nodes` inserted nodes.
    pub fn on_mutation(&mut self, kind: ObserverKind, added_nodes: usize) {
        if !self.state.running {
            return;
        }

        match kind {
            ObserverKind::Navigation => {
                let url = self.page.location();
                if url != self.state.last_url {
                    debug!(url = %url, "URL changed");
                    self.state.last_url = url;
                    self.refresh();
                }
            }
            ObserverKind::Block => {
                if added_nodes > 0 && self.state.intercepting {
                    let marked = self.mark_links();
                    if marked > 0 {
                        debug!(marked, "Marked new Shorts links");
                    }
                }
            }
        }
    }

    /// Decides whether a click on `target` is let through.
    pub fn handle_click(&mut self, target: NodeId) -> ClickDecision {
        if !self.state.intercepting {
            return ClickDecision::Allow;
        }

        let Some(node) = self.find_shorts_ancestor(target) else {
            return ClickDecision::Allow;
        };

        let shorts_id = self
            .page
            .attribute(node, "href")
            .and_then(|href| site::shorts_id(&self.shorts_id, &href));
        if let Some(id) = &shorts_id {
            if self.is_whitelisted(id) {
                debug!(shorts_id = %id, "Whitelisted, allowing click");
                return ClickDecision::Allow;
            }
        }

        self.page.show_notice(NOTICE_TEXT, NOTICE_DURATION);
        self.track(StatKind::Blocked, shorts_id, 1);
        debug!("Prevented navigation to Shorts");
        ClickDecision::Prevent
    }

    // === Apply ===

    /// Applies `settings` to the page.
    pub fn apply(&mut self, settings: Settings) {
        if !self.state.running {
            debug!("Filter not running, ignoring settings");
            return;
        }

        let url = self.page.location();
        let shorts_id = site::shorts_id(&self.shorts_id, &url);
        if let Some(id) = &shorts_id {
            if self.is_whitelisted(id) {
                debug!(shorts_id = %id, "Whitelisted, not filtering");
                self.state.settings = Some(settings);
                return;
            }
        }

        self.apply_hide(&settings);
        self.apply_block(settings.block_shorts);
        self.apply_custom_filters(&settings);
        self.apply_category_filters(&settings);

        if settings.block_shorts && self.site.is_shorts_page(&url) {
            self.guard_url(url, shorts_id);
        }

        self.state.settings = Some(settings);
    }

    fn apply_hide(&mut self, settings: &Settings) {
        if !settings.hide_shorts {
            self.remove_filter_styles();
            return;
        }

        if self.page.has_element(HIDE_STYLE_ID) {
            return;
        }
        if let Err(e) = self.page.insert_style(HIDE_STYLE_ID, &self.catalog.hide_css()) {
            warn!("Failed to inject hide style: {}", e);
            return;
        }

        let hidden = self.page.query_all(&self.catalog.shorts_links).len() as u64;
        debug!(hidden, "Hide style injected");
        if hidden > 0 {
            self.track(StatKind::Hidden, None, hidden);
        }
    }

    fn apply_block(&mut self, enabled: bool) {
        if enabled {
            if !self.state.intercepting {
                self.page.install_click_interceptor();
                self.state.intercepting = true;
            }
            self.mark_links();
            if !self.state.block_observer {
                self.page.observe(ObserverKind::Block);
                self.state.block_observer = true;
            }
            return;
        }

        let restored = self.unmark_links();
        if restored > 0 {
            debug!(restored, "Restored blocked links");
        }
        if self.state.intercepting {
            self.page.remove_click_interceptor();
            self.state.intercepting = false;
        }
        if self.state.block_observer {
            self.page.disconnect(ObserverKind::Block);
            self.state.block_observer = false;
        }
    }

    fn apply_custom_filters(&mut self, settings: &Settings) {
        let css = self.catalog.custom_filter_css(settings.active_filters());
        self.replace_style(CUSTOM_FILTERS_STYLE_ID, &css);
    }

    fn apply_category_filters(&mut self, settings: &Settings) {
        let css = self.catalog.category_css(&settings.category_filters);
        self.replace_style(CATEGORY_FILTERS_STYLE_ID, &css);
    }

    fn guard_url(&mut self, url: String, shorts_id: Option<String>) {
        if self.state.guarded_url.as_deref() == Some(url.as_str()) {
            debug!(url = %url, "Redirect already scheduled");
            return;
        }
        self.state.guarded_url = Some(url);

        if !self.page.has_element(OVERLAY_STYLE_ID) {
            if let Err(e) = self
                .page
                .insert_style(OVERLAY_STYLE_ID, &self.catalog.overlay_css())
            {
                warn!("Failed to inject overlay: {}", e);
            }
        }
        self.track(StatKind::Blocked, shorts_id, 1);
        info!("Redirecting away from Shorts page");
        self.page.navigate(&self.site.root_url, REDIRECT_DELAY);
    }

    // === Helpers ===

    fn replace_style(&self, id: &str, css: &str) {
        self.page.remove_element(id);
        if css.is_empty() {
            return;
        }
        if let Err(e) = self.page.insert_style(id, css) {
            warn!(style = id, "Failed to inject style: {}", e);
        }
    }

    fn remove_filter_styles(&self) {
        for id in [HIDE_STYLE_ID, CUSTOM_FILTERS_STYLE_ID, CATEGORY_FILTERS_STYLE_ID] {
            self.page.remove_element(id);
        }
    }

    fn mark_links(&self) -> usize {
        let mut marked = 0;
        for node in self.page.query_all(&self.catalog.shorts_links) {
            if self.page.attribute(node, BLOCKED_MARKER).is_none() {
                self.page.set_attribute(node, BLOCKED_MARKER, "true");
                marked += 1;
            }
        }
        marked
    }

    fn unmark_links(&self) -> usize {
        let selector = format!("[{}=\"true\"]", BLOCKED_MARKER);
        self.page
            .query_all(&selector)
            .into_iter()
            .filter_map(|node| self.page.replace_with_clone(node, BLOCKED_MARKER))
            .count()
    }

    fn find_shorts_ancestor(&self, target: NodeId) -> Option<NodeId> {
        let mut current = Some(target);
        for _ in 0..MAX_ANCESTOR_DEPTH {
            let node = current?;
            if self.is_shorts_node(node) {
                return Some(node);
            }
            current = self.page.parent(node);
        }
        None
    }

    fn is_shorts_node(&self, node: NodeId) -> bool {
        if self.page.attribute(node, BLOCKED_MARKER).as_deref() == Some("true")
            || self.page.attribute(node, SHORTS_ATTRIBUTE).is_some()
        {
            return true;
        }
        self.page.tag_name(node).as_deref() == Some("a")
            && self
                .page
                .attribute(node, "href")
                .is_some_and(|href| href.contains(&self.site.shorts_path))
    }

    fn is_whitelisted(&self, shorts_id: &str) -> bool {
        match self
            .bridge
            .send(Message::CheckWhitelist {
                shorts_id: shorts_id.to_string(),
            })
            .and_then(Response::into_whitelisted)
        {
            Ok(whitelisted) => whitelisted,
            Err(e) => {
                debug!("Whitelist check failed, treating as not whitelisted: {}", e);
                false
            }
        }
    }

    fn track(&self, kind: StatKind, shorts_id: Option<String>, count: u64) {
        let message = Message::TrackStatistic {
            stats_type: kind,
            shorts_id,
            count,
        };
        if let Err(e) = self.bridge.send(message) {
            debug!("Failed to track {} statistic: {}", kind.as_str(), e);
        }
    }
}

impl<D: PageCapability, M: MessagingCapability> Drop for ContentFilter<D, M> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::fake_page::FakePage;
    use super::*;
    use crate::bridge::tests::RecordingTabs;
    use crate::bridge::Background;
    use crate::error::{CoreError, Result};
    use crate::platform::MemoryPersistence;
    use crate::settings::{FilterRule, SettingsPatch};

    type TestBackground = Background<MemoryPersistence, RecordingTabs>;

    const HOME: &str = "https://www.youtube.com/";

    fn background() -> TestBackground {
        Background::new(MemoryPersistence::new(), RecordingTabs::default())
    }

    fn set(bg: &TestBackground, patch: SettingsPatch) {
        bg.settings().set(patch).unwrap();
    }

    fn block_on() -> SettingsPatch {
        SettingsPatch {
            block_shorts: Some(true),
            ..Default::default()
        }
    }

    struct DeadBridge;

    impl MessagingCapability for DeadBridge {
        fn send(&self, _message: Message) -> Result<Response> {
            Err(CoreError::Messaging("extension context invalidated".into()))
        }
    }

    #[test]
    fn test_idle_off_site() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at("https://example.com/"), &bg);

        assert!(!filter.start());
        assert!(!filter.is_running());
        assert!(filter.page().observers.borrow().is_empty());
        assert!(filter.page().styles.borrow().is_empty());
    }

    #[test]
    fn test_hide_enable_is_idempotent() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);

        assert!(filter.start());
        filter.refresh();
        filter.on_dom_ready();

        assert_eq!(filter.page().style_count(HIDE_STYLE_ID), 1);
        let css = filter.page().style(HIDE_STYLE_ID).unwrap();
        assert!(css.contains("ytd-reel-shelf-renderer"));
        assert!(filter.page().observing(ObserverKind::Navigation));
    }

    #[test]
    fn test_hidden_statistic_counts_links_on_injection() {
        let bg = background();
        let page = FakePage::at(HOME);
        page.add_shorts_link("a");
        page.add_shorts_link("b");
        page.add("a", &[("href", "/watch?v=1")], None);

        let mut filter = ContentFilter::new(page, &bg);
        filter.start();
        filter.refresh();

        assert_eq!(bg.statistics().get().shorts_hidden, 2);
    }

    #[test]
    fn test_disabling_hide_removes_styles() {
        let bg = background();
        set(
            &bg,
            SettingsPatch {
                category_filters: Some(vec!["Gaming".into()]),
                ..Default::default()
            },
        );
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();
        assert_eq!(filter.page().style_count(CATEGORY_FILTERS_STYLE_ID), 1);

        filter.on_settings_updated(Settings {
            hide_shorts: false,
            ..Settings::default()
        });

        assert_eq!(filter.page().style_count(HIDE_STYLE_ID), 0);
        assert_eq!(filter.page().style_count(CATEGORY_FILTERS_STYLE_ID), 0);
    }

    #[test]
    fn test_block_mode_prevents_then_allows_after_disable() {
        let bg = background();
        set(&bg, block_on());

        let page = FakePage::at(HOME);
        let (link, label) = page.add_shorts_link("abc");
        let mut filter = ContentFilter::new(page, &bg);
        filter.start();

        assert!(filter.page().intercepting.get());
        assert_eq!(
            filter.page().attribute(link, BLOCKED_MARKER).as_deref(),
            Some("true")
        );
        assert_eq!(filter.handle_click(label), ClickDecision::Prevent);
        assert_eq!(filter.page().notices.borrow()[0].1, NOTICE_DURATION);
        assert_eq!(bg.statistics().get().shorts_blocked, 1);

        filter.on_settings_updated(Settings::default());

        assert!(!filter.is_intercepting());
        assert!(!filter.page().intercepting.get());
        assert!(!filter.page().observing(ObserverKind::Block));
        assert!(filter
            .page()
            .query_all(&format!("[{}=\"true\"]", BLOCKED_MARKER))
            .is_empty());
        assert_eq!(filter.handle_click(label), ClickDecision::Allow);
        assert_eq!(bg.statistics().get().shorts_blocked, 1);
    }

    #[test]
    fn test_click_outside_shorts_allowed() {
        let bg = background();
        set(&bg, block_on());
        let page = FakePage::at(HOME);
        let video = page.add("a", &[("href", "/watch?v=1")], None);
        let mut filter = ContentFilter::new(page, &bg);
        filter.start();

        assert_eq!(filter.handle_click(video), ClickDecision::Allow);
    }

    #[test]
    fn test_shorts_attribute_is_blocked() {
        let bg = background();
        set(&bg, block_on());
        let page = FakePage::at(HOME);
        let renderer = page.add("ytd-reel-item-renderer", &[(SHORTS_ATTRIBUTE, "")], None);
        let thumb = page.add("img", &[], Some(renderer));
        let mut filter = ContentFilter::new(page, &bg);
        filter.start();

        assert_eq!(filter.handle_click(thumb), ClickDecision::Prevent);
    }

    #[test]
    fn test_whitelisted_link_click_allowed() {
        let bg = background();
        set(&bg, block_on());
        bg.settings().whitelist_add("keep").unwrap();

        let page = FakePage::at(HOME);
        let (_, label) = page.add_shorts_link("keep");
        let mut filter = ContentFilter::new(page, &bg);
        filter.start();

        assert_eq!(filter.handle_click(label), ClickDecision::Allow);
    }

    #[test]
    fn test_block_observer_marks_new_links() {
        let bg = background();
        set(&bg, block_on());
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();
        assert!(filter.page().observing(ObserverKind::Block));

        let (link, _) = filter.page().add_shorts_link("late");
        filter.on_mutation(ObserverKind::Block, 0);
        assert_eq!(filter.page().attribute(link, BLOCKED_MARKER), None);

        filter.on_mutation(ObserverKind::Block, 3);
        assert_eq!(
            filter.page().attribute(link, BLOCKED_MARKER).as_deref(),
            Some("true")
        );
    }

    #[test]
    fn test_url_guard_redirects_from_shorts_page() {
        let bg = background();
        set(&bg, block_on());
        let mut filter =
            ContentFilter::new(FakePage::at("https://www.youtube.com/shorts/abc123"), &bg);
        filter.start();

        assert_eq!(filter.page().style_count(OVERLAY_STYLE_ID), 1);
        assert_eq!(
            *filter.page().navigations.borrow(),
            vec![(HOME.to_string(), REDIRECT_DELAY)]
        );
        assert_eq!(bg.statistics().get().shorts_blocked, 1);
    }

    #[test]
    fn test_url_guard_runs_once_per_page() {
        let bg = background();
        set(&bg, block_on());
        let mut filter =
            ContentFilter::new(FakePage::at("https://www.youtube.com/shorts/abc"), &bg);
        filter.start();
        filter.on_dom_ready();
        filter.refresh();

        assert_eq!(filter.page().navigations.borrow().len(), 1);
        assert_eq!(filter.page().style_count(OVERLAY_STYLE_ID), 1);
        assert_eq!(bg.statistics().get().shorts_blocked, 1);

        filter.page().set_url("https://www.youtube.com/shorts/def");
        filter.on_mutation(ObserverKind::Navigation, 1);

        assert_eq!(filter.page().navigations.borrow().len(), 2);
        assert_eq!(bg.statistics().get().shorts_blocked, 2);
    }

    #[test]
    fn test_url_guard_skips_whitelisted_page() {
        let bg = background();
        set(&bg, block_on());
        bg.settings().whitelist_add("abc123").unwrap();
        let mut filter =
            ContentFilter::new(FakePage::at("https://www.youtube.com/shorts/abc123"), &bg);
        filter.start();

        assert!(filter.page().navigations.borrow().is_empty());
        assert!(filter.page().styles.borrow().is_empty());
        assert!(filter.settings().is_some());
    }

    #[test]
    fn test_url_guard_needs_block_mode() {
        let bg = background();
        let mut filter =
            ContentFilter::new(FakePage::at("https://www.youtube.com/shorts/abc123"), &bg);
        filter.start();

        assert!(filter.page().navigations.borrow().is_empty());
        assert_eq!(filter.page().style_count(HIDE_STYLE_ID), 1);
    }

    #[test]
    fn test_custom_filters_replaced_not_stacked() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();

        let mut disabled = FilterRule::new("3", "hidden rule");
        disabled.enabled = false;
        filter.on_settings_updated(Settings {
            custom_filters: vec![FilterRule::new("1", "first"), disabled],
            ..Settings::default()
        });
        filter.on_settings_updated(Settings {
            custom_filters: vec![FilterRule::new("2", "second")],
            ..Settings::default()
        });

        assert_eq!(filter.page().style_count(CUSTOM_FILTERS_STYLE_ID), 1);
        let css = filter.page().style(CUSTOM_FILTERS_STYLE_ID).unwrap();
        assert!(css.contains("Filtered: second"));
        assert!(!css.contains("first"));

        filter.on_settings_updated(Settings::default());
        assert_eq!(filter.page().style_count(CUSTOM_FILTERS_STYLE_ID), 0);
    }

    #[test]
    fn test_disabled_filters_not_applied() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();

        let mut rule = FilterRule::new("1", "off");
        rule.enabled = false;
        filter.on_settings_updated(Settings {
            custom_filters: vec![rule],
            ..Settings::default()
        });
        assert_eq!(filter.page().style_count(CUSTOM_FILTERS_STYLE_ID), 0);
    }

    #[test]
    fn test_navigation_observer_reapplies_on_url_change() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();

        set(&bg, block_on());
        filter.on_mutation(ObserverKind::Navigation, 1);
        assert!(!filter.is_intercepting());

        filter.page().set_url("https://www.youtube.com/feed/subscriptions");
        filter.on_mutation(ObserverKind::Navigation, 1);
        assert!(filter.is_intercepting());
    }

    #[test]
    fn test_settings_pushed_via_message() {
        let bg = background();
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();

        let handled = filter.on_message(Message::SettingsUpdated {
            settings: Settings {
                hide_shorts: false,
                block_shorts: true,
                ..Settings::default()
            },
        });
        assert!(handled);
        assert!(filter.is_intercepting());
        assert!(!filter.on_message(Message::GetStatistics));
    }

    #[test]
    fn test_bridge_failure_uses_defaults() {
        let mut filter = ContentFilter::new(FakePage::at(HOME), DeadBridge);
        filter.start();

        assert_eq!(filter.settings(), Some(&Settings::default()));
        assert_eq!(filter.page().style_count(HIDE_STYLE_ID), 1);
    }

    #[test]
    fn test_stop_tears_down_everything() {
        let bg = background();
        set(
            &bg,
            SettingsPatch {
                block_shorts: Some(true),
                custom_filters: Some(vec![FilterRule::new("1", "x")]),
                ..Default::default()
            },
        );
        let mut filter = ContentFilter::new(FakePage::at(HOME), &bg);
        filter.start();
        assert!(filter.page().styles.borrow().len() >= 2);

        filter.stop();

        assert!(!filter.is_running());
        assert!(!filter.page().intercepting.get());
        assert!(filter.page().observers.borrow().is_empty());
        assert!(filter.page().styles.borrow().is_empty());

        filter.refresh();
        assert!(filter.page().styles.borrow().is_empty());
    }
}
