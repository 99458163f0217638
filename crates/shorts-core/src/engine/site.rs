//! Target site description.

use regex::Regex;
use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Where the content filter runs and where it redirects to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteConfig {
    /// Substring matched against the page hostname.
    pub host: String,
    /// Redirect target when a Shorts page is blocked.
    pub root_url: String,
    /// Path segment identifying Shorts pages and links.
    pub shorts_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            host: "youtube.com".to_string(),
            root_url: "https://www.youtube.com/".to_string(),
            shorts_path: "/shorts/".to_string(),
        }
    }
}

impl SiteConfig {
    /// Returns true if `url` is on the configured host.
    pub fn matches_url(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.contains(&self.host)))
            .unwrap_or(false)
    }

    /// Match pattern for the tabs query.
    pub fn tab_pattern(&self) -> String {
        format!("*://*.{}/*", self.host)
    }

    /// Returns true if the path of `url` is a Shorts page.
    pub fn is_shorts_page(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|u| u.path().contains(&self.shorts_path))
            .unwrap_or(false)
    }

    /// Compiled `/shorts/<id>` pattern with the id in group 1.
    pub fn shorts_id_pattern(&self) -> Regex {
        let pattern = format!("{}([^/?&#]+)", regex::escape(&self.shorts_path));
        Regex::new(&pattern).expect("escaped shorts path is a valid regex")
    }

    /// Extracts the Shorts id from `url`, if any.
    pub fn shorts_id_from_url(&self, url: &str) -> Option<String> {
        shorts_id(&self.shorts_id_pattern(), url)
    }
}

pub(crate) fn shorts_id(pattern: &Regex, url: &str) -> Option<String> {
    pattern
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
