//! Structural selectors and the style sheets built from them.

use serde::{Deserialize, Serialize};

use crate::settings::FilterRule;

/// Placeholder substituted with a category name in category templates.
const CATEGORY_PLACEHOLDER: &str = "{category}";

/// Selectors targeting Shorts renderings on the site.
///
/// The site markup drifts; the catalog is data so it can be replaced
/// without touching the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SelectorCatalog {
    pub sidebar_shorts: String,
    pub feed_shelf: String,
    pub feed_mini_shelf: String,
    pub grid_items: String,
    pub suggestions: String,
    pub search_results: String,
    /// Any link to a Shorts page.
    pub shorts_links: String,
    /// Video renderer whose title mentions `{category}`.
    pub video_category: String,
    /// Channel chip mentioning `{category}`.
    pub category_chip: String,
    /// Player containers masked while a redirect is pending.
    pub shorts_player: String,
}

impl Default for SelectorCatalog {
    fn default() -> Self {
        Self {
            sidebar_shorts: r#"ytd-guide-entry-renderer:has(a[title="Shorts"])"#.into(),
            feed_shelf: r#"ytd-rich-section-renderer:has(#title:has-text("Shorts"))"#.into(),
            feed_mini_shelf: "ytd-reel-shelf-renderer".into(),
            grid_items: r#"ytd-grid-video-renderer:has(a[href*="/shorts/"])"#.into(),
            suggestions: r#"ytd-compact-video-renderer:has(a[href*="/shorts/"])"#.into(),
            search_results: r#"ytd-video-renderer:has(a[href*="/shorts/"])"#.into(),
            shorts_links: r#"a[href*="/shorts/"]"#.into(),
            video_category: r#"ytd-video-renderer:has(#video-title:has-text("{category}"))"#
                .into(),
            category_chip: r#"#text.ytd-channel-name:contains("{category}")"#.into(),
            shorts_player: "ytd-shorts, ytd-reel-video-renderer, #shorts-container".into(),
        }
    }
}

impl SelectorCatalog {
    /// Base hide-mode style sheet.
    pub fn hide_css(&self) -> String {
        format!(
            "{sidebar} {{\n  display: none !important;\n}}\n\
             {shelf},\n{mini} {{\n  display: none !important;\n}}\n\
             {grid},\n{suggestions},\n{search} {{\n  display: none !important;\n}}\n",
            sidebar = self.sidebar_shorts,
            shelf = self.feed_shelf,
            mini = self.feed_mini_shelf,
            grid = self.grid_items,
            suggestions = self.suggestions,
            search = self.search_results,
        )
    }

    /// Masking style injected on a blocked Shorts page until the redirect.
    pub fn overlay_css(&self) -> String {
        format!(
            "{} {{\n  visibility: hidden !important;\n}}\n\
             body {{\n  background: #000 !important;\n}}\n",
            self.shorts_player
        )
    }

    /// Dim-and-label rules for `filters`. Empty if there are none.
    pub fn custom_filter_css<'a, I>(&self, filters: I) -> String
    where
        I: IntoIterator<Item = &'a FilterRule>,
    {
        let mut css = String::new();
        for filter in filters {
            let p = escape_css_string(&filter.pattern);
            let targets = format!(
                "[title*=\"{p}\"],\nspan:contains(\"{p}\"),\nyt-formatted-string:contains(\"{p}\")"
            );
            let labels = format!(
                "[title*=\"{p}\"]:before,\nspan:contains(\"{p}\"):before,\n\
                 yt-formatted-string:contains(\"{p}\"):before"
            );
            css.push_str(&format!(
                "{targets} {{\n  opacity: 0.3;\n  position: relative;\n}}\n\
                 {labels} {{\n  content: \"Filtered: {p}\";\n  position: absolute;\n  \
                 top: 0;\n  left: 0;\n  background: rgba(255, 0, 0, 0.7);\n  color: white;\n  \
                 padding: 2px 5px;\n  font-size: 10px;\n  z-index: 9999;\n}}\n"
            ));
        }
        css
    }

    /// Hiding rules for `categories`. Empty if there are none.
    pub fn category_css<S: AsRef<str>>(&self, categories: &[S]) -> String {
        let mut css = String::new();
        for category in categories {
            let name = escape_css_string(category.as_ref());
            css.push_str(&format!(
                "{},\n{} {{\n  display: none !important;\n}}\n",
                self.video_category.replace(CATEGORY_PLACEHOLDER, &name),
                self.category_chip.replace(CATEGORY_PLACEHOLDER, &name),
            ));
        }
        css
    }
}

/// Escapes `s` for use inside a double-quoted CSS string.
pub fn escape_css_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\a "),
            '\r' | '\0' => {}
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hide_css_covers_catalog() {
        let catalog = SelectorCatalog::default();
        let css = catalog.hide_css();
        assert!(css.contains("ytd-reel-shelf-renderer"));
        assert!(css.contains(&catalog.sidebar_shorts));
        assert!(css.contains(&catalog.search_results));
        assert_eq!(css.matches("display: none !important").count(), 3);
    }

    #[test]
    fn test_escape_css_string() {
        assert_eq!(escape_css_string(r#"a"b"#), r#"a\"b"#);
        assert_eq!(escape_css_string(r"a\b"), r"a\\b");
        assert_eq!(escape_css_string("plain"), "plain");
    }

    #[test]
    fn test_custom_filter_css_escapes_pattern() {
        let catalog = SelectorCatalog::default();
        let rules = [FilterRule::new("1", r#"say "hi""#)];
        let css = catalog.custom_filter_css(&rules);
        assert!(css.contains(r#"content: "Filtered: say \"hi\"";"#));
        assert!(css.contains("opacity: 0.3"));
    }

    #[test]
    fn test_empty_lists_produce_no_css() {
        let catalog = SelectorCatalog::default();
        assert!(catalog.custom_filter_css(&Vec::<FilterRule>::new()).is_empty());
        assert!(catalog.category_css::<String>(&[]).is_empty());
    }

    #[test]
    fn test_category_css() {
        let css = SelectorCatalog::default().category_css(&["Gaming"]);
        assert!(css.contains(r#"#video-title:has-text("Gaming")"#));
        assert!(css.contains(r#":contains("Gaming")"#));
        assert!(!css.contains(CATEGORY_PLACEHOLDER));
    }
}
