//! Response composition: display string to line-oriented text.

use ussd_core::{Config, Result};
use ussd_session::SessionStore;

/// Static rendering rules taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Separator between items of a display string
    pub separator: String,
    /// Maximum characters per line
    pub chars_per_line: Option<usize>,
    /// Labels `(next, back)` of the synthetic items, `None` when navigation
    /// is disabled
    pub nav_labels: Option<(String, String)>,
}

impl Layout {
    pub fn from_config(config: &Config) -> Self {
        let nav = &config.navigation;
        Self {
            separator: config.output.menu_items_separator.clone(),
            chars_per_line: config.output.chars_per_line,
            nav_labels: nav.enabled.then(|| (nav.next_label(), nav.back_label())),
        }
    }

    /// Label of the Back item, if navigation is enabled.
    pub fn back_label(&self) -> Option<&str> {
        self.nav_labels.as_ref().map(|(_, back)| back.as_str())
    }

    /// Render `raw_display` as lines.
    ///
    /// With a page size, only page `page` of the items is shown (clamped to
    /// the last page) and a Next item follows while items remain. A Back
    /// item is appended when `show_back` is set. Both synthetic items are
    /// omitted when navigation is disabled.
    pub fn render(
        &self,
        raw_display: &str,
        title: Option<&str>,
        page_size: Option<usize>,
        page: usize,
        show_back: bool,
    ) -> String {
        // An empty display is one empty item, rendered as a blank line.
        let mut items: Vec<&str> = raw_display.split(self.separator.as_str()).collect();

        let mut has_more = false;
        if let Some(size) = page_size.filter(|n| *n > 0) {
            let last_page = items.len().saturating_sub(1) / size;
            let page = if self.nav_labels.is_some() {
                page.min(last_page)
            } else {
                0
            };
            let start = (page * size).min(items.len());
            let end = (start + size).min(items.len());
            has_more = end < items.len();
            items = items[start..end].to_vec();
        }

        if let Some((ref next, ref back)) = self.nav_labels {
            if has_more {
                items.push(next);
            }
            if show_back {
                items.push(back);
            }
        }

        let mut out = String::new();
        if let Some(title) = title {
            out.push_str(title);
            out.push('\n');
        }
        for item in items {
            match self.chars_per_line {
                Some(width) => {
                    let truncated: String = item.chars().take(width).collect();
                    out.push_str(truncated.trim());
                }
                None => out.push_str(item.trim()),
            }
            out.push('\n');
        }
        out
    }
}

/// Composes responses for one session.
///
/// Composition re-reads the session state, refreshing its expiry, to pick
/// the page and decide whether the Back item applies.
pub struct Compositor<'a> {
    layout: &'a Layout,
    store: &'a SessionStore,
}

impl<'a> Compositor<'a> {
    pub fn new(layout: &'a Layout, store: &'a SessionStore) -> Self {
        Self { layout, store }
    }

    pub async fn compose(
        &self,
        raw_display: &str,
        title: Option<&str>,
        items_per_page: Option<usize>,
        session_id: &str,
    ) -> Result<String> {
        let state = self.store.load(session_id).await?.unwrap_or_default();
        let show_back = !state.pattern.is_empty();
        tracing::debug!(
            session_id,
            page = state.current_page(),
            show_back,
            "Composing response"
        );
        Ok(self.layout.render(
            raw_display,
            title,
            items_per_page,
            state.current_page(),
            show_back,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use ussd_core::{NavState, SessionState};
    use ussd_session::MemoryStore;

    fn layout() -> Layout {
        Layout::from_config(&Config::default())
    }

    #[test]
    fn test_render_plain_items() {
        assert_eq!(layout().render("A|B", None, None, 0, false), "A\nB\n");
    }

    #[test]
    fn test_render_empty_display_as_blank_line() {
        assert_eq!(layout().render("", None, None, 0, false), "\n");
        assert_eq!(layout().render("", Some("Menu"), None, 0, false), "Menu\n\n");
    }

    #[test]
    fn test_render_title_and_trim() {
        assert_eq!(
            layout().render(" 1. Balance | 2. Airtime ", Some("Welcome"), None, 0, false),
            "Welcome\n1. Balance\n2. Airtime\n"
        );
    }

    #[test]
    fn test_pagination_adds_next_when_items_remain() {
        let text = layout().render("A|B|C|D|E", None, Some(2), 0, false);
        assert_eq!(text, "A\nB\n0. Next\n");
    }

    #[test]
    fn test_pagination_without_overflow_has_no_next() {
        assert_eq!(layout().render("A|B", None, Some(2), 0, false), "A\nB\n");
        assert_eq!(layout().render("A|B", None, Some(5), 0, false), "A\nB\n");
    }

    #[test]
    fn test_later_pages() {
        let layout = layout();
        assert_eq!(layout.render("A|B|C|D|E", None, Some(2), 1, false), "C\nD\n0. Next\n");
        assert_eq!(layout.render("A|B|C|D|E", None, Some(2), 2, false), "E\n");
        assert_eq!(layout.render("A|B|C|D|E", None, Some(2), 9, false), "E\n");
    }

    #[test]
    fn test_back_and_next_together() {
        let text = layout().render("A|B|C", Some("T"), Some(1), 0, true);
        assert_eq!(text, "T\nA\n0. Next\n00. Back\n");
    }

    #[test]
    fn test_chars_per_line_truncates_before_trim() {
        let mut config = Config::default();
        config.output.chars_per_line = Some(5);
        let layout = Layout::from_config(&config);
        assert_eq!(layout.render("1. Pay|abcd efgh", None, None, 0, false), "1. Pa\nabcd\n");
    }

    #[test]
    fn test_comma_separator() {
        let mut config = Config::default();
        config.output.menu_items_separator = ",".to_string();
        assert_eq!(
            Layout::from_config(&config).render("A,B|C", None, None, 0, false),
            "A\nB|C\n"
        );
    }

    #[test]
    fn test_navigation_disabled_omits_synthetic_items() {
        let mut config = Config::default();
        config.navigation.enabled = false;
        let layout = Layout::from_config(&config);
        assert_eq!(layout.render("A|B|C", None, Some(1), 2, true), "A\n");
        assert!(layout.back_label().is_none());
    }

    #[tokio::test]
    async fn test_compose_reads_session_state() {
        let store = SessionStore::new(Arc::new(MemoryStore::new()), Duration::from_secs(20));
        let layout = layout();
        let compositor = Compositor::new(&layout, &store);

        let text = compositor.compose("A|B|C", None, Some(2), "s1").await.unwrap();
        assert_eq!(text, "A\nB\n0. Next\n");

        store
            .save(
                "s1",
                &SessionState {
                    pattern: vec!["2".into()],
                    nav: Some(NavState::first_next()),
                },
            )
            .await
            .unwrap();
        let text = compositor.compose("A|B|C", None, Some(2), "s1").await.unwrap();
        assert_eq!(text, "C\n00. Back\n");
    }
}
