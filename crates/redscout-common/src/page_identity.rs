//! URL canonicalization used to decide whether a navigation can be skipped.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use url::Url;

static ENTITY_ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(search_result|explore|discovery/item|discovery)/([A-Za-z0-9]+)")
        .expect("entity route pattern is valid")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    SearchResult,
    Explore,
    Discovery,
    Other,
}

/// The minimal form of a URL that identifies the same logical page.
///
/// Query string and fragment are dropped (they only carry tracking and
/// security tokens); for note routes the entity id is appended so equality
/// reads as "same route kind, same note".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageIdentity {
    pub canonical_url: String,
    pub route: RouteKind,
    pub entity_id: Option<String>,
}

impl PageIdentity {
    pub fn parse(raw: &str) -> Self {
        let base = base_url(raw);

        let (route, entity_id) = match ENTITY_ROUTE.captures(&base) {
            Some(caps) => {
                let route = match &caps[1] {
                    "search_result" => RouteKind::SearchResult,
                    "explore" => RouteKind::Explore,
                    _ => RouteKind::Discovery,
                };
                (route, Some(caps[2].to_string()))
            }
            None => (RouteKind::Other, None),
        };

        let canonical_url = match &entity_id {
            Some(id) => format!("{}_{}", base, id),
            None => base,
        };

        Self {
            canonical_url,
            route,
            entity_id,
        }
    }

    pub fn same_page(&self, other: &PageIdentity) -> bool {
        self == other
    }
}

fn base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            let mut base = url.to_string();
            if url.path() != "/" && base.ends_with('/') {
                base.pop();
            }
            base
        }
        // Relative or malformed input: everything before the query.
        Err(_) => trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/')
            .to_string(),
    }
}

/// Append `key=value` to `url`, respecting an existing query string.
pub fn with_query_param(url: &str, key: &str, value: &str) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{}{}{}={}", url, separator, key, value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_parameters_do_not_change_identity() {
        let a = PageIdentity::parse("https://www.xiaohongshu.com/explore/abc123?xsec_source=pc_feed");
        let b = PageIdentity::parse("https://www.xiaohongshu.com/explore/abc123");
        assert!(a.same_page(&b));
        assert_eq!(a.entity_id.as_deref(), Some("abc123"));
        assert_eq!(a.route, RouteKind::Explore);
        assert_eq!(
            a.canonical_url,
            "https://www.xiaohongshu.com/explore/abc123_abc123"
        );
    }

    #[test]
    fn different_notes_differ() {
        let a = PageIdentity::parse("https://www.xiaohongshu.com/explore/abc123");
        let b = PageIdentity::parse("https://www.xiaohongshu.com/explore/def456");
        assert!(!a.same_page(&b));
    }

    #[test]
    fn search_and_explore_routes_are_distinct_pages() {
        let a = PageIdentity::parse("https://www.xiaohongshu.com/search_result/abc123");
        let b = PageIdentity::parse("https://www.xiaohongshu.com/explore/abc123");
        assert_eq!(a.entity_id, b.entity_id);
        assert!(!a.same_page(&b));
    }

    #[test]
    fn discovery_item_route_extracts_the_note_id() {
        let id = PageIdentity::parse("https://www.xiaohongshu.com/discovery/item/66f1a2?x=1");
        assert_eq!(id.route, RouteKind::Discovery);
        assert_eq!(id.entity_id.as_deref(), Some("66f1a2"));
    }

    #[test]
    fn other_routes_only_strip_the_query() {
        let id = PageIdentity::parse("https://www.xiaohongshu.com/user/profile/u1?tab=notes#top");
        assert_eq!(id.route, RouteKind::Other);
        assert_eq!(id.canonical_url, "https://www.xiaohongshu.com/user/profile/u1");
    }

    #[test]
    fn relative_urls_fall_back_to_string_split() {
        let id = PageIdentity::parse("/explore/abc?x=1");
        assert_eq!(id.canonical_url, "/explore/abc_abc");
    }

    #[test]
    fn query_param_is_appended_with_the_right_separator() {
        assert_eq!(
            with_query_param("https://a/explore/1", "xsec_source", "pc_feed"),
            "https://a/explore/1?xsec_source=pc_feed"
        );
        assert_eq!(
            with_query_param("https://a/explore/1?t=2", "xsec_source", "pc_feed"),
            "https://a/explore/1?t=2&xsec_source=pc_feed"
        );
    }
}
