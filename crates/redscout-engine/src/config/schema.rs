use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedscoutConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub comments: CommentsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_root_url")]
    pub root_url: String,
    /// Visible text of the control shown only to logged-out visitors.
    #[serde(default = "default_login_text")]
    pub login_text: String,
    #[serde(default = "default_feed_source_param")]
    pub feed_source_param: String,
    #[serde(default = "default_feed_source_value")]
    pub feed_source_value: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root_url: default_root_url(),
            login_text: default_login_text(),
            feed_source_param: default_feed_source_param(),
            feed_source_value: default_feed_source_value(),
        }
    }
}

impl SiteConfig {
    /// Absolute URL for a site-relative path such as `/search_result/abc`.
    pub fn absolute(&self, href: &str) -> String {
        if href.starts_with("http://") || href.starts_with("https://") {
            return href.to_string();
        }
        format!(
            "{}/{}",
            self.root_url.trim_end_matches('/'),
            href.trim_start_matches('/')
        )
    }
}

fn default_root_url() -> String {
    "https://www.xiaohongshu.com".to_string()
}

fn default_login_text() -> String {
    "登录".to_string()
}

fn default_feed_source_param() -> String {
    "xsec_source".to_string()
}

fn default_feed_source_value() -> String {
    "pc_feed".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Persistent Chromium profile; defaults to `<data dir>/redscout/browser_data`.
    #[serde(default)]
    pub profile_dir: Option<PathBuf>,
    /// Logging in needs a visible window, so headed is the default.
    #[serde(default)]
    pub headless: bool,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            profile_dir: None,
            headless: false,
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
            chrome_executable: None,
        }
    }
}

impl BrowserConfig {
    pub fn resolved_profile_dir(&self) -> PathBuf {
        self.profile_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("redscout")
                .join("browser_data")
        })
    }
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

/// Fixed, non-adaptive delays. All values in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,
    /// After a full navigation to a note or search page.
    #[serde(default = "default_page_settle_ms")]
    pub page_settle_ms: u64,
    /// When the session is already on the target page.
    #[serde(default = "default_revisit_settle_ms")]
    pub revisit_settle_ms: u64,
    #[serde(default = "default_root_settle_ms")]
    pub root_settle_ms: u64,
    #[serde(default = "default_login_poll_interval_ms")]
    pub login_poll_interval_ms: u64,
    #[serde(default = "default_login_ceiling_ms")]
    pub login_ceiling_ms: u64,
    #[serde(default = "default_post_login_settle_ms")]
    pub post_login_settle_ms: u64,
    /// After scrolling or re-sorting, for lazily rendered content.
    #[serde(default = "default_render_settle_ms")]
    pub render_settle_ms: u64,
    /// After a click that mutates the page.
    #[serde(default = "default_action_settle_ms")]
    pub action_settle_ms: u64,
    #[serde(default = "default_short_settle_ms")]
    pub short_settle_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            page_settle_ms: default_page_settle_ms(),
            revisit_settle_ms: default_revisit_settle_ms(),
            root_settle_ms: default_root_settle_ms(),
            login_poll_interval_ms: default_login_poll_interval_ms(),
            login_ceiling_ms: default_login_ceiling_ms(),
            post_login_settle_ms: default_post_login_settle_ms(),
            render_settle_ms: default_render_settle_ms(),
            action_settle_ms: default_action_settle_ms(),
            short_settle_ms: default_short_settle_ms(),
        }
    }
}

impl TimingConfig {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn page_settle(&self) -> Duration {
        Duration::from_millis(self.page_settle_ms)
    }

    pub fn revisit_settle(&self) -> Duration {
        Duration::from_millis(self.revisit_settle_ms)
    }

    pub fn root_settle(&self) -> Duration {
        Duration::from_millis(self.root_settle_ms)
    }

    pub fn login_poll_interval(&self) -> Duration {
        Duration::from_millis(self.login_poll_interval_ms)
    }

    pub fn login_ceiling(&self) -> Duration {
        Duration::from_millis(self.login_ceiling_ms)
    }

    pub fn post_login_settle(&self) -> Duration {
        Duration::from_millis(self.post_login_settle_ms)
    }

    pub fn render_settle(&self) -> Duration {
        Duration::from_millis(self.render_settle_ms)
    }

    pub fn action_settle(&self) -> Duration {
        Duration::from_millis(self.action_settle_ms)
    }

    pub fn short_settle(&self) -> Duration {
        Duration::from_millis(self.short_settle_ms)
    }
}

fn default_navigation_timeout_ms() -> u64 {
    60000
}

fn default_page_settle_ms() -> u64 {
    5000
}

fn default_revisit_settle_ms() -> u64 {
    3000
}

fn default_root_settle_ms() -> u64 {
    3000
}

fn default_login_poll_interval_ms() -> u64 {
    5000
}

fn default_login_ceiling_ms() -> u64 {
    180000
}

fn default_post_login_settle_ms() -> u64 {
    2000
}

fn default_render_settle_ms() -> u64 {
    3000
}

fn default_action_settle_ms() -> u64 {
    2000
}

fn default_short_settle_ms() -> u64 {
    1000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentsConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    #[serde(default = "default_scroll_step_px")]
    pub scroll_step_px: i64,
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            scroll_step_px: default_scroll_step_px(),
        }
    }
}

fn default_max_iterations() -> usize {
    8
}

fn default_scroll_step_px() -> i64 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let yaml = "timing:\n  page_settle_ms: 10\ncomments:\n  max_iterations: 3\n";
        let config: RedscoutConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.timing.page_settle_ms, 10);
        assert_eq!(config.timing.login_ceiling_ms, 180000);
        assert_eq!(config.comments.max_iterations, 3);
        assert_eq!(config.comments.scroll_step_px, 500);
        assert_eq!(config.site.root_url, "https://www.xiaohongshu.com");
        assert!(!config.browser.headless);
    }

    #[test]
    fn absolute_joins_relative_hrefs() {
        let site = SiteConfig::default();
        assert_eq!(
            site.absolute("/search_result/abc?x=1"),
            "https://www.xiaohongshu.com/search_result/abc?x=1"
        );
        assert_eq!(site.absolute("https://other/x"), "https://other/x");
    }
}
