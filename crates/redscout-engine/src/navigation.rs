//! Skip navigations to the page the session is already showing.

use crate::config::{SiteConfig, TimingConfig};
use crate::pacing::Pacer;
use crate::service::ServiceError;
use redscout_common::page_identity::with_query_param;
use redscout_common::{Backend, PageIdentity};
use tracing::debug;

pub struct NavigationController<'a> {
    site: &'a SiteConfig,
    timing: &'a TimingConfig,
    pacer: &'a Pacer,
}

impl<'a> NavigationController<'a> {
    pub fn new(site: &'a SiteConfig, timing: &'a TimingConfig, pacer: &'a Pacer) -> Self {
        Self {
            site,
            timing,
            pacer,
        }
    }

    /// Whether the current page is logically the same page as `target`.
    /// An unreadable current URL counts as "not on target".
    pub async fn is_on_target(&self, backend: &mut dyn Backend, target: &str) -> bool {
        match backend.current_url().await {
            Ok(current) => PageIdentity::parse(&current).same_page(&PageIdentity::parse(target)),
            Err(e) => {
                debug!(error = %e, "Could not read current url");
                false
            }
        }
    }

    /// Navigate and settle fully, or only settle lightly when already there.
    pub async fn navigate_if_needed(
        &self,
        backend: &mut dyn Backend,
        target: &str,
    ) -> Result<(), ServiceError> {
        if self.is_on_target(backend, target).await {
            debug!(target, "Already on target page");
            backend.release_elements();
            self.pacer.settle(self.timing.revisit_settle()).await?;
            return Ok(());
        }

        debug!(target, "Navigating");
        backend
            .navigate(target, self.timing.navigation_timeout())
            .await
            .map_err(ServiceError::Navigation)?;
        self.pacer.settle(self.timing.page_settle()).await?;
        Ok(())
    }

    /// The note URL as the feed links to it, for reads and writes that
    /// interact with the comment area.
    pub fn feed_url(&self, url: &str) -> String {
        with_query_param(
            url,
            &self.site.feed_source_param,
            &self.site.feed_source_value,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feed_url_appends_source() {
        let site = SiteConfig::default();
        let timing = TimingConfig::default();
        let pacer = Pacer::default();
        let nav = NavigationController::new(&site, &timing, &pacer);
        assert_eq!(
            nav.feed_url("https://www.xiaohongshu.com/explore/abc"),
            "https://www.xiaohongshu.com/explore/abc?xsec_source=pc_feed"
        );
    }
}
