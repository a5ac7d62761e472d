//! Incremental comment collection: scroll, reveal, extract, merge.

use crate::config::{CommentsConfig, TimingConfig};
use crate::pacing::{Cancelled, Pacer};
use crate::probes::{self, SelectorText, StrippedText, first_visible, value_text};
use crate::scripts;
use crate::strategy::StrategyChain;
use redscout_common::records::CommentRecord;
use redscout_common::{Backend, BackendError, ElementRef, Locator, ScrollTarget};
use std::collections::HashSet;
use tracing::{debug, info};

/// Controls that load more comments, tried in this order.
pub const REVEAL_LABELS: &[&str] = &["查看更多评论", "展开更多评论", "加载更多", "查看全部"];

pub const CONTAINER_SELECTORS: &[&str] = &[
    "div.comment-item",
    "div.commentItem",
    "div.comment-content",
    "div.comment-wrapper",
    "section.comment",
    "div.feed-comment",
];

pub const USERNAME_SELECTORS: &[&str] = &[
    "span.user-name",
    "a.name",
    "div.username",
    "span.nickname",
    "a.user-nickname",
];

pub const CONTENT_SELECTORS: &[&str] = &[
    "div.content",
    "p.content",
    "div.text",
    "span.content",
    "div.comment-text",
];

pub const TIME_SELECTORS: &[&str] = &["span.time", "div.time", "span.date", "div.date", "time"];

pub const PROFILE_LINK: &str = r#"a[href*="/user/profile/"]"#;

pub const UNKNOWN_TIME: &str = "未知时间";

pub struct CommentCollector<'a> {
    config: &'a CommentsConfig,
    timing: &'a TimingConfig,
    pacer: &'a Pacer,
}

impl<'a> CommentCollector<'a> {
    pub fn new(config: &'a CommentsConfig, timing: &'a TimingConfig, pacer: &'a Pacer) -> Self {
        Self {
            config,
            timing,
            pacer,
        }
    }

    /// Collect every comment the page will reveal, deduplicated by
    /// (username, content) in first-seen order.
    pub async fn collect(
        &self,
        backend: &mut dyn Backend,
    ) -> Result<Vec<CommentRecord>, Cancelled> {
        let heading = [Locator::text_contains("条评论"), Locator::text_contains("评论")];
        if probes::scroll_to_first(backend, &heading).await {
            self.pacer.settle(self.timing.action_settle()).await?;
        }

        let mut records: Vec<CommentRecord> = Vec::new();
        let mut seen: HashSet<(String, String)> = HashSet::new();

        for iteration in 1..=self.config.max_iterations {
            if let Err(e) = backend
                .scroll(ScrollTarget::By(self.config.scroll_step_px))
                .await
            {
                debug!(iteration, error = %e, "Scroll failed");
            }
            self.pacer.settle(self.timing.short_settle()).await?;

            let revealed = reveal_more(backend).await;
            if revealed {
                self.pacer.settle(self.timing.action_settle()).await?;
            }

            let before = records.len();
            for record in extract_structured(backend).await {
                if seen.insert((record.username.clone(), record.content.clone())) {
                    records.push(record);
                }
            }
            let added = records.len() - before;
            debug!(iteration, revealed, added, total = records.len(), "Comment pass");

            if !revealed && added == 0 && !records.is_empty() {
                debug!(iteration, "No more comments to reveal");
                break;
            }
        }

        if records.is_empty() {
            records = extract_from_profile_links(backend).await;
            debug!(count = records.len(), "Profile link fallback");
        }

        info!(count = records.len(), "Collected comments");
        Ok(records)
    }
}

/// Click the first visible reveal control. Returns whether one was clicked.
pub async fn reveal_more(backend: &mut dyn Backend) -> bool {
    for label in REVEAL_LABELS {
        let control = match first_visible(backend, &Locator::text_contains(*label), None).await {
            Ok(Some(control)) => control,
            Ok(None) => continue,
            Err(e) => {
                debug!(label, error = %e, "Reveal lookup failed");
                continue;
            }
        };
        match backend.click(&control).await {
            Ok(()) => {
                debug!(label, "Revealed more comments");
                return true;
            }
            Err(e) => debug!(label, error = %e, "Reveal click failed"),
        }
    }
    false
}

/// One pass over the comment containers currently rendered.
pub async fn extract_structured(backend: &mut dyn Backend) -> Vec<CommentRecord> {
    let containers = match find_containers(backend).await {
        Ok(containers) => containers,
        Err(e) => {
            debug!(error = %e, "Comment container lookup failed");
            Vec::new()
        }
    };

    let mut records = Vec::new();
    for container in containers {
        if let Some(record) = parse_comment(backend, container).await {
            records.push(record);
        }
    }
    records
}

/// How many rendered comment containers contain `text`. The comment input
/// is not a container, so a typed but unsent comment is not counted.
pub async fn containers_with_text(backend: &mut dyn Backend, text: &str) -> usize {
    let needle = text.trim();
    let mut count = 0;
    for selector in CONTAINER_SELECTORS {
        let containers = match backend.query_all(&Locator::css(*selector), None).await {
            Ok(containers) => containers,
            Err(e) => {
                debug!(selector, error = %e, "Comment container lookup failed");
                continue;
            }
        };
        for container in containers {
            if let Ok(Some(content)) = backend.text_content(&container).await
                && content.contains(needle)
            {
                count += 1;
            }
        }
    }
    count
}

async fn find_containers(backend: &mut dyn Backend) -> Result<Vec<ElementRef>, BackendError> {
    for selector in CONTAINER_SELECTORS {
        let found = backend.query_all(&Locator::css(*selector), None).await?;
        if !found.is_empty() {
            return Ok(found);
        }
    }
    Ok(Vec::new())
}

pub fn username_chain(container: ElementRef) -> StrategyChain<String> {
    let mut chain = StrategyChain::new("comment.username");
    for selector in USERNAME_SELECTORS {
        chain = chain.with(
            SelectorText::css(format!("username[{}]", selector), selector).within(container),
        );
    }
    chain.with(SelectorText::css("username.profile_link", PROFILE_LINK).within(container))
}

pub fn content_chain(container: ElementRef, username: &str) -> StrategyChain<String> {
    let mut chain = StrategyChain::new("comment.content");
    for selector in CONTENT_SELECTORS {
        chain = chain.with(
            SelectorText::css(format!("content[{}]", selector), selector).within(container),
        );
    }
    chain.with(StrippedText::new("content.full_text", container, username))
}

pub fn time_chain(container: ElementRef) -> StrategyChain<String> {
    let mut chain = StrategyChain::new("comment.time");
    for selector in TIME_SELECTORS {
        chain = chain.with(
            SelectorText::css(format!("time[{}]", selector), selector).within(container),
        );
    }
    chain
}

async fn parse_comment(backend: &mut dyn Backend, container: ElementRef) -> Option<CommentRecord> {
    let username = username_chain(container).resolve(backend).await.into_value()?;
    let content = content_chain(container, &username)
        .resolve(backend)
        .await
        .into_value()?;
    if content.chars().count() <= 2 {
        return None;
    }
    let posted_at = time_chain(container)
        .resolve(backend)
        .await
        .into_value()
        .unwrap_or_else(|| UNKNOWN_TIME.to_string());

    Some(CommentRecord {
        username,
        content,
        posted_at,
    })
}

/// Fallback for layouts without a known container: every profile link plus
/// the text beside it.
async fn extract_from_profile_links(backend: &mut dyn Backend) -> Vec<CommentRecord> {
    let links = match backend.query_all(&Locator::css(PROFILE_LINK), None).await {
        Ok(links) => links,
        Err(e) => {
            debug!(error = %e, "Profile link lookup failed");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for link in links {
        let Ok(Some(username)) = probes::trimmed_text(backend, &link).await else {
            continue;
        };
        let content = match backend.call_on(&link, scripts::SIBLING_TEXT).await {
            Ok(value) => value_text(value),
            Err(e) => {
                debug!(link = %link, error = %e, "Sibling text failed");
                None
            }
        };
        if let Some(content) = content {
            records.push(CommentRecord {
                username,
                content,
                posted_at: UNKNOWN_TIME.to_string(),
            });
        }
    }
    records
}
