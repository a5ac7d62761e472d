//! Search result cards.

use crate::config::{SiteConfig, TimingConfig};
use crate::pacing::{Cancelled, Pacer};
use crate::probes::{DescendantTexts, LongestText, SelectorText};
use crate::strategy::{StrategyChain, TextRule};
use redscout_common::records::{FieldValue, SearchHit};
use redscout_common::{Backend, BackendError, ElementRef, Locator};
use std::collections::HashSet;
use tracing::{debug, warn};

pub const CARD_SELECTORS: &[&str] = &["section.note-item", "div[data-v-a264b01a]"];
pub const CARD_LINK: &str = r#"a[href*="/search_result/"]"#;

pub fn search_url(site: &SiteConfig, keywords: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(keywords.as_bytes()).collect();
    format!(
        "{}/search_result?keyword={}",
        site.root_url.trim_end_matches('/'),
        encoded
    )
}

pub fn card_title_chain(card: ElementRef) -> StrategyChain<String> {
    StrategyChain::new("card_title")
        .with(SelectorText::css("card_title.footer", "div.footer a.title span").within(card))
        .with(SelectorText::css("card_title.title_span", "a.title span").within(card))
        .with(
            LongestText::new(
                "card_title.longest_span",
                Locator::css("span"),
                TextRule::longer_than(5),
            )
            .within(card),
        )
        .with(DescendantTexts::new(
            "card_title.descendants",
            card,
            TextRule::longer_than(5),
        ))
}

/// Switch the result list to newest-first. Each step is isolated: a missing
/// control is logged and the search continues unsorted.
pub async fn sort_by_latest(
    backend: &mut dyn Backend,
    pacer: &Pacer,
    timing: &TimingConfig,
) -> Result<bool, Cancelled> {
    let dropdown = match backend.query(&Locator::text("综合"), None).await {
        Ok(Some(el)) => el,
        Ok(None) => {
            warn!("Sort dropdown not found");
            return Ok(false);
        }
        Err(e) => {
            warn!(error = %e, "Sort dropdown lookup failed");
            return Ok(false);
        }
    };
    if let Err(e) = backend.click(&dropdown).await {
        warn!(error = %e, "Could not open sort dropdown");
        return Ok(false);
    }
    pacer.settle(timing.short_settle()).await?;

    let newest = match backend.query(&Locator::text("最新"), None).await {
        Ok(Some(el)) => el,
        Ok(None) => {
            warn!("Newest sort option not found");
            return Ok(false);
        }
        Err(e) => {
            warn!(error = %e, "Newest sort option lookup failed");
            return Ok(false);
        }
    };
    if let Err(e) = backend.click(&newest).await {
        warn!(error = %e, "Could not select newest sort");
        return Ok(false);
    }
    pacer.settle(timing.render_settle()).await?;
    Ok(true)
}

/// Cards under the first selector that matches anything.
pub async fn find_cards(backend: &mut dyn Backend) -> Result<Vec<ElementRef>, BackendError> {
    for selector in CARD_SELECTORS {
        let cards = backend.query_all(&Locator::css(*selector), None).await?;
        if !cards.is_empty() {
            debug!(selector, count = cards.len(), "Found result cards");
            return Ok(cards);
        }
    }
    Ok(Vec::new())
}

/// Distinct hits in page order, at most `limit`.
pub async fn collect_hits(
    backend: &mut dyn Backend,
    site: &SiteConfig,
    limit: usize,
) -> Result<Vec<SearchHit>, BackendError> {
    let cards = find_cards(backend).await?;
    let mut seen = HashSet::new();
    let mut hits = Vec::new();

    for card in cards {
        if hits.len() >= limit {
            break;
        }
        let href = match card_href(backend, &card).await {
            Ok(Some(href)) => href,
            Ok(None) => continue,
            Err(e) => {
                debug!(card = %card, error = %e, "Skipping unreadable card");
                continue;
            }
        };

        let url = site.absolute(&href);
        if !seen.insert(url.clone()) {
            continue;
        }
        let title = FieldValue::from(card_title_chain(card).resolve(backend).await.into_value());
        hits.push(SearchHit { url, title });
    }

    Ok(hits)
}

async fn card_href(
    backend: &mut dyn Backend,
    card: &ElementRef,
) -> Result<Option<String>, BackendError> {
    let Some(link) = backend.query(&Locator::css(CARD_LINK), Some(card)).await? else {
        return Ok(None);
    };
    Ok(backend
        .attribute(&link, "href")
        .await?
        .filter(|href| href.contains("/search_result/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_keywords() {
        let site = SiteConfig::default();
        assert_eq!(
            search_url(&site, "手冲 咖啡"),
            "https://www.xiaohongshu.com/search_result?keyword=%E6%89%8B%E5%86%B2+%E5%92%96%E5%95%A1"
        );
    }
}
