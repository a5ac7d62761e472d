//! Field chains for a note detail page.

use crate::probes::{LongestText, ScriptText, SelectorText, trimmed_text};
use crate::scripts;
use crate::strategy::{Resolved, Strategy, StrategyChain, TextRule};
use async_trait::async_trait;
use redscout_common::records::{NoteField, NoteRecord};
use redscout_common::{Backend, BackendError, Locator};
use serde_json::Value;
use tracing::{debug, info};

/// Elements whose text reads like a publish time, tried in this order.
pub const DATE_TEXT_PATTERNS: &[&str] = &[
    r"编辑于",
    r"\d{2}-\d{2}",
    r"\d{4}-\d{2}-\d{2}",
    r"\d+月\d+日",
    r"\d+天前",
    r"\d+小时前",
    r"今天",
    r"昨天",
];

/// Patterns scanned over the whole body text as a last resort.
pub const DATE_SCAN_PATTERNS: &[&str] = &[
    r"编辑于\s*([\d-]+)",
    r"(\d{2}-\d{2})",
    r"(\d{4}-\d{2}-\d{2})",
    r"(\d+月\d+日)",
    r"(\d+天前)",
    r"(\d+小时前)",
    r"(今天)",
    r"(昨天)",
];

/// Regions tagged `data-is-comment` before the body chain runs.
pub const COMMENT_REGION_SELECTORS: &[&str] = &[
    ".comments-container",
    ".comment-list",
    ".feed-comment",
    "div[data-v-aed4aacc]",
    ".content span.note-text",
];

pub const AUTHOR_SELECTORS: &[&str] = &[
    "span.username",
    "a.name",
    ".author-wrapper .username",
    ".info .name",
];

pub fn title_chain() -> StrategyChain<String> {
    StrategyChain::new("title")
        .with(SelectorText::css("title.detail_title", "#detail-title"))
        .with(SelectorText::css("title.div_title", "div.title"))
        .with(ScriptText::first_text_of(
            "title.script",
            &["#detail-title", "div.title", "h1", "div.note-content div.title"],
        ))
}

pub fn author_chain() -> StrategyChain<String> {
    StrategyChain::new("author")
        .with(SelectorText::css("author.username", "span.username"))
        .with(SelectorText::css("author.name_link", "a.name"))
        .with(ScriptText::first_text_of("author.script", AUTHOR_SELECTORS))
}

pub fn published_at_chain() -> StrategyChain<String> {
    StrategyChain::new("published_at")
        .with(SelectorText::css("published_at.date", "span.date"))
        .with(DatePatternText)
        .with(ScriptText::first_text_of(
            "published_at.script",
            &["span.date", ".bottom-container .date", ".date"],
        ))
        .with(ScriptText::new(
            "published_at.body_scan",
            scripts::FIRST_TEXT_MATCH,
            vec![Value::from(DATE_SCAN_PATTERNS.to_vec())],
        ))
}

/// Run after `mark_comment_regions`; element strategies skip tagged regions.
pub fn body_chain() -> StrategyChain<String> {
    StrategyChain::new("body")
        .with(
            SelectorText::css("body.detail_desc", "#detail-desc .note-text")
                .outside_comments()
                .rule(TextRule::longer_than(50)),
        )
        .with(
            SelectorText::new(
                "body.xpath",
                Locator::xpath(r#"//div[@id="detail-desc"]/span[@class="note-text"]"#),
            )
            .outside_comments()
            .rule(TextRule::longer_than(20)),
        )
        .with(
            LongestText::new(
                "body.longest",
                Locator::css("div#detail-desc, div.note-content, div.desc, span.note-text"),
                TextRule::longer_than(100).shorter_than(10000),
            )
            .outside_comments(),
        )
        .with(
            ScriptText::new(
                "body.note_content",
                scripts::NOTE_CONTENT_OR_PARAGRAPHS,
                Vec::new(),
            )
            .rule(TextRule::longer_than(50)),
        )
        .with(
            ScriptText::new("body.structure", scripts::NOTE_STRUCTURE_TEXT, Vec::new())
                .rule(TextRule::longer_than(100)),
        )
}

/// First element whose text matches one of `DATE_TEXT_PATTERNS`.
struct DatePatternText;

#[async_trait]
impl Strategy<String> for DatePatternText {
    fn name(&self) -> &str {
        "published_at.pattern"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        for pattern in DATE_TEXT_PATTERNS {
            if let Some(element) = backend.query(&Locator::text_matches(*pattern), None).await?
                && let Some(text) = trimmed_text(backend, &element).await?
            {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    fn accept(&self, candidate: &String) -> bool {
        TextRule::NON_EMPTY.accepts(candidate)
    }
}

/// Tag comment regions so body strategies can tell note text from comments.
pub async fn mark_comment_regions(backend: &mut dyn Backend) {
    match backend
        .evaluate(
            scripts::MARK_COMMENT_REGIONS,
            vec![Value::from(COMMENT_REGION_SELECTORS.to_vec())],
        )
        .await
    {
        Ok(tagged) => debug!(tagged = %tagged, "Marked comment regions"),
        Err(e) => debug!(error = %e, "Marking comment regions failed"),
    }
}

/// Resolve every field of the note currently shown. Never fails: fields no
/// strategy could read stay `Unknown`.
pub async fn extract_note(backend: &mut dyn Backend, url: &str) -> NoteRecord {
    let mut record = NoteRecord::new(url);

    for (field, chain) in [
        (NoteField::Title, title_chain()),
        (NoteField::Author, author_chain()),
        (NoteField::PublishedAt, published_at_chain()),
    ] {
        apply(&mut record, field, chain.resolve(backend).await);
    }

    mark_comment_regions(backend).await;
    apply(&mut record, NoteField::Body, body_chain().resolve(backend).await);

    info!(
        url,
        title = record.title.is_known(),
        author = record.author.is_known(),
        published_at = record.published_at.is_known(),
        body = record.body.is_known(),
        "Extracted note"
    );
    record
}

fn apply(record: &mut NoteRecord, field: NoteField, resolved: Resolved<String>) {
    if let Resolved::Found(found) = resolved {
        record.set(field, found.value, found.strategy);
    }
}
