use super::{ActionDispatcher, VisibleElement};
use crate::pacing::Cancelled;
use crate::strategy::StrategyChain;
use redscout_common::records::{ActionKind, ActionResult};
use redscout_common::{Backend, BackendError, ElementRef, Locator};
use tracing::debug;

pub const LIKE_SELECTORS: &[&str] = &[
    "div.like-icon",
    "div.like",
    "span.like",
    r#"div[aria-label="点赞"]"#,
    "svg.icon-like",
    ".operations .like",
    ".like-comment-collect .like",
    r#"button[aria-label="点赞"]"#,
];

const LIKE_LABELS: &[&str] = &["点赞", "赞", "喜欢"];

const ACTION_BAR_FIRST_CHILD: &str = ".operations > :first-child, \
     .operation-wrapper > :first-child, \
     .operations-container > :first-child, \
     .like-comment-collect > :first-child";

/// The note's own like control. Per-comment like controls share these
/// selectors, so anything inside a comment region is skipped.
fn like_control_chain() -> StrategyChain<ElementRef> {
    let mut chain = StrategyChain::new("like.control");
    for selector in LIKE_SELECTORS {
        chain = chain.with(
            VisibleElement::new(format!("like[{}]", selector), Locator::css(*selector))
                .outside_comments(),
        );
    }
    for label in LIKE_LABELS {
        chain = chain.with(
            VisibleElement::new(format!("like.text[{}]", label), Locator::text(*label))
                .outside_comments(),
        );
    }
    chain.with(
        VisibleElement::new("like.action_bar", Locator::css(ACTION_BAR_FIRST_CHILD))
            .outside_comments(),
    )
}

/// Whether the note's like control reports the liked state.
pub async fn is_liked(backend: &mut dyn Backend) -> bool {
    let Some(control) = like_control_chain().resolve(backend).await.into_value() else {
        return false;
    };
    match liked_state(backend, &control).await {
        Ok(liked) => liked,
        Err(e) => {
            debug!(control = %control, error = %e, "Like state probe failed");
            false
        }
    }
}

async fn liked_state(backend: &mut dyn Backend, control: &ElementRef) -> Result<bool, BackendError> {
    let class = backend.attribute(control, "class").await?.unwrap_or_default();
    if class
        .split_whitespace()
        .any(|token| token == "liked" || token == "active")
    {
        return Ok(true);
    }
    if backend.attribute(control, "aria-label").await?.as_deref() == Some("已点赞") {
        return Ok(true);
    }
    Ok(backend.attribute(control, "aria-pressed").await?.as_deref() == Some("true"))
}

impl ActionDispatcher<'_> {
    pub(super) async fn like(&self, backend: &mut dyn Backend) -> Result<ActionResult, Cancelled> {
        let Some(control) = like_control_chain().resolve(backend).await.into_value() else {
            return Ok(ActionResult::not_found(
                ActionKind::Like,
                "未能找到点赞按钮，点赞失败",
            ));
        };

        match liked_state(backend, &control).await {
            Ok(true) => {
                return Ok(ActionResult::already_done(
                    ActionKind::Like,
                    "已经为该笔记点赞",
                ));
            }
            Ok(false) => {}
            Err(e) => debug!(control = %control, error = %e, "Like state probe failed"),
        }

        if self.activate(backend, control).await.is_none() {
            return Ok(ActionResult::not_found(
                ActionKind::Like,
                "未能找到点赞按钮，点赞失败",
            ));
        }
        self.pacer.settle(self.timing.action_settle()).await?;

        let verified = is_liked(backend).await;
        Ok(ActionResult::performed(
            ActionKind::Like,
            verified,
            "成功为该笔记点赞",
        ))
    }
}
