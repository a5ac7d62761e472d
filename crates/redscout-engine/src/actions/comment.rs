use super::{ActionDispatcher, TextFilter, VisibleElement};
use crate::pacing::Cancelled;
use crate::comments::containers_with_text;
use crate::probes;
use crate::scripts;
use crate::strategy::{Strategy, StrategyChain};
use async_trait::async_trait;
use redscout_common::records::{ActionKind, ActionResult};
use redscout_common::{Backend, BackendError, ElementRef, Locator, ScrollTarget};
use serde_json::Value;
use tracing::debug;

pub const COMMENT_PLACEHOLDER: &str = "说点什么...";
pub const SEND_LABEL: &str = "发送";

const VISIBILITY_HINT: &str = "评论发布后所有人都能看到";

fn comment_area_locators() -> Vec<Locator> {
    vec![
        Locator::text_contains("条评论"),
        Locator::text_matches(r"\d+ 条评论"),
        Locator::text("评论"),
        Locator::css("div.comment-container"),
    ]
}

fn input_chain() -> StrategyChain<ElementRef> {
    StrategyChain::new("comment.input")
        .with(VisibleElement::new(
            "input.contenteditable",
            Locator::css(r#"div[contenteditable="true"]"#),
        ))
        .with(VisibleElement::new(
            "input.placeholder",
            Locator::text(COMMENT_PLACEHOLDER),
        ))
        .with(VisibleElement::new(
            "input.visibility_hint",
            Locator::text(VISIBILITY_HINT),
        ))
}

fn submit_chain() -> StrategyChain<()> {
    StrategyChain::new("comment.submit")
        .with(SendButton)
        .with(PressEnter)
        .with(ScriptSend)
}

struct SendButton;

#[async_trait]
impl Strategy<()> for SendButton {
    fn name(&self) -> &str {
        "submit.send_button"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<()>, BackendError> {
        let finder = VisibleElement::new("send_button", Locator::css("button"))
            .filter(TextFilter::Contains(SEND_LABEL.to_string()));
        let Some(button) = finder.probe(backend).await? else {
            return Ok(None);
        };
        backend.click(&button).await?;
        Ok(Some(()))
    }
}

struct PressEnter;

#[async_trait]
impl Strategy<()> for PressEnter {
    fn name(&self) -> &str {
        "submit.enter"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<()>, BackendError> {
        backend.press_key("Enter").await?;
        Ok(Some(()))
    }
}

struct ScriptSend;

#[async_trait]
impl Strategy<()> for ScriptSend {
    fn name(&self) -> &str {
        "submit.script"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<()>, BackendError> {
        let clicked = backend
            .evaluate(
                scripts::CLICK_BUTTON_CONTAINING,
                vec![Value::from(SEND_LABEL)],
            )
            .await?;
        Ok(clicked.as_bool().unwrap_or(false).then_some(()))
    }
}

impl ActionDispatcher<'_> {
    pub(super) async fn comment(
        &self,
        backend: &mut dyn Backend,
        text: &str,
    ) -> Result<ActionResult, Cancelled> {
        if !probes::scroll_to_first(backend, &comment_area_locators()).await
            && let Err(e) = backend.scroll(ScrollTarget::Bottom).await
        {
            debug!(error = %e, "Scroll to bottom failed");
        }
        self.pacer.settle(self.timing.action_settle()).await?;

        let Some(input) = self.find_input(backend).await? else {
            return Ok(ActionResult::not_found(
                ActionKind::Comment,
                "未能找到评论输入框，无法发布评论",
            ));
        };

        if self.activate(backend, input).await.is_none() {
            return Ok(ActionResult::not_found(
                ActionKind::Comment,
                "未能找到评论输入框，无法发布评论",
            ));
        }
        self.pacer.settle(self.timing.short_settle()).await?;
        if let Err(e) = backend.type_text(text).await {
            debug!(error = %e, "Typing the comment failed");
            return Ok(ActionResult::not_found(
                ActionKind::Comment,
                "发布评论失败，请检查评论内容或网络连接",
            ));
        }
        self.pacer.settle(self.timing.short_settle()).await?;

        let posted_before = containers_with_text(backend, text).await;
        let submitted = submit_chain().resolve(backend).await;
        let Some(strategy) = submitted.strategy() else {
            return Ok(ActionResult::not_found(
                ActionKind::Comment,
                "发布评论失败，请检查评论内容或网络连接",
            ));
        };
        debug!(strategy, "Comment submitted");
        self.pacer.settle(self.timing.action_settle()).await?;

        let posted_after = containers_with_text(backend, text).await;
        let verified = posted_after > posted_before;
        debug!(posted_before, posted_after, "Comment verification");
        Ok(ActionResult::performed(
            ActionKind::Comment,
            verified,
            format!("已成功发布评论：{}", text),
        ))
    }

    /// The input chain, then a page scan; when the scan reports an editable
    /// element, scroll to the bottom and run the chain once more.
    async fn find_input(
        &self,
        backend: &mut dyn Backend,
    ) -> Result<Option<ElementRef>, Cancelled> {
        if let Some(input) = input_chain().resolve(backend).await.into_value() {
            if let Err(e) = backend.scroll_into_view(&input).await {
                debug!(error = %e, "Scrolling the input into view failed");
            }
            self.pacer.settle(self.timing.short_settle()).await?;
            return Ok(Some(input));
        }

        let editable = backend
            .evaluate(
                scripts::HAS_EDITABLE,
                vec![Value::from(COMMENT_PLACEHOLDER.trim_end_matches('.'))],
            )
            .await
            .ok()
            .and_then(|v| v.as_bool())
            .unwrap_or(false);
        if !editable {
            return Ok(None);
        }

        if let Err(e) = backend.scroll(ScrollTarget::Bottom).await {
            debug!(error = %e, "Scroll to bottom failed");
        }
        self.pacer.settle(self.timing.short_settle()).await?;
        Ok(input_chain().resolve(backend).await.into_value())
    }
}
