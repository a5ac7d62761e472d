use super::{ActionDispatcher, TextFilter, VisibleElement};
use crate::extraction::note::AUTHOR_SELECTORS;
use crate::pacing::Cancelled;
use crate::probes::ScriptText;
use crate::strategy::StrategyChain;
use redscout_common::records::{ActionKind, ActionResult};
use redscout_common::{Backend, ElementRef, Locator, ScrollTarget};
use tracing::debug;

/// Exact texts of a follow control. Anything else, such as `已关注`, is not one.
pub const FOLLOW_LABELS: &[&str] = &["关注", "+关注", "+ 关注"];

pub const FOLLOWED_LABELS: &[&str] = &["已关注", "互相关注"];

const AUTHOR_CARD_CONTROLS: &str = ".author-wrapper button, .author-wrapper a, .author-wrapper div.follow-btn, \
     .creator-card button, .creator-card a, .creator-card div.follow-btn, \
     .user-card button, .user-card a, .user-card div.follow-btn, \
     .info-card button, .info-card a, .info-card div.follow-btn";

const UNKNOWN_AUTHOR: &str = "未知作者";

const FOLLOWED_CLASS: &str = "button.followed, .author-wrapper .followed, \
     .creator-card .followed, .user-card .followed, .info-card .followed";

fn follow_control_chain() -> StrategyChain<ElementRef> {
    StrategyChain::new("follow.control")
        .with(
            VisibleElement::new("follow.button_follow", Locator::css("button.follow"))
                .filter(TextFilter::one_of(FOLLOW_LABELS))
                .outside_comments(),
        )
        .with(
            VisibleElement::new("follow.any_button", Locator::css("button"))
                .filter(TextFilter::one_of(FOLLOW_LABELS))
                .outside_comments(),
        )
        .with(
            VisibleElement::new("follow.author_card", Locator::css(AUTHOR_CARD_CONTROLS))
                .filter(TextFilter::one_of(FOLLOW_LABELS))
                .outside_comments(),
        )
}

/// Controls that show the author as already followed. Plain text such as a
/// comment saying `已关注` does not count.
fn followed_chain() -> StrategyChain<ElementRef> {
    StrategyChain::new("follow.followed")
        .with(
            VisibleElement::new("followed.button", Locator::css("button"))
                .filter(TextFilter::one_of(FOLLOWED_LABELS))
                .outside_comments(),
        )
        .with(
            VisibleElement::new("followed.author_card", Locator::css(AUTHOR_CARD_CONTROLS))
                .filter(TextFilter::one_of(FOLLOWED_LABELS))
                .outside_comments(),
        )
        .with(
            VisibleElement::new("followed.class", Locator::css(FOLLOWED_CLASS))
                .outside_comments(),
        )
}

/// Whether the page shows the author as already followed.
pub async fn is_followed(backend: &mut dyn Backend) -> bool {
    followed_chain().resolve(backend).await.is_found()
}

impl ActionDispatcher<'_> {
    pub(super) async fn follow(
        &self,
        backend: &mut dyn Backend,
    ) -> Result<ActionResult, Cancelled> {
        if let Err(e) = backend.scroll(ScrollTarget::Top).await {
            debug!(error = %e, "Scroll to top failed");
        }
        self.pacer.settle(self.timing.short_settle()).await?;

        let author = StrategyChain::new("follow.author")
            .with(ScriptText::first_text_of("author.script", AUTHOR_SELECTORS))
            .resolve(backend)
            .await
            .into_value()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());

        if is_followed(backend).await {
            return Ok(ActionResult::already_done(
                ActionKind::Follow,
                "已经关注该用户",
            ));
        }

        let not_found = || {
            ActionResult::not_found(
                ActionKind::Follow,
                format!("未能找到关注按钮，关注用户 {} 失败", author),
            )
        };

        let Some(control) = follow_control_chain().resolve(backend).await.into_value() else {
            return Ok(not_found());
        };
        if self.activate(backend, control).await.is_none() {
            return Ok(not_found());
        }
        self.pacer.settle(self.timing.action_settle()).await?;

        let verified = is_followed(backend).await;
        Ok(ActionResult::performed(
            ActionKind::Follow,
            verified,
            format!("成功关注用户: {}", author),
        ))
    }
}
