//! Write actions (comment, like, follow) as ordered strategy chains.
//!
//! Every action runs the same steps: an idempotency probe that mutates
//! nothing, a control location chain, an activation chain, then a settle and
//! a post-condition re-check reported through `ActionResult::verified`.

mod comment;
mod follow;
mod like;

use crate::config::TimingConfig;
use crate::pacing::{Cancelled, Pacer};
use crate::probes::{in_comment_region, trimmed_text};
use crate::strategy::{Strategy, StrategyChain};
use async_trait::async_trait;
use redscout_common::records::{ActionKind, ActionResult};
use redscout_common::{Backend, BackendError, ElementRef, Locator};
use tracing::{debug, info};

pub use comment::{COMMENT_PLACEHOLDER, SEND_LABEL};
pub use follow::{FOLLOW_LABELS, FOLLOWED_LABELS};
pub use like::LIKE_SELECTORS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionRequest {
    Comment { text: String },
    Like,
    Follow,
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::Comment { .. } => ActionKind::Comment,
            ActionRequest::Like => ActionKind::Like,
            ActionRequest::Follow => ActionKind::Follow,
        }
    }
}

pub struct ActionDispatcher<'a> {
    timing: &'a TimingConfig,
    pacer: &'a Pacer,
}

impl<'a> ActionDispatcher<'a> {
    pub fn new(timing: &'a TimingConfig, pacer: &'a Pacer) -> Self {
        Self { timing, pacer }
    }

    /// Run one action against the page the session is already on.
    pub async fn execute(
        &self,
        backend: &mut dyn Backend,
        request: &ActionRequest,
    ) -> Result<ActionResult, Cancelled> {
        let result = match request {
            ActionRequest::Comment { text } => self.comment(backend, text).await?,
            ActionRequest::Like => self.like(backend).await?,
            ActionRequest::Follow => self.follow(backend).await?,
        };
        info!(
            kind = %result.kind,
            succeeded = result.succeeded,
            already_done = result.already_done,
            verified = result.verified,
            "Action finished"
        );
        Ok(result)
    }

    /// Click `target`, falling back to a mouse click at its centre.
    /// Returns the name of the strategy that worked.
    async fn activate(&self, backend: &mut dyn Backend, target: ElementRef) -> Option<String> {
        let chain = StrategyChain::new("activate")
            .with(ElementClick(target))
            .with(CoordinateClick(target));
        chain
            .resolve(backend)
            .await
            .strategy()
            .map(str::to_string)
    }
}

/// Which text a located control must carry.
#[derive(Debug, Clone)]
pub enum TextFilter {
    Any,
    /// Trimmed text equals one of these exactly.
    OneOf(Vec<String>),
    Contains(String),
}

impl TextFilter {
    pub fn one_of(labels: &[&str]) -> Self {
        TextFilter::OneOf(labels.iter().map(|l| l.to_string()).collect())
    }

    fn matches(&self, text: Option<&str>) -> bool {
        match self {
            TextFilter::Any => true,
            TextFilter::OneOf(labels) => text.is_some_and(|t| labels.iter().any(|l| l == t)),
            TextFilter::Contains(needle) => text.is_some_and(|t| t.contains(needle.as_str())),
        }
    }
}

/// First visible element for a locator whose text passes a filter.
pub struct VisibleElement {
    name: String,
    locator: Locator,
    filter: TextFilter,
    outside_comments: bool,
}

impl VisibleElement {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
            filter: TextFilter::Any,
            outside_comments: false,
        }
    }

    pub fn filter(mut self, filter: TextFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Skip controls that belong to a comment, such as per-comment likes.
    pub fn outside_comments(mut self) -> Self {
        self.outside_comments = true;
        self
    }
}

#[async_trait]
impl Strategy<ElementRef> for VisibleElement {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<ElementRef>, BackendError> {
        for element in backend.query_all(&self.locator, None).await? {
            if !backend.is_visible(&element).await? {
                continue;
            }
            if self.outside_comments && in_comment_region(backend, &element).await? {
                continue;
            }
            if matches!(self.filter, TextFilter::Any) {
                return Ok(Some(element));
            }
            let text = trimmed_text(backend, &element).await?;
            if self.filter.matches(text.as_deref()) {
                return Ok(Some(element));
            }
        }
        Ok(None)
    }
}

struct ElementClick(ElementRef);

#[async_trait]
impl Strategy<()> for ElementClick {
    fn name(&self) -> &str {
        "element_click"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<()>, BackendError> {
        backend.click(&self.0).await?;
        Ok(Some(()))
    }
}

struct CoordinateClick(ElementRef);

#[async_trait]
impl Strategy<()> for CoordinateClick {
    fn name(&self) -> &str {
        "coordinate_click"
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<()>, BackendError> {
        let Some(bounds) = backend.bounding_box(&self.0).await? else {
            return Ok(None);
        };
        let (x, y) = bounds.center();
        debug!(x, y, "Clicking at element centre");
        backend.mouse_click(x, y).await?;
        Ok(Some(()))
    }
}
