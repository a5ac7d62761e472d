use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub title: String,
}

/// Opaque handle to an element found by `Backend::query_all`.
///
/// Handles are only meaningful to the backend that issued them and become
/// stale after the next navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef(u64);

impl ElementRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How to find elements on the page.
///
/// Text locators match the innermost elements whose trimmed `textContent`
/// satisfies the predicate, so a container never shadows the control it wraps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Css(String),
    /// Exact equality with the trimmed text.
    Text(String),
    TextContains(String),
    /// JavaScript-compatible regular expression source.
    TextMatches(String),
    XPath(String),
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn text(text: impl Into<String>) -> Self {
        Locator::Text(text.into())
    }

    pub fn text_contains(text: impl Into<String>) -> Self {
        Locator::TextContains(text.into())
    }

    pub fn text_matches(pattern: impl Into<String>) -> Self {
        Locator::TextMatches(pattern.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css={}", s),
            Locator::Text(s) => write!(f, "text=\"{}\"", s),
            Locator::TextContains(s) => write!(f, "text~={}", s),
            Locator::TextMatches(s) => write!(f, "text=/{}/", s),
            Locator::XPath(s) => write!(f, "xpath={}", s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollTarget {
    /// Relative vertical scroll in CSS pixels.
    By(i64),
    Top,
    Bottom,
}

/// The page automation port every core component talks to.
///
/// One implementation drives Chromium over CDP; tests use an in-memory page.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Launch the backend (start browser, attach to profile, etc.)
    async fn launch(&mut self) -> Result<(), BackendError>;

    /// Close the backend and cleanup resources.
    async fn close(&mut self) -> Result<(), BackendError>;

    async fn is_ready(&self) -> bool;

    /// Navigate and wait for the load event, failing after `timeout`.
    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, BackendError>;

    async fn current_url(&mut self) -> Result<String, BackendError>;

    /// Forget every element handed out so far; they become stale. Called when
    /// an operation reuses the current page instead of navigating.
    fn release_elements(&mut self) {}

    /// Find all elements matching `locator`, in document order.
    /// With a `scope`, only descendants of that element are considered.
    async fn query_all(
        &mut self,
        locator: &Locator,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, BackendError>;

    async fn query(
        &mut self,
        locator: &Locator,
        scope: Option<&ElementRef>,
    ) -> Result<Option<ElementRef>, BackendError> {
        Ok(self.query_all(locator, scope).await?.into_iter().next())
    }

    /// Evaluate a JavaScript function expression with JSON arguments and
    /// return its JSON result (`null` for `undefined`).
    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, BackendError>;

    /// Call a JavaScript function declaration with `this` bound to `element`.
    async fn call_on(&mut self, element: &ElementRef, function: &str)
    -> Result<Value, BackendError>;

    async fn text_content(&mut self, element: &ElementRef) -> Result<Option<String>, BackendError>;

    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BackendError>;

    async fn click(&mut self, element: &ElementRef) -> Result<(), BackendError>;

    async fn is_visible(&mut self, element: &ElementRef) -> Result<bool, BackendError>;

    async fn scroll_into_view(&mut self, element: &ElementRef) -> Result<(), BackendError>;

    async fn bounding_box(
        &mut self,
        element: &ElementRef,
    ) -> Result<Option<BoundingBox>, BackendError>;

    async fn scroll(&mut self, target: ScrollTarget) -> Result<(), BackendError>;

    /// Type text into whatever currently holds keyboard focus.
    async fn type_text(&mut self, text: &str) -> Result<(), BackendError>;

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError>;

    async fn mouse_click(&mut self, x: f64, y: f64) -> Result<(), BackendError>;
}
