//! Reusable text strategies and small page helpers shared by the extraction,
//! comment and action chains.

use crate::scripts;
use crate::strategy::{Strategy, TextRule, longest_text};
use async_trait::async_trait;
use redscout_common::{Backend, BackendError, ElementRef, Locator};
use serde_json::Value;
use tracing::debug;

/// Trimmed, non-empty string out of a script result.
pub fn value_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        _ => None,
    }
}

pub async fn trimmed_text(
    backend: &mut dyn Backend,
    element: &ElementRef,
) -> Result<Option<String>, BackendError> {
    Ok(backend
        .text_content(element)
        .await?
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty()))
}

pub async fn in_comment_region(
    backend: &mut dyn Backend,
    element: &ElementRef,
) -> Result<bool, BackendError> {
    let value = backend
        .call_on(element, scripts::IS_IN_COMMENT_REGION)
        .await?;
    Ok(value.as_bool().unwrap_or(false))
}

/// First element matching `locator` that is currently visible.
pub async fn first_visible(
    backend: &mut dyn Backend,
    locator: &Locator,
    scope: Option<&ElementRef>,
) -> Result<Option<ElementRef>, BackendError> {
    for element in backend.query_all(locator, scope).await? {
        if backend.is_visible(&element).await.unwrap_or(false) {
            return Ok(Some(element));
        }
    }
    Ok(None)
}

/// Scroll the first element any locator finds into view. Lookup and scroll
/// errors move on to the next locator.
pub async fn scroll_to_first(backend: &mut dyn Backend, locators: &[Locator]) -> bool {
    for locator in locators {
        let element = match backend.query(locator, None).await {
            Ok(Some(element)) => element,
            Ok(None) => continue,
            Err(e) => {
                debug!(%locator, error = %e, "Scroll target lookup failed");
                continue;
            }
        };
        match backend.scroll_into_view(&element).await {
            Ok(()) => return true,
            Err(e) => debug!(%locator, error = %e, "Scroll into view failed"),
        }
    }
    false
}

/// Text of the first element a locator finds.
pub struct SelectorText {
    name: String,
    locator: Locator,
    rule: TextRule,
    scope: Option<ElementRef>,
    outside_comments: bool,
    visible_only: bool,
}

impl SelectorText {
    pub fn new(name: impl Into<String>, locator: Locator) -> Self {
        Self {
            name: name.into(),
            locator,
            rule: TextRule::NON_EMPTY,
            scope: None,
            outside_comments: false,
            visible_only: false,
        }
    }

    pub fn css(name: impl Into<String>, selector: &str) -> Self {
        Self::new(name, Locator::css(selector))
    }

    pub fn rule(mut self, rule: TextRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn within(mut self, scope: ElementRef) -> Self {
        self.scope = Some(scope);
        self
    }

    /// Skip elements inside a comment region.
    pub fn outside_comments(mut self) -> Self {
        self.outside_comments = true;
        self
    }

    pub fn visible_only(mut self) -> Self {
        self.visible_only = true;
        self
    }
}

#[async_trait]
impl Strategy<String> for SelectorText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let elements = backend.query_all(&self.locator, self.scope.as_ref()).await?;
        for element in elements {
            if self.outside_comments && in_comment_region(backend, &element).await? {
                continue;
            }
            if self.visible_only && !backend.is_visible(&element).await? {
                continue;
            }
            if let Some(text) = trimmed_text(backend, &element).await? {
                return Ok(Some(text));
            }
        }
        Ok(None)
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}

/// String returned by a page-level script.
pub struct ScriptText {
    name: String,
    script: &'static str,
    args: Vec<Value>,
    rule: TextRule,
}

impl ScriptText {
    pub fn new(name: impl Into<String>, script: &'static str, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            script,
            args,
            rule: TextRule::NON_EMPTY,
        }
    }

    /// `FIRST_TEXT_OF` over a selector list.
    pub fn first_text_of(name: impl Into<String>, selectors: &[&str]) -> Self {
        Self::new(
            name,
            scripts::FIRST_TEXT_OF,
            vec![Value::from(selectors.to_vec())],
        )
    }

    pub fn rule(mut self, rule: TextRule) -> Self {
        self.rule = rule;
        self
    }
}

#[async_trait]
impl Strategy<String> for ScriptText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let value = backend.evaluate(self.script, self.args.clone()).await?;
        Ok(value_text(value))
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}

/// Longest qualifying text among every element a locator finds.
///
/// Texts outside the rule are dropped before ranking, so one oversized block
/// does not shadow a qualifying one.
pub struct LongestText {
    name: String,
    locator: Locator,
    rule: TextRule,
    scope: Option<ElementRef>,
    outside_comments: bool,
}

impl LongestText {
    pub fn new(name: impl Into<String>, locator: Locator, rule: TextRule) -> Self {
        Self {
            name: name.into(),
            locator,
            rule,
            scope: None,
            outside_comments: false,
        }
    }

    pub fn within(mut self, scope: ElementRef) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn outside_comments(mut self) -> Self {
        self.outside_comments = true;
        self
    }
}

#[async_trait]
impl Strategy<String> for LongestText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let elements = backend.query_all(&self.locator, self.scope.as_ref()).await?;
        let mut texts = Vec::new();
        for element in elements {
            if self.outside_comments && in_comment_region(backend, &element).await? {
                continue;
            }
            if let Some(text) = trimmed_text(backend, &element).await?
                && self.rule.accepts(&text)
            {
                texts.push(text);
            }
        }
        Ok(longest_text(texts))
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}

/// Longest descendant text of one element.
pub struct DescendantTexts {
    name: String,
    element: ElementRef,
    rule: TextRule,
}

impl DescendantTexts {
    pub fn new(name: impl Into<String>, element: ElementRef, rule: TextRule) -> Self {
        Self {
            name: name.into(),
            element,
            rule,
        }
    }
}

#[async_trait]
impl Strategy<String> for DescendantTexts {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let value = backend
            .call_on(&self.element, scripts::DESCENDANT_TEXTS)
            .await?;
        let texts = match value {
            Value::Array(items) => items
                .into_iter()
                .filter_map(value_text)
                .filter(|t| self.rule.accepts(t))
                .collect::<Vec<_>>(),
            _ => Vec::new(),
        };
        Ok(longest_text(texts))
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}

/// String returned by an element-level script.
pub struct ElementScript {
    name: String,
    element: ElementRef,
    function: &'static str,
    rule: TextRule,
}

impl ElementScript {
    pub fn new(name: impl Into<String>, element: ElementRef, function: &'static str) -> Self {
        Self {
            name: name.into(),
            element,
            function,
            rule: TextRule::NON_EMPTY,
        }
    }

    pub fn rule(mut self, rule: TextRule) -> Self {
        self.rule = rule;
        self
    }
}

#[async_trait]
impl Strategy<String> for ElementScript {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let value = backend.call_on(&self.element, self.function).await?;
        Ok(value_text(value))
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}

/// Full text of an element with a known fragment (usually the username)
/// removed.
pub struct StrippedText {
    name: String,
    element: ElementRef,
    strip: String,
    rule: TextRule,
}

impl StrippedText {
    pub fn new(name: impl Into<String>, element: ElementRef, strip: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            element,
            strip: strip.into(),
            rule: TextRule::NON_EMPTY,
        }
    }

    pub fn rule(mut self, rule: TextRule) -> Self {
        self.rule = rule;
        self
    }
}

#[async_trait]
impl Strategy<String> for StrippedText {
    fn name(&self) -> &str {
        &self.name
    }

    async fn probe(&self, backend: &mut dyn Backend) -> Result<Option<String>, BackendError> {
        let Some(full) = trimmed_text(backend, &self.element).await? else {
            return Ok(None);
        };
        let stripped = if self.strip.is_empty() {
            full
        } else {
            full.replacen(&self.strip, "", 1)
        };
        let stripped = stripped.trim();
        Ok((!stripped.is_empty()).then(|| stripped.to_string()))
    }

    fn accept(&self, candidate: &String) -> bool {
        self.rule.accepts(candidate)
    }
}
