#![allow(dead_code)]

use async_trait::async_trait;
use redscout_engine::backend::{
    Backend, BoundingBox, ElementRef, Locator, NavigationResult, ScrollTarget,
};
use redscout_engine::config::RedscoutConfig;
use redscout_engine::error::BackendError;
use redscout_engine::scripts;
use redscout_engine::{NoteService, SessionManager};
use redscout_engine::pacing::Pacer;
use regex::Regex;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const ROOT: &str = "https://www.xiaohongshu.com";

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Navigate(String),
    Query(Locator),
    Evaluate(String),
    Scroll(ScrollTarget),
    ScrollIntoView(u64),
    Click(u64),
    MouseClick(f64, f64),
    TypeText(String),
    PressKey(String),
    ReleaseElements,
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Click(_) | Call::MouseClick(..) | Call::TypeText(_) | Call::PressKey(_)
        )
    }
}

/// One node of the in-memory page. Css and XPath locators match by exact
/// string against `selectors`; text locators match against `text`.
#[derive(Debug, Clone, Default)]
pub struct FakeElement {
    pub selectors: Vec<String>,
    pub text: String,
    pub attrs: HashMap<String, String>,
    pub visible: bool,
    pub in_comment_region: bool,
    pub parent: Option<u64>,
    pub sibling_text: Option<String>,
    pub descendant_texts: Vec<String>,
    pub bbox: Option<BoundingBox>,
    pub click_fails: bool,
    pub text_fails: bool,
    pub revealed_by: Option<u64>,
    pub hide_on_click: bool,
    pub submits: bool,
    pub vanish_after: Option<usize>,
    pub on_click_attr: Option<(String, String)>,
    returned: usize,
}

impl FakeElement {
    pub fn new(selectors: &[&str], text: &str) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            text: text.to_string(),
            visible: true,
            ..Default::default()
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(&[], text)
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn within(mut self, parent: u64) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn in_comments(mut self) -> Self {
        self.in_comment_region = true;
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn sibling(mut self, text: &str) -> Self {
        self.sibling_text = Some(text.to_string());
        self
    }

    pub fn descendants(mut self, texts: &[&str]) -> Self {
        self.descendant_texts = texts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn bbox(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.bbox = Some(BoundingBox {
            x,
            y,
            width,
            height,
        });
        self
    }

    pub fn failing_click(mut self) -> Self {
        self.click_fails = true;
        self
    }

    pub fn failing_text(mut self) -> Self {
        self.text_fails = true;
        self
    }

    pub fn revealed_by(mut self, control: u64) -> Self {
        self.revealed_by = Some(control);
        self
    }

    pub fn hide_on_click(mut self) -> Self {
        self.hide_on_click = true;
        self
    }

    pub fn submits(mut self) -> Self {
        self.submits = true;
        self
    }

    pub fn vanish_after(mut self, times: usize) -> Self {
        self.vanish_after = Some(times);
        self
    }

    pub fn on_click_attr(mut self, name: &str, value: &str) -> Self {
        self.on_click_attr = Some((name.to_string(), value.to_string()));
        self
    }
}

#[derive(Debug, Default)]
pub struct FakePage {
    pub url: String,
    pub elements: Vec<FakeElement>,
    pub calls: Vec<Call>,
    pub clicked: HashSet<u64>,
    pub typed: String,
    pub url_unreadable: bool,
    pub fail_navigation: bool,
    /// Enter only adds a newline to the input instead of sending.
    pub enter_is_newline: bool,
    pub launches: usize,
    pub closes: usize,
}

impl FakePage {
    fn present(&self, id: usize) -> bool {
        let el = &self.elements[id];
        if let Some(control) = el.revealed_by
            && !self.clicked.contains(&control)
        {
            return false;
        }
        if let Some(limit) = el.vanish_after
            && el.returned >= limit
        {
            return false;
        }
        true
    }

    fn descends_from(&self, id: usize, scope: u64) -> bool {
        let mut current = self.elements[id].parent;
        while let Some(parent) = current {
            if parent == scope {
                return true;
            }
            current = self.elements.get(parent as usize).and_then(|p| p.parent);
        }
        false
    }

    fn matches(&self, id: usize, locator: &Locator) -> bool {
        let el = &self.elements[id];
        let text = el.text.trim();
        match locator {
            Locator::Css(s) | Locator::XPath(s) => el.selectors.iter().any(|sel| sel == s),
            Locator::Text(t) => text == t,
            Locator::TextContains(t) => text.contains(t.as_str()),
            Locator::TextMatches(p) => Regex::new(p).map(|re| re.is_match(text)).unwrap_or(false),
        }
    }

    fn element(&self, element: &ElementRef) -> Result<&FakeElement, BackendError> {
        let id = element.id() as usize;
        if id < self.elements.len() && self.present(id) {
            Ok(&self.elements[id])
        } else {
            Err(BackendError::ElementStale { id: element.id() })
        }
    }

    fn first_text_of(&self, selectors: &[Value]) -> Value {
        for selector in selectors.iter().filter_map(Value::as_str) {
            let locator = Locator::css(selector);
            let found = (0..self.elements.len())
                .filter(|&id| self.present(id) && self.matches(id, &locator))
                .map(|id| self.elements[id].text.trim().to_string())
                .next();
            if let Some(text) = found
                && !text.is_empty()
            {
                return json!(text);
            }
        }
        Value::Null
    }

    /// Clicked editable elements, i.e. where typed text lands.
    fn focused_inputs(&self) -> Vec<usize> {
        (0..self.elements.len())
            .filter(|&id| {
                self.clicked.contains(&(id as u64))
                    && self.elements[id]
                        .selectors
                        .iter()
                        .any(|s| s.contains("contenteditable"))
            })
            .collect()
    }

    /// Text of the first element carrying one of `selectors` outside any
    /// comment region, the way the note-body scripts pick their block.
    fn note_block_text(&self, selectors: &[&str]) -> Value {
        (0..self.elements.len())
            .filter(|&id| self.present(id) && !self.elements[id].in_comment_region)
            .filter(|&id| {
                self.elements[id]
                    .selectors
                    .iter()
                    .any(|s| selectors.contains(&s.as_str()))
            })
            .map(|id| self.elements[id].text.trim().to_string())
            .find(|text| !text.is_empty())
            .map_or(Value::Null, Value::from)
    }

    fn submit(&mut self) {
        if !self.typed.is_empty() {
            let posted = std::mem::take(&mut self.typed);
            for id in self.focused_inputs() {
                self.elements[id].text.clear();
            }
            self.elements
                .push(FakeElement::new(&["div.comment-item"], &posted));
        }
    }

    fn click_id(&mut self, id: u64) {
        self.clicked.insert(id);
        let el = &mut self.elements[id as usize];
        if el.hide_on_click {
            el.visible = false;
        }
        if let Some((name, value)) = el.on_click_attr.clone() {
            el.attrs.insert(name, value);
        }
        let submits = el.submits;
        if submits {
            self.submit();
        }
    }
}

#[derive(Clone)]
pub struct FakeBackend {
    page: Arc<Mutex<FakePage>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            page: Arc::new(Mutex::new(FakePage::default())),
        }
    }

    pub fn at(url: &str) -> Self {
        let backend = Self::new();
        backend.page().url = url.to_string();
        backend
    }

    pub fn page(&self) -> MutexGuard<'_, FakePage> {
        self.page.lock().unwrap()
    }

    pub fn add(&self, element: FakeElement) -> u64 {
        let mut page = self.page();
        page.elements.push(element);
        (page.elements.len() - 1) as u64
    }

    pub fn calls(&self) -> Vec<Call> {
        self.page().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Navigate(url) => Some(url),
                _ => None,
            })
            .collect()
    }

    pub fn queries_for(&self, locator: &Locator) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Query(l) if l == locator))
            .count()
    }

    fn record(&self, call: Call) {
        self.page().calls.push(call);
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        tokio::task::yield_now().await;
        self.page().launches += 1;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.page().closes += 1;
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        true
    }

    async fn navigate(
        &mut self,
        url: &str,
        _timeout: Duration,
    ) -> Result<NavigationResult, BackendError> {
        self.record(Call::Navigate(url.to_string()));
        let mut page = self.page();
        if page.fail_navigation {
            return Err(BackendError::Navigation(format!("{} unreachable", url)));
        }
        page.url = url.to_string();
        Ok(NavigationResult {
            url: url.to_string(),
            title: String::new(),
        })
    }

    fn release_elements(&mut self) {
        self.record(Call::ReleaseElements);
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let page = self.page();
        if page.url_unreadable {
            return Err(BackendError::Other("target closed".into()));
        }
        Ok(page.url.clone())
    }

    async fn query_all(
        &mut self,
        locator: &Locator,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, BackendError> {
        self.record(Call::Query(locator.clone()));
        let mut page = self.page();
        let ids: Vec<usize> = (0..page.elements.len())
            .filter(|&id| page.present(id) && page.matches(id, locator))
            .filter(|&id| scope.is_none_or(|s| page.descends_from(id, s.id())))
            .collect();
        for &id in &ids {
            page.elements[id].returned += 1;
        }
        Ok(ids.into_iter().map(|id| ElementRef::new(id as u64)).collect())
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, BackendError> {
        self.record(Call::Evaluate(script.to_string()));
        let mut page = self.page();
        let first = args.first().cloned().unwrap_or(Value::Null);

        if script == scripts::FIRST_TEXT_OF {
            let selectors = first.as_array().cloned().unwrap_or_default();
            return Ok(page.first_text_of(&selectors));
        }
        if script == scripts::NOTE_CONTENT_OR_PARAGRAPHS {
            return Ok(page.note_block_text(&[".note-content", "p"]));
        }
        if script == scripts::NOTE_STRUCTURE_TEXT {
            return Ok(page.note_block_text(&["div.note-content #detail-desc", "div.desc"]));
        }
        if script == scripts::MARK_COMMENT_REGIONS {
            let tagged = page.elements.iter().filter(|e| e.in_comment_region).count();
            return Ok(json!(tagged));
        }
        if script == scripts::HAS_EDITABLE {
            let needle = first.as_str().unwrap_or_default().to_string();
            let found = page.elements.iter().any(|e| {
                e.selectors.iter().any(|s| s.contains("contenteditable"))
                    || (!needle.is_empty() && e.text.contains(&needle))
            });
            return Ok(json!(found));
        }
        if script == scripts::CLICK_BUTTON_CONTAINING {
            let needle = first.as_str().unwrap_or_default().to_string();
            let button = (0..page.elements.len()).find(|&id| {
                page.present(id)
                    && page.elements[id].selectors.iter().any(|s| s == "button")
                    && page.elements[id].text.contains(&needle)
            });
            return Ok(match button {
                Some(id) => {
                    page.click_id(id as u64);
                    json!(true)
                }
                None => json!(false),
            });
        }
        Ok(Value::Null)
    }

    async fn call_on(
        &mut self,
        element: &ElementRef,
        function: &str,
    ) -> Result<Value, BackendError> {
        let page = self.page();
        let el = page.element(element)?;
        if function == scripts::IS_IN_COMMENT_REGION {
            return Ok(json!(el.in_comment_region));
        }
        if function == scripts::DESCENDANT_TEXTS {
            return Ok(json!(el.descendant_texts));
        }
        if function == scripts::SIBLING_TEXT {
            return Ok(json!(el.sibling_text));
        }
        Err(BackendError::NotSupported("unknown element script".into()))
    }

    async fn text_content(&mut self, element: &ElementRef) -> Result<Option<String>, BackendError> {
        let page = self.page();
        let el = page.element(element)?;
        if el.text_fails {
            return Err(BackendError::Script("detached".into()));
        }
        Ok(Some(el.text.clone()))
    }

    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        let page = self.page();
        Ok(page.element(element)?.attrs.get(name).cloned())
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), BackendError> {
        let mut page = self.page();
        if page.element(element)?.click_fails {
            return Err(BackendError::Other("element is covered".into()));
        }
        page.calls.push(Call::Click(element.id()));
        page.click_id(element.id());
        Ok(())
    }

    async fn is_visible(&mut self, element: &ElementRef) -> Result<bool, BackendError> {
        let page = self.page();
        Ok(page.element(element)?.visible)
    }

    async fn scroll_into_view(&mut self, element: &ElementRef) -> Result<(), BackendError> {
        self.page().element(element)?;
        self.record(Call::ScrollIntoView(element.id()));
        Ok(())
    }

    async fn bounding_box(
        &mut self,
        element: &ElementRef,
    ) -> Result<Option<BoundingBox>, BackendError> {
        let page = self.page();
        Ok(page.element(element)?.bbox)
    }

    async fn scroll(&mut self, target: ScrollTarget) -> Result<(), BackendError> {
        self.record(Call::Scroll(target));
        Ok(())
    }

    async fn type_text(&mut self, text: &str) -> Result<(), BackendError> {
        let mut page = self.page();
        page.calls.push(Call::TypeText(text.to_string()));
        page.typed.push_str(text);
        for id in page.focused_inputs() {
            page.elements[id].text.push_str(text);
        }
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        let mut page = self.page();
        page.calls.push(Call::PressKey(key.to_string()));
        if key == "Enter" {
            if page.enter_is_newline {
                for id in page.focused_inputs() {
                    page.elements[id].text.push('\n');
                }
            } else {
                page.submit();
            }
        }
        Ok(())
    }

    async fn mouse_click(&mut self, x: f64, y: f64) -> Result<(), BackendError> {
        let mut page = self.page();
        page.calls.push(Call::MouseClick(x, y));
        let hit = (0..page.elements.len()).find(|&id| {
            page.present(id)
                && page.elements[id].bbox.is_some_and(|b| {
                    x >= b.x && x <= b.x + b.width && y >= b.y && y <= b.y + b.height
                })
        });
        if let Some(id) = hit {
            page.click_id(id as u64);
        }
        Ok(())
    }
}

pub fn factory(backend: &FakeBackend) -> redscout_engine::BackendFactory {
    let backend = backend.clone();
    Box::new(move || Box::new(backend.clone()))
}

/// A factory that counts how many backends it built.
pub fn counting_factory(
    backend: &FakeBackend,
    built: Arc<AtomicUsize>,
) -> redscout_engine::BackendFactory {
    let backend = backend.clone();
    Box::new(move || {
        built.fetch_add(1, Ordering::SeqCst);
        Box::new(backend.clone())
    })
}

pub fn service(backend: &FakeBackend) -> NoteService {
    NoteService::new(
        RedscoutConfig::default(),
        factory(backend),
        CancellationToken::new(),
    )
}

pub fn session_manager(backend: &FakeBackend) -> SessionManager {
    let config = RedscoutConfig::default();
    SessionManager::new(
        factory(backend),
        config.site,
        config.timing,
        Pacer::default(),
    )
}

pub fn note_url(id: &str) -> String {
    format!("{}/explore/{}", ROOT, id)
}
