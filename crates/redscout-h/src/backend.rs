use crate::cdp::CdpClient;
use crate::inject::{call_function, call_on_element, retry_on_context_error};
use crate::locate::{self, PROBE_ATTRIBUTE, Resolution};
use async_trait::async_trait;
use chromiumoxide::Page;
use chromiumoxide::cdp::browser_protocol::input::{
    DispatchKeyEventParams, DispatchKeyEventType, DispatchMouseEventParams,
    DispatchMouseEventType, InsertTextParams, MouseButton,
};
use chromiumoxide::element::Element;
use redscout_common::{
    Backend, BackendError, BoundingBox, ElementRef, Locator, NavigationResult, ScrollTarget,
};
use redscout_engine::config::BrowserConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// Drives one Chromium page. Element handles live in a registry that is
/// cleared on every navigation.
pub struct ChromiumBackend {
    config: BrowserConfig,
    client: Option<CdpClient>,
    elements: HashMap<u64, Element>,
    next_element: u64,
    next_probe: u64,
}

impl ChromiumBackend {
    pub fn new(config: BrowserConfig) -> Self {
        Self {
            config,
            client: None,
            elements: HashMap::new(),
            next_element: 0,
            next_probe: 0,
        }
    }

    pub fn client(&self) -> Option<&CdpClient> {
        self.client.as_ref()
    }

    fn page(&self) -> Result<Page, BackendError> {
        self.client
            .as_ref()
            .map(|c| c.page.clone())
            .ok_or(BackendError::NotReady)
    }

    /// Element handles currently held.
    pub fn registered_elements(&self) -> usize {
        self.elements.len()
    }

    fn element(&self, element: &ElementRef) -> Result<&Element, BackendError> {
        self.elements
            .get(&element.id())
            .ok_or(BackendError::ElementStale { id: element.id() })
    }

    fn register(&mut self, found: Vec<Element>) -> Vec<ElementRef> {
        found
            .into_iter()
            .map(|element| {
                self.next_element += 1;
                self.elements.insert(self.next_element, element);
                ElementRef::new(self.next_element)
            })
            .collect()
    }

    async fn find_css(
        &self,
        page: &Page,
        selector: &str,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<Element>, BackendError> {
        let found = match scope {
            None => retry_on_context_error("Query", move || page.find_elements(selector)).await,
            Some(scope) => {
                let parent = self.element(scope)?;
                retry_on_context_error("Scoped query", move || parent.find_elements(selector))
                    .await
            }
        };
        found.map_err(|e| {
            debug!(selector, error = %e, "Query failed");
            BackendError::SelectorInvalid {
                selector: selector.to_string(),
            }
        })
    }

    async fn find_tagged(
        &mut self,
        page: &Page,
        kind: &str,
        needle: &str,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<Element>, BackendError> {
        self.next_probe += 1;
        let token = self.next_probe.to_string();

        call_function(page, locate::TAG_MATCHES, &locate::tag_args(kind, needle, &token))
            .await
            .map_err(|e| match e {
                BackendError::Script(msg) if kind == "regex" || kind == "xpath" => {
                    debug!(needle, error = %msg, "Pattern rejected by the page");
                    BackendError::SelectorInvalid {
                        selector: needle.to_string(),
                    }
                }
                other => other,
            })?;

        let found = self.find_css(page, &locate::tag_selector(&token), scope).await;

        let clear = [json!(PROBE_ATTRIBUTE), json!(token)];
        if let Err(e) = call_function(page, locate::CLEAR_TAGS, &clear).await {
            debug!(error = %e, "Clearing probe tags failed");
        }
        found
    }
}

/// Virtual key code and typed text for keys that need them.
fn key_definition(key: &str) -> (Option<i64>, Option<&'static str>) {
    match key {
        "Enter" => (Some(13), Some("\r")),
        "Tab" => (Some(9), None),
        "Escape" => (Some(27), None),
        "Backspace" => (Some(8), None),
        _ => (None, None),
    }
}

#[async_trait]
impl Backend for ChromiumBackend {
    async fn launch(&mut self) -> Result<(), BackendError> {
        if self.client.is_some() {
            return Ok(());
        }
        info!("Launching Chromium backend...");
        self.client = Some(CdpClient::launch(&self.config).await?);
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BackendError> {
        self.elements.clear();
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }

    async fn is_ready(&self) -> bool {
        self.client.is_some()
    }

    fn release_elements(&mut self) {
        debug!(count = self.elements.len(), "Releasing element handles");
        self.elements.clear();
    }

    async fn navigate(
        &mut self,
        url: &str,
        timeout: Duration,
    ) -> Result<NavigationResult, BackendError> {
        let page = self.page()?;
        self.elements.clear();

        info!("Navigating to: {}", url);
        match tokio::time::timeout(timeout, page.goto(url)).await {
            Err(_) => {
                return Err(BackendError::Timeout {
                    operation: format!("navigation to {}", url),
                });
            }
            Ok(Err(e)) => return Err(BackendError::Navigation(e.to_string())),
            Ok(Ok(_)) => {}
        }

        let title = page.get_title().await.ok().flatten().unwrap_or_default();
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Navigation(e.to_string()))?
            .unwrap_or_default();
        Ok(NavigationResult { url, title })
    }

    async fn current_url(&mut self) -> Result<String, BackendError> {
        let page = self.page()?;
        let url = page
            .url()
            .await
            .map_err(|e| BackendError::Other(format!("Cannot read url: {}", e)))?;
        Ok(url.unwrap_or_default())
    }

    async fn query_all(
        &mut self,
        locator: &Locator,
        scope: Option<&ElementRef>,
    ) -> Result<Vec<ElementRef>, BackendError> {
        let page = self.page()?;
        let found = match locate::resolution(locator) {
            Resolution::Css(selector) => self.find_css(&page, &selector, scope).await?,
            Resolution::Tagged { kind, needle } => {
                self.find_tagged(&page, kind, &needle, scope).await?
            }
        };
        Ok(self.register(found))
    }

    async fn evaluate(&mut self, script: &str, args: Vec<Value>) -> Result<Value, BackendError> {
        let page = self.page()?;
        call_function(&page, script, &args).await
    }

    async fn call_on(
        &mut self,
        element: &ElementRef,
        function: &str,
    ) -> Result<Value, BackendError> {
        let page = self.page()?;
        call_on_element(&page, self.element(element)?, function).await
    }

    async fn text_content(&mut self, element: &ElementRef) -> Result<Option<String>, BackendError> {
        let page = self.page()?;
        let value = call_on_element(&page, self.element(element)?, locate::TEXT_CONTENT).await?;
        Ok(value.as_str().map(str::to_string))
    }

    async fn attribute(
        &mut self,
        element: &ElementRef,
        name: &str,
    ) -> Result<Option<String>, BackendError> {
        self.element(element)?
            .attribute(name)
            .await
            .map_err(|e| BackendError::Script(e.to_string()))
    }

    async fn click(&mut self, element: &ElementRef) -> Result<(), BackendError> {
        self.element(element)?
            .click()
            .await
            .map_err(|e| BackendError::Other(format!("Click failed: {}", e)))?;
        Ok(())
    }

    async fn is_visible(&mut self, element: &ElementRef) -> Result<bool, BackendError> {
        let page = self.page()?;
        let value = call_on_element(&page, self.element(element)?, locate::IS_VISIBLE).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    async fn scroll_into_view(&mut self, element: &ElementRef) -> Result<(), BackendError> {
        self.element(element)?
            .scroll_into_view()
            .await
            .map_err(|e| BackendError::Other(format!("Scroll into view failed: {}", e)))?;
        Ok(())
    }

    async fn bounding_box(
        &mut self,
        element: &ElementRef,
    ) -> Result<Option<BoundingBox>, BackendError> {
        match self.element(element)?.bounding_box().await {
            Ok(b) => Ok(Some(BoundingBox {
                x: b.x,
                y: b.y,
                width: b.width,
                height: b.height,
            })),
            // Detached or display:none elements have no box model.
            Err(e) => {
                debug!(element = %element, error = %e, "No bounding box");
                Ok(None)
            }
        }
    }

    async fn scroll(&mut self, target: ScrollTarget) -> Result<(), BackendError> {
        let page = self.page()?;
        match target {
            ScrollTarget::By(dy) => call_function(&page, locate::SCROLL_BY, &[json!(dy)]).await?,
            ScrollTarget::Top => call_function(&page, locate::SCROLL_TOP, &[]).await?,
            ScrollTarget::Bottom => call_function(&page, locate::SCROLL_BOTTOM, &[]).await?,
        };
        Ok(())
    }

    async fn type_text(&mut self, text: &str) -> Result<(), BackendError> {
        let page = self.page()?;
        page.execute(InsertTextParams::new(text))
            .await
            .map_err(|e| BackendError::Other(format!("Typing failed: {}", e)))?;
        Ok(())
    }

    async fn press_key(&mut self, key: &str) -> Result<(), BackendError> {
        let page = self.page()?;
        let (code, text) = key_definition(key);

        for event_type in [DispatchKeyEventType::KeyDown, DispatchKeyEventType::KeyUp] {
            let mut builder = DispatchKeyEventParams::builder()
                .r#type(event_type.clone())
                .key(key)
                .code(key);
            if let Some(code) = code {
                builder = builder
                    .windows_virtual_key_code(code)
                    .native_virtual_key_code(code);
            }
            if event_type == DispatchKeyEventType::KeyDown
                && let Some(text) = text
            {
                builder = builder.text(text);
            }
            let event = builder
                .build()
                .map_err(|e| BackendError::Other(format!("Failed to build key event: {}", e)))?;
            page.execute(event)
                .await
                .map_err(|e| BackendError::Other(format!("press_key failed: {}", e)))?;
        }
        Ok(())
    }

    async fn mouse_click(&mut self, x: f64, y: f64) -> Result<(), BackendError> {
        let page = self.page()?;
        for event_type in [
            DispatchMouseEventType::MousePressed,
            DispatchMouseEventType::MouseReleased,
        ] {
            let event = DispatchMouseEventParams::builder()
                .r#type(event_type)
                .x(x)
                .y(y)
                .button(MouseButton::Left)
                .click_count(1)
                .build()
                .map_err(|e| BackendError::Other(format!("Failed to build mouse event: {}", e)))?;
            page.execute(event)
                .await
                .map_err(|e| BackendError::Other(format!("mouse_click failed: {}", e)))?;
        }
        Ok(())
    }
}
