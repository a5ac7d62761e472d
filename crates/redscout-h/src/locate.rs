//! Locators CSS cannot express are resolved by tagging the matches with a
//! one-shot attribute, then querying that attribute.

use redscout_common::Locator;
use serde_json::{Value, json};

pub const PROBE_ATTRIBUTE: &str = "data-redscout-probe";

/// `(kind, needle, attribute, token) -> number`. Text kinds match the
/// innermost elements whose trimmed text satisfies the predicate.
pub const TAG_MATCHES: &str = r#"(kind, needle, attribute, token) => {
    let test;
    if (kind === 'text') {
        test = (t) => t === needle;
    } else if (kind === 'contains') {
        test = (t) => t.includes(needle);
    } else if (kind === 'regex') {
        const re = new RegExp(needle);
        test = (t) => re.test(t);
    }

    const matched = [];
    if (kind === 'xpath') {
        const snapshot = document.evaluate(
            needle, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null);
        for (let i = 0; i < snapshot.snapshotLength; i++) {
            const node = snapshot.snapshotItem(i);
            if (node.nodeType === Node.ELEMENT_NODE) {
                matched.push(node);
            }
        }
    } else {
        const hits = new Set();
        for (const el of document.querySelectorAll('body *')) {
            if (el.tagName === 'SCRIPT' || el.tagName === 'STYLE') continue;
            if (test((el.textContent || '').trim())) hits.add(el);
        }
        for (const el of hits) {
            let inner = true;
            for (const child of el.children) {
                if (hits.has(child)) { inner = false; break; }
            }
            if (inner) matched.push(el);
        }
    }

    matched.forEach((el) => el.setAttribute(attribute, token));
    return matched.length;
}"#;

pub const CLEAR_TAGS: &str = r#"(attribute, token) => {
    document.querySelectorAll(`[${attribute}="${token}"]`)
        .forEach((el) => el.removeAttribute(attribute));
}"#;

pub const TEXT_CONTENT: &str = "function() { return this.textContent; }";

pub const IS_VISIBLE: &str = r#"function() {
    const style = window.getComputedStyle(this);
    if (style.display === 'none' || style.visibility === 'hidden' || style.opacity === '0') {
        return false;
    }
    const rect = this.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
}"#;

pub const SCROLL_BY: &str = "(dy) => window.scrollBy(0, dy)";
pub const SCROLL_TOP: &str = "() => window.scrollTo(0, 0)";
pub const SCROLL_BOTTOM: &str = "() => window.scrollTo(0, document.body.scrollHeight)";

/// How a locator is resolved in the page.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Plain CSS query.
    Css(String),
    /// Run `TAG_MATCHES` with these arguments (minus attribute and token),
    /// then query the tag.
    Tagged { kind: &'static str, needle: String },
}

pub fn resolution(locator: &Locator) -> Resolution {
    match locator {
        Locator::Css(selector) => Resolution::Css(selector.clone()),
        Locator::Text(text) => Resolution::Tagged {
            kind: "text",
            needle: text.clone(),
        },
        Locator::TextContains(text) => Resolution::Tagged {
            kind: "contains",
            needle: text.clone(),
        },
        Locator::TextMatches(pattern) => Resolution::Tagged {
            kind: "regex",
            needle: pattern.clone(),
        },
        Locator::XPath(path) => Resolution::Tagged {
            kind: "xpath",
            needle: path.clone(),
        },
    }
}

pub fn tag_args(kind: &str, needle: &str, token: &str) -> Vec<Value> {
    vec![json!(kind), json!(needle), json!(PROBE_ATTRIBUTE), json!(token)]
}

pub fn tag_selector(token: &str) -> String {
    format!("[{}=\"{}\"]", PROBE_ATTRIBUTE, token)
}
