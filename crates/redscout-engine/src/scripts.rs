//! JavaScript run inside the page.
//!
//! Page-level scripts are function expressions called with JSON arguments via
//! `Backend::evaluate`; element-level scripts are function declarations called
//! with `this` bound to an element via `Backend::call_on`.

/// `(selectors: string[]) -> string | null`: trimmed text of the first
/// selector that matches an element with non-empty text.
pub const FIRST_TEXT_OF: &str = r#"(selectors) => {
    for (const selector of selectors) {
        try {
            const el = document.querySelector(selector);
            if (el && el.textContent && el.textContent.trim()) {
                return el.textContent.trim();
            }
        } catch (e) {}
    }
    return null;
}"#;

/// `(patterns: string[]) -> string | null`: first regex hit in the body text.
pub const FIRST_TEXT_MATCH: &str = r#"(patterns) => {
    const text = document.body ? document.body.textContent || '' : '';
    for (const pattern of patterns) {
        try {
            const match = text.match(new RegExp(pattern));
            if (match) {
                return match[0];
            }
        } catch (e) {}
    }
    return null;
}"#;

/// `(selectors: string[]) -> number`: tags every match with
/// `data-is-comment="true"` and returns how many were tagged.
pub const MARK_COMMENT_REGIONS: &str = r#"(selectors) => {
    let tagged = 0;
    for (const selector of selectors) {
        try {
            document.querySelectorAll(selector).forEach((el) => {
                el.setAttribute('data-is-comment', 'true');
                tagged++;
            });
        } catch (e) {}
    }
    return tagged;
}"#;

/// `() -> string | null`: the note-content block, preferring its `.note-text`,
/// else paragraphs joined by blank lines. Nothing inside a comment region is
/// returned.
pub const NOTE_CONTENT_OR_PARAGRAPHS: &str = r#"() => {
    const inComments = (el) => !!el.closest('.comments-container, .comment-list, .feed-comment, [data-is-comment="true"]');
    for (const noteContent of document.querySelectorAll('.note-content')) {
        if (inComments(noteContent)) continue;
        const noteText = noteContent.querySelector('.note-text');
        if (noteText && !inComments(noteText) && noteText.textContent.trim().length > 50) {
            return noteText.textContent.trim();
        }
        if (noteContent.textContent.trim().length > 50) {
            return noteContent.textContent.trim();
        }
    }
    const paragraphs = Array.from(document.querySelectorAll('p')).filter((p) => {
        return !inComments(p) && p.textContent.trim().length > 10;
    });
    if (paragraphs.length > 0) {
        return paragraphs.map((p) => p.textContent.trim()).join('\n\n');
    }
    return null;
}"#;

/// `() -> string | null`: `div.note-content #detail-desc` by structure, else
/// the first long `div.desc`. Comment regions are skipped on every path.
pub const NOTE_STRUCTURE_TEXT: &str = r#"() => {
    const inComments = (el) => !!el.closest('.comments-container, .comment-list, .feed-comment, [data-is-comment="true"]');
    for (const noteContent of document.querySelectorAll('div.note-content')) {
        if (inComments(noteContent)) continue;
        const detailDesc = noteContent.querySelector('#detail-desc');
        if (detailDesc && !inComments(detailDesc)) {
            const noteText = detailDesc.querySelector('span.note-text');
            return (noteText || detailDesc).textContent.trim();
        }
    }
    for (const desc of document.querySelectorAll('div.desc')) {
        if (!inComments(desc) && desc.textContent.trim().length > 100) {
            return desc.textContent.trim();
        }
    }
    return null;
}"#;

/// `() -> null`: scroll to the bottom, the middle, then back to the top so
/// lazily loaded blocks render.
pub const SCROLL_THROUGH: &str = r#"() => {
    window.scrollTo(0, document.body.scrollHeight);
    setTimeout(() => { window.scrollTo(0, document.body.scrollHeight / 2); }, 1000);
    setTimeout(() => { window.scrollTo(0, 0); }, 2000);
    return null;
}"#;

/// `(placeholder: string) -> bool`: whether any editable element, or any
/// element showing the input placeholder, exists.
pub const HAS_EDITABLE: &str = r#"(placeholder) => {
    if (document.querySelectorAll('[contenteditable="true"]').length > 0) {
        return true;
    }
    return Array.from(document.querySelectorAll('*'))
        .some((el) => el.textContent && el.textContent.includes(placeholder));
}"#;

/// `(text: string) -> bool`: clicks the first `button` containing `text`.
pub const CLICK_BUTTON_CONTAINING: &str = r#"(text) => {
    const button = Array.from(document.querySelectorAll('button'))
        .find((b) => b.textContent && b.textContent.includes(text));
    if (button) {
        button.click();
        return true;
    }
    return false;
}"#;

/// Element script: whether the element sits inside a comment region.
pub const IS_IN_COMMENT_REGION: &str = r#"function() {
    return !!this.closest('[data-is-comment="true"], .comments-container, .comment-list, .feed-comment, .comment-item');
}"#;

/// Element script: texts of all descendants longer than five characters.
pub const DESCENDANT_TEXTS: &str = r#"function() {
    return Array.from(this.querySelectorAll('*'))
        .map((node) => (node.textContent || '').trim())
        .filter((text) => text.length > 5);
}"#;

/// Element script: the text beside a profile link, i.e. the nearest non-empty
/// next sibling, else the parent's text with the link text removed.
pub const SIBLING_TEXT: &str = r#"function() {
    let sibling = this.nextElementSibling;
    while (sibling) {
        const text = sibling.textContent.trim();
        if (text) return text;
        sibling = sibling.nextElementSibling;
    }
    const parent = this.parentElement;
    if (!parent) return null;
    const own = this.textContent.trim();
    const all = parent.textContent.trim();
    if (all && own && all.includes(own)) {
        return all.replace(own, '').trim() || null;
    }
    return null;
}"#;
