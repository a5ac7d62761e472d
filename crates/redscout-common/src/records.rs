//! Structured records produced by the extraction and action engines.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// An extracted field: either a value some strategy accepted, or the
/// explicit unknown sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum FieldValue {
    Known(String),
    #[default]
    Unknown,
}

impl FieldValue {
    pub fn is_known(&self) -> bool {
        matches!(self, FieldValue::Known(_))
    }

    pub fn as_deref(&self) -> Option<&str> {
        match self {
            FieldValue::Known(s) => Some(s),
            FieldValue::Unknown => None,
        }
    }

    /// Render for people: the value, or `fallback` for the sentinel.
    pub fn or_label<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.as_deref().unwrap_or(fallback)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(s) => FieldValue::Known(s),
            None => FieldValue::Unknown,
        }
    }
}

impl From<FieldValue> for Option<String> {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Known(s) => Some(s),
            FieldValue::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteField {
    Title,
    Author,
    PublishedAt,
    Body,
}

impl fmt::Display for NoteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NoteField::Title => "title",
            NoteField::Author => "author",
            NoteField::PublishedAt => "published_at",
            NoteField::Body => "body",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteRecord {
    pub url: String,
    pub title: FieldValue,
    pub author: FieldValue,
    pub published_at: FieldValue,
    pub body: FieldValue,
    /// Which strategy produced each known field.
    #[serde(default)]
    pub provenance: BTreeMap<NoteField, String>,
}

impl NoteRecord {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: FieldValue::Unknown,
            author: FieldValue::Unknown,
            published_at: FieldValue::Unknown,
            body: FieldValue::Unknown,
            provenance: BTreeMap::new(),
        }
    }

    pub fn field(&self, field: NoteField) -> &FieldValue {
        match field {
            NoteField::Title => &self.title,
            NoteField::Author => &self.author,
            NoteField::PublishedAt => &self.published_at,
            NoteField::Body => &self.body,
        }
    }

    pub fn set(&mut self, field: NoteField, value: String, strategy: impl Into<String>) {
        let slot = match field {
            NoteField::Title => &mut self.title,
            NoteField::Author => &mut self.author,
            NoteField::PublishedAt => &mut self.published_at,
            NoteField::Body => &mut self.body,
        };
        *slot = FieldValue::Known(value);
        self.provenance.insert(field, strategy.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub username: String,
    pub content: String,
    pub posted_at: String,
}

impl CommentRecord {
    pub fn key(&self) -> (&str, &str) {
        (&self.username, &self.content)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub title: FieldValue,
}

impl SearchHit {
    /// Search results link to `/search_result/<id>`; the shareable form of
    /// the same note lives under `/explore/<id>`.
    pub fn display_url(&self) -> String {
        self.url.replace("/search_result/", "/explore/")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Comment,
    Like,
    Follow,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Comment => "comment",
            ActionKind::Like => "like",
            ActionKind::Follow => "follow",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub kind: ActionKind,
    pub succeeded: bool,
    pub already_done: bool,
    /// The post-condition was observed on the page after the mutation.
    pub verified: bool,
    pub detail: String,
}

impl ActionResult {
    pub fn already_done(kind: ActionKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            succeeded: true,
            already_done: true,
            verified: true,
            detail: detail.into(),
        }
    }

    pub fn not_found(kind: ActionKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            succeeded: false,
            already_done: false,
            verified: false,
            detail: detail.into(),
        }
    }

    pub fn performed(kind: ActionKind, verified: bool, detail: impl Into<String>) -> Self {
        Self {
            kind,
            succeeded: true,
            already_done: false,
            verified,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoginOutcome {
    AlreadyLoggedIn,
    Succeeded,
    TimedOut,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_field_serializes_as_null() {
        let mut record = NoteRecord::new("https://www.xiaohongshu.com/explore/abc");
        record.set(NoteField::Title, "Hello".into(), "title.detail_title");

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["title"], "Hello");
        assert!(json["author"].is_null());
        assert_eq!(json["provenance"]["title"], "title.detail_title");
    }

    #[test]
    fn display_url_rewrites_search_route() {
        let hit = SearchHit {
            url: "https://www.xiaohongshu.com/search_result/66aa?xsec_token=t".into(),
            title: FieldValue::Known("x".into()),
        };
        assert_eq!(
            hit.display_url(),
            "https://www.xiaohongshu.com/explore/66aa?xsec_token=t"
        );
    }
}
