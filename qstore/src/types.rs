//! Chapter and outline records plus the preview helpers used by read tools.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

pub type ChapterId = i64;
pub type OutlineId = i64;

/// Characters kept by [`content_preview`] before the `...` marker.
pub const PREVIEW_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    pub number: i64,
    pub title: String,
    pub prompt: String,
    pub content: String,
    pub word_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Chapter {
    pub fn preview(&self) -> ChapterPreview {
        ChapterPreview {
            id: self.id,
            number: self.number,
            title: self.title.clone(),
            prompt: self.prompt.clone(),
            content_preview: content_preview(&self.content),
            word_count: self.word_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChapterPreview {
    pub id: ChapterId,
    pub number: i64,
    pub title: String,
    pub prompt: String,
    #[serde(rename = "contentPreview")]
    pub content_preview: String,
    pub word_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChapterDraft {
    pub title: String,
    pub prompt: String,
    #[serde(default)]
    pub content: String,
}

impl ChapterDraft {
    pub fn new(title: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            prompt: prompt.into(),
            content: String::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Partial update. `None` fields keep their stored value.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub prompt: Option<String>,
    pub number: Option<i64>,
    pub content: Option<String>,
}

impl ChapterPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.prompt.is_none()
            && self.number.is_none()
            && self.content.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterStats {
    pub total: u64,
    pub min_id: Option<ChapterId>,
    pub max_id: Option<ChapterId>,
    pub min_number: Option<i64>,
    pub max_number: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outline {
    pub id: OutlineId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub prompt: String,
    pub content: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct OutlineDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub prompt: String,
    #[serde(default)]
    pub content: String,
}

impl OutlineDraft {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            prompt: String::new(),
            content: String::new(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }
}

/// Counts non-whitespace characters, which suits CJK prose as well as spaced scripts.
pub fn word_count(text: &str) -> i64 {
    text.chars().filter(|ch| !ch.is_whitespace()).count() as i64
}

/// First [`PREVIEW_CHARS`] characters of `text`, with `...` appended when cut.
pub fn content_preview(text: &str) -> String {
    let mut chars = text.char_indices();
    match chars.nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub(crate) fn now_unix_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default()
}
