//! Conversation builders for the chapter-planning and outline-writing flows.
//!
//! Each builder reads the store for context and returns the opening
//! conversation; running it is left to [`qchat::ChatService`].

use std::fmt::{Display, Formatter};

use qchat::ProtocolMessage;
use qstore::{Chapter, Outline, OutlineId, StoreError, StoreErrorKind, WritingStore};

/// Existing chapters shown to the model when planning new ones.
pub const LATEST_CHAPTER_CONTEXT: usize = 5;

const CHAPTER_PLANNER_PROMPT: &str = "\
You are a novelist's assistant. Plan new chapters for the user's novel and save them with the create_chapter tool.
1. Create exactly the number of chapters the user asks for; each chapter has a title and a prompt.
2. Titles must be specific and must not include the chapter number.
3. Create at most 10 chapters per tool call; split larger requests into several calls.
4. A prompt is an instruction for a writing model: describe the chapter's characters, setting, main actions, and 3-5 key plot points.
5. Chapters must follow on from each other; when a chapter picks up a thread from an earlier one, say which chapter in its prompt.
6. Check which chapters already exist and never create duplicates.
7. If a tool call fails, retry with fewer chapters per call.
8. When every chapter is created, finish without asking the user anything further.";

const OUTLINE_WRITER_PROMPT: &str = "\
You are a novelist's assistant. Write the body of one outline entry (a character, location, faction, or plot setting) for the user's novel.
Use the read tools to check existing chapters and outlines so the entry stays consistent with them.
Reply with the outline content only, without preamble.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateErrorKind {
    InvalidRequest,
    NotFound,
    Storage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateError {
    pub kind: GenerateErrorKind,
    pub message: String,
}

impl GenerateError {
    pub fn new(kind: GenerateErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::InvalidRequest, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(GenerateErrorKind::NotFound, message)
    }

    pub fn is_user_error(&self) -> bool {
        !matches!(self.kind, GenerateErrorKind::Storage)
    }
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for GenerateError {}

impl From<StoreError> for GenerateError {
    fn from(value: StoreError) -> Self {
        let kind = match value.kind {
            StoreErrorKind::NotFound => GenerateErrorKind::NotFound,
            StoreErrorKind::InvalidRequest => GenerateErrorKind::InvalidRequest,
            StoreErrorKind::Storage => GenerateErrorKind::Storage,
        };
        Self::new(kind, value.message)
    }
}

/// Request to append `count` planned chapters after the existing ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterPlanRequest {
    pub count: u32,
    /// Outline the new chapters should lean on.
    pub outline_id: Option<OutlineId>,
    pub prompt: Option<String>,
}

impl ChapterPlanRequest {
    pub fn new(count: u32) -> Self {
        Self {
            count,
            outline_id: None,
            prompt: None,
        }
    }

    pub fn with_outline(mut self, outline_id: OutlineId) -> Self {
        self.outline_id = Some(outline_id);
        self
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }
}

/// Request to write (or rewrite) the body of one outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineContentRequest {
    pub outline_id: Option<OutlineId>,
    pub prompt: String,
    pub old_content: Option<String>,
}

impl OutlineContentRequest {
    pub fn new(outline_id: OutlineId, prompt: impl Into<String>) -> Self {
        Self {
            outline_id: Some(outline_id),
            prompt: prompt.into(),
            old_content: None,
        }
    }

    pub fn with_old_content(mut self, content: impl Into<String>) -> Self {
        self.old_content = Some(content.into());
        self
    }
}

pub async fn chapter_list_conversation(
    store: &dyn WritingStore,
    request: &ChapterPlanRequest,
) -> Result<Vec<ProtocolMessage>, GenerateError> {
    if request.count < 1 {
        return Err(GenerateError::invalid_request(
            "chapter count must be at least 1",
        ));
    }

    let outlines = store.all_outlines().await?;
    let chapters = store.all_chapters().await?;

    let mut messages = vec![
        ProtocolMessage::system(CHAPTER_PLANNER_PROMPT),
        ProtocolMessage::system(story_context(&outlines, &chapters)),
        ProtocolMessage::user(format!(
            "Append {} new chapters after the existing ones.",
            request.count
        )),
    ];

    // A missing focus outline is skipped rather than failing the run.
    if let Some(outline_id) = request.outline_id
        && let Some(outline) = store.outline_by_id(outline_id).await?
    {
        messages.push(ProtocolMessage::user(format!(
            "Pay particular attention to this outline:\n{}",
            outline_line(&outline)
        )));
    }

    if let Some(prompt) = request.prompt.as_deref().map(str::trim)
        && !prompt.is_empty()
    {
        messages.push(ProtocolMessage::user(format!(
            "Additional requirements: {prompt}"
        )));
    }

    Ok(messages)
}

pub async fn outline_content_conversation(
    store: &dyn WritingStore,
    request: &OutlineContentRequest,
) -> Result<Vec<ProtocolMessage>, GenerateError> {
    let Some(outline_id) = request.outline_id else {
        return Err(GenerateError::invalid_request("an outline id is required"));
    };

    let prompt = request.prompt.trim();
    if prompt.is_empty() {
        return Err(GenerateError::invalid_request(
            "a generation prompt is required",
        ));
    }

    let outline = store
        .outline_by_id(outline_id)
        .await?
        .ok_or_else(|| GenerateError::not_found(format!("no outline with id {outline_id}")))?;

    let mut messages = vec![
        ProtocolMessage::system(OUTLINE_WRITER_PROMPT),
        ProtocolMessage::system(format!(
            "Outline to write: 【{}】{} (id {})",
            outline.kind, outline.name, outline.id
        )),
    ];

    if let Some(old) = request.old_content.as_deref().map(str::trim)
        && !old.is_empty()
    {
        messages.push(ProtocolMessage::system(format!(
            "Current content, to be revised:\n{old}"
        )));
    }

    messages.push(ProtocolMessage::user(prompt));
    Ok(messages)
}

fn story_context(outlines: &[Outline], chapters: &[Chapter]) -> String {
    let outline_block = if outlines.is_empty() {
        "(none yet)".to_string()
    } else {
        outlines
            .iter()
            .map(outline_line)
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mut latest: Vec<&Chapter> = chapters.iter().collect();
    latest.sort_by(|a, b| b.number.cmp(&a.number));
    latest.truncate(LATEST_CHAPTER_CONTEXT);

    let chapter_block = if latest.is_empty() {
        "No chapters exist yet; plan the new chapters from the outlines alone.".to_string()
    } else {
        let lines = latest
            .iter()
            .map(|chapter| {
                format!(
                    "Chapter {} {}: {}",
                    chapter.number,
                    chapter.title,
                    or_placeholder(&chapter.prompt, "(no prompt)")
                )
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "Latest {} chapters:\n{lines}\nKeep the new chapters consistent with the outlines and these chapters.",
            latest.len()
        )
    };

    format!("Existing outlines:\n{outline_block}\n\n{chapter_block}")
}

fn outline_line(outline: &Outline) -> String {
    format!(
        "【{}】{}: {}",
        outline.kind,
        outline.name,
        or_placeholder(&outline.content, "(no content)")
    )
}

fn or_placeholder<'a>(value: &'a str, placeholder: &'a str) -> &'a str {
    if value.trim().is_empty() {
        placeholder
    } else {
        value
    }
}
