//! Persistence trait for chapters and outlines, plus the in-memory backend.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use qcommon::BoxFuture;

use crate::backends::sqlite::default_sqlite_path;
use crate::error::StoreError;
use crate::types::{
    Chapter, ChapterDraft, ChapterId, ChapterPatch, ChapterStats, Outline, OutlineDraft,
    OutlineId, now_unix_secs, word_count,
};

pub use crate::backends::sqlite::SqliteWritingStore;

/// Chapter and outline persistence.
///
/// Every operation is atomic on its own; callers may issue operations
/// concurrently. New chapters are numbered `max(number) + 1`.
pub trait WritingStore: Send + Sync {
    fn create_chapter<'a>(
        &'a self,
        draft: ChapterDraft,
    ) -> BoxFuture<'a, Result<Chapter, StoreError>>;

    /// Returns the number of changed records (0 when `id` does not exist).
    fn update_chapter<'a>(
        &'a self,
        id: ChapterId,
        patch: ChapterPatch,
    ) -> BoxFuture<'a, Result<u64, StoreError>>;

    fn delete_chapter<'a>(&'a self, id: ChapterId) -> BoxFuture<'a, Result<u64, StoreError>>;

    fn chapter_by_id<'a>(
        &'a self,
        id: ChapterId,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>>;

    fn chapter_by_number<'a>(
        &'a self,
        number: i64,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>>;

    /// Chapters with `start <= number <= end`, ordered by number then id.
    fn chapters_by_number_range<'a>(
        &'a self,
        start: i64,
        end: i64,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>>;

    /// Chapters with `start <= id <= end`, ordered by id.
    fn chapters_by_id_range<'a>(
        &'a self,
        start: ChapterId,
        end: ChapterId,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>>;

    fn all_chapters<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>>;

    fn chapter_stats<'a>(&'a self) -> BoxFuture<'a, Result<ChapterStats, StoreError>>;

    fn create_outline<'a>(
        &'a self,
        draft: OutlineDraft,
    ) -> BoxFuture<'a, Result<Outline, StoreError>>;

    fn outline_by_id<'a>(
        &'a self,
        id: OutlineId,
    ) -> BoxFuture<'a, Result<Option<Outline>, StoreError>>;

    fn all_outlines<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Outline>, StoreError>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Sqlite { path: PathBuf },
    InMemory,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

pub fn create_writing_store(config: StoreConfig) -> Result<Arc<dyn WritingStore>, StoreError> {
    match config {
        StoreConfig::Sqlite { path } => Ok(Arc::new(SqliteWritingStore::new(path)?)),
        StoreConfig::InMemory => Ok(Arc::new(InMemoryWritingStore::new())),
    }
}

pub fn create_default_writing_store() -> Result<Arc<dyn WritingStore>, StoreError> {
    create_writing_store(StoreConfig::default())
}

pub(crate) fn validate_draft(draft: &ChapterDraft) -> Result<(), StoreError> {
    if draft.title.trim().is_empty() {
        return Err(StoreError::invalid_request("chapter title must not be empty"));
    }

    Ok(())
}

pub(crate) fn validate_patch(patch: &ChapterPatch) -> Result<(), StoreError> {
    if patch.is_empty() {
        return Err(StoreError::invalid_request(
            "chapter update must set at least one field",
        ));
    }

    if let Some(number) = patch.number
        && number < 1
    {
        return Err(StoreError::invalid_request(
            "chapter number must be at least 1",
        ));
    }

    Ok(())
}

pub(crate) fn number_in_use(number: i64, owner: ChapterId) -> StoreError {
    StoreError::invalid_request(format!(
        "chapter number {number} is already used by chapter id {owner}"
    ))
}

pub(crate) fn validate_outline(draft: &OutlineDraft) -> Result<(), StoreError> {
    if draft.name.trim().is_empty() {
        return Err(StoreError::invalid_request("outline name must not be empty"));
    }

    if draft.kind.trim().is_empty() {
        return Err(StoreError::invalid_request("outline type must not be empty"));
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct InMemoryWritingStore {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    chapters: Vec<Chapter>,
    outlines: Vec<Outline>,
    next_chapter_id: ChapterId,
    next_outline_id: OutlineId,
}

impl InMemoryWritingStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::storage("memory store lock poisoned"))
    }
}

fn sorted_by_number(mut chapters: Vec<Chapter>) -> Vec<Chapter> {
    chapters.sort_by_key(|chapter| (chapter.number, chapter.id));
    chapters
}

impl WritingStore for InMemoryWritingStore {
    fn create_chapter<'a>(
        &'a self,
        draft: ChapterDraft,
    ) -> BoxFuture<'a, Result<Chapter, StoreError>> {
        Box::pin(async move {
            validate_draft(&draft)?;
            let mut state = self.state()?;
            state.next_chapter_id += 1;

            let now = now_unix_secs();
            let number = state
                .chapters
                .iter()
                .map(|chapter| chapter.number)
                .max()
                .unwrap_or(0)
                + 1;
            let chapter = Chapter {
                id: state.next_chapter_id,
                number,
                title: draft.title,
                prompt: draft.prompt,
                word_count: word_count(&draft.content),
                content: draft.content,
                created_at: now,
                updated_at: now,
            };

            state.chapters.push(chapter.clone());
            Ok(chapter)
        })
    }

    fn update_chapter<'a>(
        &'a self,
        id: ChapterId,
        patch: ChapterPatch,
    ) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            validate_patch(&patch)?;
            let mut state = self.state()?;
            if !state.chapters.iter().any(|chapter| chapter.id == id) {
                return Ok(0);
            }
            if let Some(number) = patch.number
                && let Some(owner) = state
                    .chapters
                    .iter()
                    .find(|chapter| chapter.number == number && chapter.id != id)
            {
                return Err(number_in_use(number, owner.id));
            }
            let Some(chapter) = state.chapters.iter_mut().find(|chapter| chapter.id == id) else {
                return Ok(0);
            };

            if let Some(title) = patch.title {
                chapter.title = title;
            }
            if let Some(prompt) = patch.prompt {
                chapter.prompt = prompt;
            }
            if let Some(number) = patch.number {
                chapter.number = number;
            }
            if let Some(content) = patch.content {
                chapter.word_count = word_count(&content);
                chapter.content = content;
            }
            chapter.updated_at = now_unix_secs();

            Ok(1)
        })
    }

    fn delete_chapter<'a>(&'a self, id: ChapterId) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            let mut state = self.state()?;
            let before = state.chapters.len();
            state.chapters.retain(|chapter| chapter.id != id);
            Ok((before - state.chapters.len()) as u64)
        })
    }

    fn chapter_by_id<'a>(
        &'a self,
        id: ChapterId,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state.chapters.iter().find(|chapter| chapter.id == id).cloned())
        })
    }

    fn chapter_by_number<'a>(
        &'a self,
        number: i64,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state
                .chapters
                .iter()
                .filter(|chapter| chapter.number == number)
                .min_by_key(|chapter| chapter.id)
                .cloned())
        })
    }

    fn chapters_by_number_range<'a>(
        &'a self,
        start: i64,
        end: i64,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            let chapters = state
                .chapters
                .iter()
                .filter(|chapter| (start..=end).contains(&chapter.number))
                .cloned()
                .collect();
            Ok(sorted_by_number(chapters))
        })
    }

    fn chapters_by_id_range<'a>(
        &'a self,
        start: ChapterId,
        end: ChapterId,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            let mut chapters = state
                .chapters
                .iter()
                .filter(|chapter| (start..=end).contains(&chapter.id))
                .cloned()
                .collect::<Vec<_>>();
            chapters.sort_by_key(|chapter| chapter.id);
            Ok(chapters)
        })
    }

    fn all_chapters<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(sorted_by_number(state.chapters.clone()))
        })
    }

    fn chapter_stats<'a>(&'a self) -> BoxFuture<'a, Result<ChapterStats, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            let chapters = &state.chapters;
            Ok(ChapterStats {
                total: chapters.len() as u64,
                min_id: chapters.iter().map(|chapter| chapter.id).min(),
                max_id: chapters.iter().map(|chapter| chapter.id).max(),
                min_number: chapters.iter().map(|chapter| chapter.number).min(),
                max_number: chapters.iter().map(|chapter| chapter.number).max(),
            })
        })
    }

    fn create_outline<'a>(
        &'a self,
        draft: OutlineDraft,
    ) -> BoxFuture<'a, Result<Outline, StoreError>> {
        Box::pin(async move {
            validate_outline(&draft)?;
            let mut state = self.state()?;
            state.next_outline_id += 1;

            let now = now_unix_secs();
            let outline = Outline {
                id: state.next_outline_id,
                name: draft.name,
                kind: draft.kind,
                prompt: draft.prompt,
                content: draft.content,
                created_at: now,
                updated_at: now,
            };

            state.outlines.push(outline.clone());
            Ok(outline)
        })
    }

    fn outline_by_id<'a>(
        &'a self,
        id: OutlineId,
    ) -> BoxFuture<'a, Result<Option<Outline>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state.outlines.iter().find(|outline| outline.id == id).cloned())
        })
    }

    fn all_outlines<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Outline>, StoreError>> {
        Box::pin(async move {
            let state = self.state()?;
            Ok(state.outlines.clone())
        })
    }
}
