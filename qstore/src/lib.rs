//! Chapter and outline persistence, and the writing tools built on top of it.
//!
//! ```rust
//! use futures_util::FutureExt;
//! use qstore::{ChapterDraft, InMemoryWritingStore, WritingStore};
//!
//! let store = InMemoryWritingStore::new();
//! let chapter = store
//!     .create_chapter(ChapterDraft::new("The Crossing", "Mira leaves the harbor"))
//!     .now_or_never()
//!     .expect("in-memory store resolves immediately")
//!     .expect("chapter is created");
//!
//! assert_eq!(chapter.number, 1);
//! ```

mod backends;
mod error;
mod store;
mod tools;
mod types;

pub mod prelude {
    pub use crate::{
        Chapter, ChapterDraft, ChapterPatch, ChapterPreview, ChapterStats, InMemoryWritingStore,
        Outline, OutlineDraft, SqliteWritingStore, StoreConfig, StoreError, StoreErrorKind,
        WritingStore, writing_tool_registry,
    };
}

pub use backends::sqlite::default_sqlite_path;
pub use error::{StoreError, StoreErrorKind};
pub use store::{
    InMemoryWritingStore, SqliteWritingStore, StoreConfig, WritingStore, create_default_writing_store,
    create_writing_store,
};
pub use tools::{
    CREATE_CHAPTER, DELETE_CHAPTER, GET_CHAPTER, GET_CHAPTER_BY_ID, GET_CHAPTERS_BY_ID_RANGE,
    GET_CHAPTERS_BY_RANGE, LIST_OUTLINES, UPDATE_CHAPTER, writing_tool_registry,
};
pub use types::{
    Chapter, ChapterDraft, ChapterId, ChapterPatch, ChapterPreview, ChapterStats, Outline,
    OutlineDraft, OutlineId, PREVIEW_CHARS, content_preview, word_count,
};
