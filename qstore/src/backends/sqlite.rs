use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use qcommon::BoxFuture;
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::error::StoreError;
use crate::store::{
    WritingStore, number_in_use, validate_draft, validate_outline, validate_patch,
};
use crate::types::{
    Chapter, ChapterDraft, ChapterId, ChapterPatch, ChapterStats, Outline, OutlineDraft,
    OutlineId, now_unix_secs, word_count,
};

const CHAPTER_COLUMNS: &str =
    "id, number, title, prompt, content, word_count, created_at, updated_at";
const OUTLINE_COLUMNS: &str = "id, name, kind, prompt, content, created_at, updated_at";

#[derive(Debug)]
pub struct SqliteWritingStore {
    connection: Mutex<Connection>,
}

impl SqliteWritingStore {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                StoreError::storage(format!("failed to create sqlite parent directory: {error}"))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            StoreError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, StoreError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            StoreError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::from_connection(connection)
    }

    fn from_connection(connection: Connection) -> Result<Self, StoreError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                StoreError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let store = Self {
            connection: Mutex::new(connection),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::storage("sqlite store lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), StoreError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS chapters (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                number INTEGER NOT NULL,
                title TEXT NOT NULL,
                prompt TEXT NOT NULL,
                content TEXT NOT NULL DEFAULT '',
                word_count INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_chapters_number
            ON chapters(number, id);

            CREATE TABLE IF NOT EXISTS outlines (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                kind TEXT NOT NULL,
                prompt TEXT NOT NULL DEFAULT '',
                content TEXT NOT NULL DEFAULT '',
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            );
            ",
        )
        .map_err(|error| {
            StoreError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }

    fn load_chapter(conn: &Connection, id: ChapterId) -> Result<Option<Chapter>, StoreError> {
        conn.query_row(
            &format!("SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id = ?1"),
            params![id],
            chapter_from_row,
        )
        .optional()
        .map_err(|error| StoreError::storage(format!("failed to load chapter {id}: {error}")))
    }

    fn load_outline(conn: &Connection, id: OutlineId) -> Result<Option<Outline>, StoreError> {
        conn.query_row(
            &format!("SELECT {OUTLINE_COLUMNS} FROM outlines WHERE id = ?1"),
            params![id],
            outline_from_row,
        )
        .optional()
        .map_err(|error| StoreError::storage(format!("failed to load outline {id}: {error}")))
    }

    fn query_chapters(
        conn: &Connection,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Chapter>, StoreError> {
        let mut statement = conn.prepare(sql).map_err(|error| {
            StoreError::storage(format!("failed to prepare chapter query: {error}"))
        })?;
        let rows = statement
            .query_map(params, chapter_from_row)
            .map_err(|error| StoreError::storage(format!("failed to query chapters: {error}")))?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|error| StoreError::storage(format!("failed to decode chapter row: {error}")))
    }
}

fn chapter_from_row(row: &Row<'_>) -> rusqlite::Result<Chapter> {
    Ok(Chapter {
        id: row.get(0)?,
        number: row.get(1)?,
        title: row.get(2)?,
        prompt: row.get(3)?,
        content: row.get(4)?,
        word_count: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn outline_from_row(row: &Row<'_>) -> rusqlite::Result<Outline> {
    Ok(Outline {
        id: row.get(0)?,
        name: row.get(1)?,
        kind: row.get(2)?,
        prompt: row.get(3)?,
        content: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

impl WritingStore for SqliteWritingStore {
    fn create_chapter<'a>(
        &'a self,
        draft: ChapterDraft,
    ) -> BoxFuture<'a, Result<Chapter, StoreError>> {
        Box::pin(async move {
            validate_draft(&draft)?;
            let conn = self.connection()?;
            let now = now_unix_secs();
            conn.execute(
                "
                INSERT INTO chapters (number, title, prompt, content, word_count, created_at, updated_at)
                SELECT COALESCE(MAX(number), 0) + 1, ?1, ?2, ?3, ?4, ?5, ?5 FROM chapters
                ",
                params![
                    &draft.title,
                    &draft.prompt,
                    &draft.content,
                    word_count(&draft.content),
                    now
                ],
            )
            .map_err(|error| StoreError::storage(format!("failed to insert chapter: {error}")))?;

            let id = conn.last_insert_rowid();
            Self::load_chapter(&conn, id)?.ok_or_else(|| {
                StoreError::storage(format!("inserted chapter {id} could not be read back"))
            })
        })
    }

    fn update_chapter<'a>(
        &'a self,
        id: ChapterId,
        patch: ChapterPatch,
    ) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            validate_patch(&patch)?;
            let conn = self.connection()?;
            if let Some(number) = patch.number
                && let Some(owner) = conn
                    .query_row(
                        "
                        SELECT id FROM chapters
                        WHERE number = ?1 AND id != ?2
                            AND EXISTS (SELECT 1 FROM chapters WHERE id = ?2)
                        LIMIT 1
                        ",
                        params![number, id],
                        |row| row.get::<_, ChapterId>(0),
                    )
                    .optional()
                    .map_err(|error| {
                        StoreError::storage(format!("failed to check chapter number: {error}"))
                    })?
            {
                return Err(number_in_use(number, owner));
            }
            let content_word_count = patch.content.as_deref().map(word_count);
            let changed = conn
                .execute(
                    "
                    UPDATE chapters SET
                        title = COALESCE(?2, title),
                        prompt = COALESCE(?3, prompt),
                        number = COALESCE(?4, number),
                        content = COALESCE(?5, content),
                        word_count = COALESCE(?6, word_count),
                        updated_at = ?7
                    WHERE id = ?1
                    ",
                    params![
                        id,
                        patch.title,
                        patch.prompt,
                        patch.number,
                        patch.content,
                        content_word_count,
                        now_unix_secs()
                    ],
                )
                .map_err(|error| {
                    StoreError::storage(format!("failed to update chapter {id}: {error}"))
                })?;

            Ok(changed as u64)
        })
    }

    fn delete_chapter<'a>(&'a self, id: ChapterId) -> BoxFuture<'a, Result<u64, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let changed = conn
                .execute("DELETE FROM chapters WHERE id = ?1", params![id])
                .map_err(|error| {
                    StoreError::storage(format!("failed to delete chapter {id}: {error}"))
                })?;
            Ok(changed as u64)
        })
    }

    fn chapter_by_id<'a>(
        &'a self,
        id: ChapterId,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::load_chapter(&conn, id)
        })
    }

    fn chapter_by_number<'a>(
        &'a self,
        number: i64,
    ) -> BoxFuture<'a, Result<Option<Chapter>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            conn.query_row(
                &format!(
                    "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE number = ?1 ORDER BY id LIMIT 1"
                ),
                params![number],
                chapter_from_row,
            )
            .optional()
            .map_err(|error| {
                StoreError::storage(format!("failed to load chapter number {number}: {error}"))
            })
        })
    }

    fn chapters_by_number_range<'a>(
        &'a self,
        start: i64,
        end: i64,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::query_chapters(
                &conn,
                &format!(
                    "SELECT {CHAPTER_COLUMNS} FROM chapters
                     WHERE number BETWEEN ?1 AND ?2 ORDER BY number, id"
                ),
                params![start, end],
            )
        })
    }

    fn chapters_by_id_range<'a>(
        &'a self,
        start: ChapterId,
        end: ChapterId,
    ) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::query_chapters(
                &conn,
                &format!(
                    "SELECT {CHAPTER_COLUMNS} FROM chapters WHERE id BETWEEN ?1 AND ?2 ORDER BY id"
                ),
                params![start, end],
            )
        })
    }

    fn all_chapters<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Chapter>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::query_chapters(
                &conn,
                &format!("SELECT {CHAPTER_COLUMNS} FROM chapters ORDER BY number, id"),
                params![],
            )
        })
    }

    fn chapter_stats<'a>(&'a self) -> BoxFuture<'a, Result<ChapterStats, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            conn.query_row(
                "SELECT COUNT(*), MIN(id), MAX(id), MIN(number), MAX(number) FROM chapters",
                params![],
                |row| {
                    Ok(ChapterStats {
                        total: row.get::<_, i64>(0)? as u64,
                        min_id: row.get(1)?,
                        max_id: row.get(2)?,
                        min_number: row.get(3)?,
                        max_number: row.get(4)?,
                    })
                },
            )
            .map_err(|error| {
                StoreError::storage(format!("failed to compute chapter stats: {error}"))
            })
        })
    }

    fn create_outline<'a>(
        &'a self,
        draft: OutlineDraft,
    ) -> BoxFuture<'a, Result<Outline, StoreError>> {
        Box::pin(async move {
            validate_outline(&draft)?;
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO outlines (name, kind, prompt, content, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ",
                params![
                    &draft.name,
                    &draft.kind,
                    &draft.prompt,
                    &draft.content,
                    now_unix_secs()
                ],
            )
            .map_err(|error| StoreError::storage(format!("failed to insert outline: {error}")))?;

            let id = conn.last_insert_rowid();
            Self::load_outline(&conn, id)?.ok_or_else(|| {
                StoreError::storage(format!("inserted outline {id} could not be read back"))
            })
        })
    }

    fn outline_by_id<'a>(
        &'a self,
        id: OutlineId,
    ) -> BoxFuture<'a, Result<Option<Outline>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            Self::load_outline(&conn, id)
        })
    }

    fn all_outlines<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Outline>, StoreError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut statement = conn
                .prepare(&format!("SELECT {OUTLINE_COLUMNS} FROM outlines ORDER BY id"))
                .map_err(|error| {
                    StoreError::storage(format!("failed to prepare outline query: {error}"))
                })?;
            let rows = statement.query_map(params![], outline_from_row).map_err(|error| {
                StoreError::storage(format!("failed to query outlines: {error}"))
            })?;

            rows.collect::<Result<Vec<_>, _>>().map_err(|error| {
                StoreError::storage(format!("failed to decode outline row: {error}"))
            })
        })
    }
}

pub fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("QUILL_DB_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".quill").join("quill.sqlite3");
    }

    PathBuf::from("quill.sqlite3")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;

    #[tokio::test]
    async fn numbers_follow_highest_existing_number() {
        let store = SqliteWritingStore::new_in_memory().expect("store opens");
        let first = store
            .create_chapter(ChapterDraft::new("Arrival", "open on the docks"))
            .await
            .expect("first chapter");
        assert_eq!(first.number, 1);

        store
            .update_chapter(
                first.id,
                ChapterPatch {
                    number: Some(10),
                    ..ChapterPatch::default()
                },
            )
            .await
            .expect("renumber");

        let second = store
            .create_chapter(ChapterDraft::new("Departure", "leave at dawn").with_content("a b c"))
            .await
            .expect("second chapter");
        assert_eq!(second.number, 11);
        assert_eq!(second.word_count, 3);
    }

    #[tokio::test]
    async fn renumbering_onto_a_taken_number_is_rejected() {
        let store = SqliteWritingStore::new_in_memory().expect("store opens");
        let first = store
            .create_chapter(ChapterDraft::new("Arrival", "open on the docks"))
            .await
            .expect("first chapter");
        let second = store
            .create_chapter(ChapterDraft::new("Departure", "leave at dawn"))
            .await
            .expect("second chapter");

        let error = store
            .update_chapter(
                second.id,
                ChapterPatch {
                    number: Some(first.number),
                    ..ChapterPatch::default()
                },
            )
            .await
            .expect_err("number 1 belongs to the first chapter");
        assert_eq!(error.kind, StoreErrorKind::InvalidRequest);
        assert_eq!(
            error.message,
            format!("chapter number 1 is already used by chapter id {}", first.id)
        );

        let kept = store
            .update_chapter(
                first.id,
                ChapterPatch {
                    number: Some(first.number),
                    title: Some("Arrival at Dusk".to_string()),
                    ..ChapterPatch::default()
                },
            )
            .await
            .expect("a chapter may keep its own number");
        assert_eq!(kept, 1);

        let missing = store
            .update_chapter(
                99,
                ChapterPatch {
                    number: Some(first.number),
                    ..ChapterPatch::default()
                },
            )
            .await
            .expect("missing chapter is not an error");
        assert_eq!(missing, 0);

        let range = store
            .chapters_by_number_range(1, 1)
            .await
            .expect("range loads");
        assert_eq!(range.len(), 1);
        assert_eq!(range[0].id, first.id);
    }

    #[tokio::test]
    async fn update_keeps_unset_fields_and_recounts_words() {
        let store = SqliteWritingStore::new_in_memory().expect("store opens");
        let chapter = store
            .create_chapter(ChapterDraft::new("Storm", "the ship founders").with_content("wind"))
            .await
            .expect("chapter");

        let changed = store
            .update_chapter(
                chapter.id,
                ChapterPatch {
                    content: Some("rain and thunder".to_string()),
                    ..ChapterPatch::default()
                },
            )
            .await
            .expect("update");
        assert_eq!(changed, 1);

        let reloaded = store
            .chapter_by_id(chapter.id)
            .await
            .expect("load")
            .expect("chapter exists");
        assert_eq!(reloaded.title, "Storm");
        assert_eq!(reloaded.word_count, 14);

        assert_eq!(
            store
                .update_chapter(
                    999,
                    ChapterPatch {
                        title: Some("ghost".to_string()),
                        ..ChapterPatch::default()
                    }
                )
                .await
                .expect("missing id is not an error"),
            0
        );
    }

    #[tokio::test]
    async fn stats_are_empty_for_fresh_store() {
        let store = SqliteWritingStore::new_in_memory().expect("store opens");
        let stats = store.chapter_stats().await.expect("stats");
        assert_eq!(stats, ChapterStats::default());
    }
}
