use std::sync::Arc;

use futures_util::future::join_all;
use qtooling::{ToolError, parse_args};
use serde::Deserialize;
use serde_json::Value;

use crate::{ChapterDraft, ChapterId, ChapterPatch, WritingStore};

#[derive(Debug, Deserialize)]
struct Items<T> {
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct UpdateItem {
    id: ChapterId,
    #[serde(flatten)]
    patch: ChapterPatch,
}

#[derive(Debug, Deserialize)]
struct DeleteItem {
    id: ChapterId,
}

fn non_empty<T>(items: Items<T>, verb: &str) -> Result<Vec<T>, ToolError> {
    if items.items.is_empty() {
        return Err(ToolError::invalid_arguments(format!(
            "provide at least one chapter to {verb}"
        )));
    }

    Ok(items.items)
}

pub(crate) async fn create_chapters(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let drafts = non_empty(parse_args::<Items<ChapterDraft>>(&args)?, "create")?;
    let requested = drafts.len();
    let outcomes = join_all(drafts.into_iter().map(|draft| store.create_chapter(draft))).await;

    if requested == 1 {
        let chapter = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::other("create produced no outcome"))??;
        return Ok(format!(
            "created chapter id {} (number {})",
            chapter.id, chapter.number
        ));
    }

    let mut ids = Vec::new();
    let mut failures = Vec::new();
    for (index, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(chapter) => ids.push(chapter.id.to_string()),
            Err(error) => failures.push(format!("item {}: {}", index + 1, error.message)),
        }
    }

    if ids.is_empty() {
        return Err(ToolError::execution(format!(
            "no chapters created; {}",
            failures.join("; ")
        )));
    }

    let mut summary = format!(
        "created {} of {} chapters; ids: {}",
        ids.len(),
        requested,
        ids.join(", ")
    );
    if !failures.is_empty() {
        summary.push_str(&format!("; failed: {}", failures.join("; ")));
    }

    Ok(summary)
}

pub(crate) async fn update_chapters(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let items = non_empty(parse_args::<Items<UpdateItem>>(&args)?, "update")?;
    let requested = items.len();
    let first_id = items[0].id;
    let outcomes = join_all(
        items
            .into_iter()
            .map(|item| store.update_chapter(item.id, item.patch)),
    )
    .await;

    if requested == 1 {
        let changed = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::other("update produced no outcome"))??;
        if changed == 0 {
            return Err(ToolError::execution(format!(
                "update failed: no chapter with id {first_id}"
            )));
        }
        return Ok(format!("updated chapter id {first_id}"));
    }

    let updated = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Ok(changed) if *changed > 0))
        .count();
    Ok(format!("updated {updated} of {requested} chapters"))
}

pub(crate) async fn delete_chapters(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let items = non_empty(parse_args::<Items<DeleteItem>>(&args)?, "delete")?;
    let requested = items.len();
    let first_id = items[0].id;
    let outcomes = join_all(items.iter().map(|item| store.delete_chapter(item.id))).await;

    if requested == 1 {
        let changed = outcomes
            .into_iter()
            .next()
            .ok_or_else(|| ToolError::other("delete produced no outcome"))??;
        if changed == 0 {
            return Err(ToolError::execution(format!(
                "delete failed: no chapter with id {first_id}"
            )));
        }
        return Ok(format!("deleted chapter id {first_id}"));
    }

    let deleted = outcomes
        .iter()
        .filter(|outcome| matches!(outcome, Ok(changed) if *changed > 0))
        .count();
    Ok(format!("deleted {deleted} of {requested} chapters"))
}
