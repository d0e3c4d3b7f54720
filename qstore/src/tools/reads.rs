use std::sync::Arc;

use qtooling::{ToolError, parse_args};
use serde::Deserialize;
use serde_json::{Value, json};

use super::to_json;
use crate::{ChapterId, ChapterPreview, WritingStore, content_preview};

#[derive(Debug, Deserialize)]
struct ById {
    id: ChapterId,
}

#[derive(Debug, Deserialize)]
struct ByNumber {
    number: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdRange {
    start_id: ChapterId,
    end_id: ChapterId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NumberRange {
    start_number: i64,
    end_number: i64,
}

fn check_range(start: i64, end: i64, label: &str) -> Result<(), ToolError> {
    if start < 1 || end < start {
        return Err(ToolError::invalid_arguments(format!(
            "invalid {label} range {start}-{end}: start must be at least 1 and end must not be less than start"
        )));
    }

    Ok(())
}

pub(crate) async fn chapter_by_id(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let ById { id } = parse_args(&args)?;
    let chapter = store
        .chapter_by_id(id)
        .await?
        .ok_or_else(|| ToolError::execution(format!("no chapter with id {id}")))?;
    to_json(&chapter)
}

pub(crate) async fn chapter_by_number(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let ByNumber { number } = parse_args(&args)?;
    if number < 1 {
        return Err(ToolError::invalid_arguments(
            "chapter number must be at least 1",
        ));
    }

    let chapter = store
        .chapter_by_number(number)
        .await?
        .ok_or_else(|| ToolError::execution(format!("no chapter with number {number}")))?;
    to_json(&chapter)
}

pub(crate) async fn chapters_by_id_range(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let IdRange { start_id, end_id } = parse_args(&args)?;
    check_range(start_id, end_id, "id")?;

    let chapters = store.chapters_by_id_range(start_id, end_id).await?;
    let stats = store.chapter_stats().await?;
    let previews = chapters.iter().map(|chapter| chapter.preview()).collect::<Vec<_>>();

    to_json(&json!({
        "chapters": previews,
        "total": stats.total,
        "minId": stats.min_id,
        "maxId": stats.max_id,
    }))
}

pub(crate) async fn chapters_by_number_range(
    store: Arc<dyn WritingStore>,
    args: Value,
) -> Result<String, ToolError> {
    let NumberRange {
        start_number,
        end_number,
    } = parse_args(&args)?;
    check_range(start_number, end_number, "chapter number")?;

    let chapters = store
        .chapters_by_number_range(start_number, end_number)
        .await?;
    let stats = store.chapter_stats().await?;
    let previews = chapters
        .iter()
        .map(|chapter| chapter.preview())
        .collect::<Vec<ChapterPreview>>();

    to_json(&json!({
        "chapters": previews,
        "total": stats.total,
        "minNumber": stats.min_number,
        "maxNumber": stats.max_number,
    }))
}

pub(crate) async fn list_outlines(
    store: Arc<dyn WritingStore>,
    _args: Value,
) -> Result<String, ToolError> {
    let outlines = store.all_outlines().await?;
    let entries = outlines
        .iter()
        .map(|outline| {
            json!({
                "id": outline.id,
                "name": outline.name,
                "type": outline.kind,
                "prompt": outline.prompt,
                "contentPreview": content_preview(&outline.content),
            })
        })
        .collect::<Vec<_>>();

    to_json(&json!({
        "outlines": entries,
        "total": outlines.len(),
    }))
}
