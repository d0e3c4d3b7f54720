//! The writing tool catalog: schema-validated tools over a [`WritingStore`].
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use qstore::{InMemoryWritingStore, writing_tool_registry};
//!
//! let registry = writing_tool_registry(Arc::new(InMemoryWritingStore::new()))
//!     .expect("catalog builds");
//! assert!(registry.contains("create_chapter"));
//! assert!(registry.contains("get_chapters_by_range"));
//! ```

mod reads;
mod writes;

use std::future::Future;
use std::sync::Arc;

use qtooling::{ToolError, ToolRegistry, ToolSpec};
use serde::Serialize;
use serde_json::{Value, json};

use crate::WritingStore;

pub const CREATE_CHAPTER: &str = "create_chapter";
pub const UPDATE_CHAPTER: &str = "update_chapter";
pub const DELETE_CHAPTER: &str = "delete_chapter";
pub const GET_CHAPTER_BY_ID: &str = "get_chapter_by_id";
pub const GET_CHAPTER: &str = "get_chapter";
pub const GET_CHAPTERS_BY_ID_RANGE: &str = "get_chapters_by_id_range";
pub const GET_CHAPTERS_BY_RANGE: &str = "get_chapters_by_range";
pub const LIST_OUTLINES: &str = "list_outlines";

/// Builds the full catalog. The registry is meant to be built once and shared.
pub fn writing_tool_registry(store: Arc<dyn WritingStore>) -> Result<ToolRegistry, ToolError> {
    let mut registry = ToolRegistry::new();

    registry.register(store_tool(
        &store,
        CREATE_CHAPTER,
        "Create one or more new chapters. Each item is created independently and is appended after the current last chapter.",
        json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string", "minLength": 1, "description": "Chapter title" },
                            "prompt": { "type": "string", "description": "Generation prompt for the chapter" },
                            "content": { "type": "string", "description": "Chapter body (optional)" }
                        },
                        "required": ["title", "prompt"]
                    }
                }
            },
            "required": ["items"]
        }),
        writes::create_chapters,
    )?);

    registry.register(store_tool(
        &store,
        UPDATE_CHAPTER,
        "Update one or more chapters by id. Only the fields provided are changed.",
        json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "integer", "description": "Chapter id" },
                            "title": { "type": "string" },
                            "prompt": { "type": "string" },
                            "number": { "type": "integer", "minimum": 1 },
                            "content": { "type": "string" }
                        },
                        "required": ["id"]
                    }
                }
            },
            "required": ["items"]
        }),
        writes::update_chapters,
    )?);

    registry.register(store_tool(
        &store,
        DELETE_CHAPTER,
        "Delete one or more chapters by id.",
        json!({
            "type": "object",
            "properties": {
                "items": {
                    "type": "array",
                    "minItems": 1,
                    "items": {
                        "type": "object",
                        "properties": { "id": { "type": "integer", "description": "Chapter id" } },
                        "required": ["id"]
                    }
                }
            },
            "required": ["items"]
        }),
        writes::delete_chapters,
    )?);

    registry.register(store_tool(
        &store,
        GET_CHAPTER_BY_ID,
        "Fetch one chapter, including its full content, by id.",
        json!({
            "type": "object",
            "properties": { "id": { "type": "integer" } },
            "required": ["id"]
        }),
        reads::chapter_by_id,
    )?);

    registry.register(store_tool(
        &store,
        GET_CHAPTER,
        "Fetch one chapter, including its full content, by chapter number (starting at 1).",
        json!({
            "type": "object",
            "properties": { "number": { "type": "integer", "minimum": 1 } },
            "required": ["number"]
        }),
        reads::chapter_by_number,
    )?);

    registry.register(store_tool(
        &store,
        GET_CHAPTERS_BY_ID_RANGE,
        "List chapters whose id lies in [startId, endId] with title, prompt and the first 200 characters of content. Also reports the total chapter count and the smallest and largest id present.",
        json!({
            "type": "object",
            "properties": {
                "startId": { "type": "integer", "minimum": 1 },
                "endId": { "type": "integer", "minimum": 1 }
            },
            "required": ["startId", "endId"]
        }),
        reads::chapters_by_id_range,
    )?);

    registry.register(store_tool(
        &store,
        GET_CHAPTERS_BY_RANGE,
        "List chapters whose number lies in [startNumber, endNumber] with title, prompt and the first 200 characters of content. Also reports the total chapter count and the smallest and largest number present.",
        json!({
            "type": "object",
            "properties": {
                "startNumber": { "type": "integer", "minimum": 1 },
                "endNumber": { "type": "integer", "minimum": 1 }
            },
            "required": ["startNumber", "endNumber"]
        }),
        reads::chapters_by_number_range,
    )?);

    registry.register(store_tool(
        &store,
        LIST_OUTLINES,
        "List every outline entry (characters, settings, plot notes) with a content preview.",
        json!({ "type": "object", "properties": {} }),
        reads::list_outlines,
    )?);

    Ok(registry)
}

fn store_tool<F, Fut>(
    store: &Arc<dyn WritingStore>,
    name: &str,
    description: &str,
    input_schema: Value,
    operation: F,
) -> Result<ToolSpec, ToolError>
where
    F: Fn(Arc<dyn WritingStore>, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, ToolError>> + Send + 'static,
{
    let store = Arc::clone(store);
    ToolSpec::new(name, description, input_schema, move |args, _context| {
        operation(Arc::clone(&store), args)
    })
}

pub(crate) fn to_json<T>(value: &T) -> Result<String, ToolError>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string_pretty(value)
        .map_err(|err| ToolError::other(format!("failed to encode tool output: {err}")))
}
