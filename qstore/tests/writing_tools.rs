use std::sync::Arc;

use qprovider::ToolCall;
use qstore::{
    ChapterDraft, InMemoryWritingStore, OutlineDraft, SqliteWritingStore, WritingStore,
    writing_tool_registry,
};
use qtooling::{ToolDispatcher, ToolExecutionContext, ToolExecutionResult};
use serde_json::{Value, json};

fn dispatcher_over(store: Arc<dyn WritingStore>) -> ToolDispatcher {
    let registry = writing_tool_registry(store).expect("catalog builds");
    ToolDispatcher::new(Arc::new(registry))
}

async fn call(dispatcher: &ToolDispatcher, name: &str, args: Value) -> ToolExecutionResult {
    dispatcher
        .dispatch(
            ToolCall::new(format!("call_{name}"), name, args),
            ToolExecutionContext::new("run-test"),
        )
        .await
}

fn parse(result: &ToolExecutionResult) -> Value {
    assert!(!result.is_error, "unexpected failure: {}", result.output);
    serde_json::from_str(&result.output).expect("tool output is json")
}

#[tokio::test]
async fn catalog_exposes_every_writing_tool() {
    let registry =
        writing_tool_registry(Arc::new(InMemoryWritingStore::new())).expect("catalog builds");

    assert_eq!(
        registry.names(),
        vec![
            "create_chapter",
            "delete_chapter",
            "get_chapter",
            "get_chapter_by_id",
            "get_chapters_by_id_range",
            "get_chapters_by_range",
            "list_outlines",
            "update_chapter",
        ]
    );
}

#[tokio::test]
async fn repeated_create_calls_append_distinct_chapters() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    let dispatcher = dispatcher_over(Arc::clone(&store));
    let args = json!({ "items": [{ "title": "Arrival", "prompt": "open on the docks" }] });

    let first = call(&dispatcher, "create_chapter", args.clone()).await;
    let second = call(&dispatcher, "create_chapter", args).await;

    assert_eq!(first.output, "created chapter id 1 (number 1)");
    assert_eq!(second.output, "created chapter id 2 (number 2)");
    assert_eq!(store.all_chapters().await.expect("chapters load").len(), 2);
}

#[tokio::test]
async fn batch_create_reports_ids() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryWritingStore::new()));

    let result = call(
        &dispatcher,
        "create_chapter",
        json!({
            "items": [
                { "title": "One", "prompt": "a" },
                { "title": "Two", "prompt": "b", "content": "storm at sea" },
                { "title": "Three", "prompt": "c" }
            ]
        }),
    )
    .await;

    assert!(!result.is_error);
    assert_eq!(result.output, "created 3 of 3 chapters; ids: 1, 2, 3");
}

#[tokio::test]
async fn batch_create_keeps_successes_when_an_item_fails() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryWritingStore::new()));

    let result = call(
        &dispatcher,
        "create_chapter",
        json!({
            "items": [
                { "title": "One", "prompt": "a" },
                { "title": "   ", "prompt": "b" }
            ]
        }),
    )
    .await;

    assert!(!result.is_error);
    assert!(result.output.starts_with("created 1 of 2 chapters; ids: 1; failed: item 2"));
}

#[tokio::test]
async fn create_rejects_arguments_outside_schema() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryWritingStore::new()));

    let result = call(&dispatcher, "create_chapter", json!({ "title": "loose" })).await;

    assert!(result.is_error);
    assert!(result.output.contains("invalid arguments for create_chapter"));
}

#[tokio::test]
async fn update_changes_only_provided_fields() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    store
        .create_chapter(ChapterDraft::new("Arrival", "open on the docks").with_content("gulls"))
        .await
        .expect("seed chapter");
    let dispatcher = dispatcher_over(Arc::clone(&store));

    let result = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 1, "content": "rain and thunder" }] }),
    )
    .await;
    assert_eq!(result.output, "updated chapter id 1");

    let chapter = store
        .chapter_by_id(1)
        .await
        .expect("lookup succeeds")
        .expect("chapter exists");
    assert_eq!(chapter.title, "Arrival");
    assert_eq!(chapter.content, "rain and thunder");
    assert_eq!(chapter.word_count, 14);
}

#[tokio::test]
async fn update_of_missing_chapter_is_reported() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    store
        .create_chapter(ChapterDraft::new("Arrival", "open on the docks"))
        .await
        .expect("seed chapter");
    let dispatcher = dispatcher_over(store);

    let single = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 42, "title": "Ghost" }] }),
    )
    .await;
    assert!(single.is_error);
    assert_eq!(single.output, "update failed: no chapter with id 42");

    let batch = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 1, "title": "Landfall" }, { "id": 42, "title": "Ghost" }] }),
    )
    .await;
    assert!(!batch.is_error);
    assert_eq!(batch.output, "updated 1 of 2 chapters");
}

#[tokio::test]
async fn delete_reports_removed_count() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    for title in ["One", "Two", "Three"] {
        store
            .create_chapter(ChapterDraft::new(title, "p"))
            .await
            .expect("seed chapter");
    }
    let dispatcher = dispatcher_over(Arc::clone(&store));

    let batch = call(
        &dispatcher,
        "delete_chapter",
        json!({ "items": [{ "id": 1 }, { "id": 3 }, { "id": 9 }] }),
    )
    .await;
    assert_eq!(batch.output, "deleted 2 of 3 chapters");

    let missing = call(&dispatcher, "delete_chapter", json!({ "items": [{ "id": 1 }] })).await;
    assert!(missing.is_error);

    let remaining = store.all_chapters().await.expect("chapters load");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].title, "Two");
}

#[tokio::test]
async fn update_cannot_give_two_chapters_the_same_number() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    for title in ["One", "Two"] {
        store
            .create_chapter(ChapterDraft::new(title, "p"))
            .await
            .expect("seed chapter");
    }
    let dispatcher = dispatcher_over(Arc::clone(&store));

    let result = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 2, "number": 1 }] }),
    )
    .await;
    assert!(result.is_error);
    assert!(
        result
            .output
            .contains("chapter number 1 is already used by chapter id 1"),
        "unexpected output: {}",
        result.output
    );

    let batch = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 2, "number": 1 }, { "id": 2, "title": "Second" }] }),
    )
    .await;
    assert_eq!(batch.output, "updated 1 of 2 chapters");

    let range = parse(
        &call(
            &dispatcher,
            "get_chapters_by_range",
            json!({ "startNumber": 1, "endNumber": 1 }),
        )
        .await,
    );
    let listed = range["chapters"].as_array().expect("chapters array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], json!("One"));

    let second = store
        .chapter_by_id(2)
        .await
        .expect("lookup succeeds")
        .expect("chapter exists");
    assert_eq!(second.number, 2);
    assert_eq!(second.title, "Second");
}

#[tokio::test]
async fn single_number_range_matches_get_chapter() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    for title in ["One", "Two", "Three"] {
        store
            .create_chapter(ChapterDraft::new(title, "p").with_content("body text"))
            .await
            .expect("seed chapter");
    }
    let dispatcher = dispatcher_over(store);

    let range = parse(
        &call(
            &dispatcher,
            "get_chapters_by_range",
            json!({ "startNumber": 2, "endNumber": 2 }),
        )
        .await,
    );
    let single = parse(&call(&dispatcher, "get_chapter", json!({ "number": 2 })).await);

    let listed = range["chapters"].as_array().expect("chapters array");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], single["id"]);
    assert_eq!(listed[0]["title"], single["title"]);
    assert_eq!(listed[0]["contentPreview"], single["content"]);
    assert_eq!(range["total"], json!(3));
    assert_eq!(range["minNumber"], json!(1));
    assert_eq!(range["maxNumber"], json!(3));
}

#[tokio::test]
async fn inverted_ranges_are_rejected() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryWritingStore::new()));

    let by_number = call(
        &dispatcher,
        "get_chapters_by_range",
        json!({ "startNumber": 5, "endNumber": 2 }),
    )
    .await;
    assert!(by_number.is_error);
    assert!(by_number.output.contains("invalid chapter number range 5-2"));

    let by_id = call(
        &dispatcher,
        "get_chapters_by_id_range",
        json!({ "startId": 0, "endId": 2 }),
    )
    .await;
    assert!(by_id.is_error);
}

#[tokio::test]
async fn empty_range_still_reports_totals() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    store
        .create_chapter(ChapterDraft::new("One", "p"))
        .await
        .expect("seed chapter");
    let dispatcher = dispatcher_over(store);

    let output = parse(
        &call(
            &dispatcher,
            "get_chapters_by_id_range",
            json!({ "startId": 10, "endId": 20 }),
        )
        .await,
    );

    assert_eq!(output["chapters"], json!([]));
    assert_eq!(output["total"], json!(1));
    assert_eq!(output["minId"], json!(1));
    assert_eq!(output["maxId"], json!(1));
}

#[tokio::test]
async fn range_previews_truncate_long_content() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    store
        .create_chapter(ChapterDraft::new("Long", "p").with_content("雨".repeat(250)))
        .await
        .expect("seed chapter");
    let dispatcher = dispatcher_over(store);

    let output = parse(
        &call(
            &dispatcher,
            "get_chapters_by_range",
            json!({ "startNumber": 1, "endNumber": 1 }),
        )
        .await,
    );

    let preview = output["chapters"][0]["contentPreview"]
        .as_str()
        .expect("preview string");
    assert_eq!(preview, format!("{}...", "雨".repeat(200)));
}

#[tokio::test]
async fn missing_chapter_lookup_is_an_error() {
    let dispatcher = dispatcher_over(Arc::new(InMemoryWritingStore::new()));

    let by_id = call(&dispatcher, "get_chapter_by_id", json!({ "id": 3 })).await;
    assert!(by_id.is_error);
    assert_eq!(by_id.output, "no chapter with id 3");

    let by_number = call(&dispatcher, "get_chapter", json!({ "number": 1 })).await;
    assert!(by_number.is_error);
}

#[tokio::test]
async fn list_outlines_previews_every_entry() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    store
        .create_outline(
            OutlineDraft::new("Mira", "character").with_content("A ferry pilot who hates fog"),
        )
        .await
        .expect("seed outline");
    store
        .create_outline(OutlineDraft::new("Saltmarsh", "setting"))
        .await
        .expect("seed outline");
    let dispatcher = dispatcher_over(store);

    let output = parse(&call(&dispatcher, "list_outlines", json!({})).await);

    assert_eq!(output["total"], json!(2));
    assert_eq!(output["outlines"][0]["name"], json!("Mira"));
    assert_eq!(output["outlines"][0]["type"], json!("character"));
    assert_eq!(
        output["outlines"][0]["contentPreview"],
        json!("A ferry pilot who hates fog")
    );
}

#[tokio::test]
async fn sqlite_backend_serves_the_same_catalog() {
    let store: Arc<dyn WritingStore> =
        Arc::new(SqliteWritingStore::new_in_memory().expect("store opens"));
    let dispatcher = dispatcher_over(Arc::clone(&store));

    let created = call(
        &dispatcher,
        "create_chapter",
        json!({ "items": [{ "title": "One", "prompt": "a" }, { "title": "Two", "prompt": "b" }] }),
    )
    .await;
    assert_eq!(created.output, "created 2 of 2 chapters; ids: 1, 2");

    let renumbered = call(
        &dispatcher,
        "update_chapter",
        json!({ "items": [{ "id": 1, "number": 5 }] }),
    )
    .await;
    assert!(!renumbered.is_error);

    let output = parse(
        &call(
            &dispatcher,
            "get_chapters_by_range",
            json!({ "startNumber": 1, "endNumber": 10 }),
        )
        .await,
    );
    let titles: Vec<&str> = output["chapters"]
        .as_array()
        .expect("chapters array")
        .iter()
        .filter_map(|chapter| chapter["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Two", "One"]);
    assert_eq!(output["maxNumber"], json!(5));
}
