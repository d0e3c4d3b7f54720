use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use http::StatusCode;
use quill::http::{json_response, sse_response};
use quill::qprovider::{
    BoxedEventStream, OutputItem, ProviderFuture, StopReason, TokenUsage, VecEventStream,
};
use quill::{
    ChapterPlanRequest, ChatEvent, InMemoryWritingStore, Message, ModelProvider, ModelRequest,
    ModelResponse, OutlineContentRequest, OutlineDraft, ProviderError, ProviderId, QuillConfig,
    Role, StreamEvent, ToolCall, WritingStore, build_runtime_with, chapter_list_conversation,
    outline_content_conversation,
};
use serde_json::json;

/// Replays `(text, tool calls)` replies in order.
struct PlannedProvider {
    replies: Mutex<VecDeque<(String, Vec<ToolCall>)>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl PlannedProvider {
    fn new(replies: Vec<(&str, Vec<ToolCall>)>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(text, calls)| (text.to_string(), calls))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn next(&self, request: &ModelRequest) -> Result<(String, Vec<ToolCall>), ProviderError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .ok_or_else(|| ProviderError::other("no reply planned"))
    }
}

fn response(model: String, text: &str, calls: &[ToolCall]) -> ModelResponse {
    let mut output = Vec::new();
    if !text.is_empty() {
        output.push(OutputItem::Message(Message::new(Role::Assistant, text)));
    }
    output.extend(calls.iter().cloned().map(OutputItem::ToolCall));
    ModelResponse {
        provider: ProviderId::DeepSeek,
        model,
        output,
        stop_reason: if calls.is_empty() {
            StopReason::EndTurn
        } else {
            StopReason::ToolUse
        },
        usage: TokenUsage::default(),
    }
}

impl ModelProvider for PlannedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DeepSeek
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let (text, calls) = self.next(&request)?;
            Ok(response(request.model, &text, &calls))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let (text, calls) = self.next(&request)?;
            let mut events: Vec<Result<StreamEvent, ProviderError>> = text
                .split_inclusive(' ')
                .map(|word| Ok(StreamEvent::TextDelta(word.to_string())))
                .collect();
            events.extend(
                calls
                    .iter()
                    .cloned()
                    .map(|call| Ok(StreamEvent::ToolCallReady(call))),
            );
            events.push(Ok(StreamEvent::ResponseComplete(response(
                request.model,
                &text,
                &calls,
            ))));
            Ok(Box::pin(VecEventStream::new(events)) as BoxedEventStream<'a>)
        })
    }
}

#[tokio::test]
async fn chapter_planning_creates_chapters_through_tools() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    let outline = store
        .create_outline(OutlineDraft::new("Mira", "character").with_content("A cartographer"))
        .await
        .expect("outline");

    let create = ToolCall::new(
        "call_1",
        "create_chapter",
        json!({ "items": [
            { "title": "The Map Room", "prompt": "Mira finds a blank map" },
            { "title": "Ink and Salt", "prompt": "The map fills in at sea" }
        ]}),
    );
    let provider = PlannedProvider::new(vec![
        ("Planning two chapters.", vec![create]),
        ("Two chapters added.", Vec::new()),
    ]);

    let runtime = build_runtime_with(
        provider.clone(),
        Arc::clone(&store),
        &QuillConfig::default(),
    )
    .expect("runtime builds");

    let request = ChapterPlanRequest::new(2).with_outline(outline.id);
    let messages = chapter_list_conversation(runtime.store.as_ref(), &request)
        .await
        .expect("conversation builds");
    let result = runtime.chat.run_turn(messages).await;

    let response = json_response(result);
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(response.body()).expect("json body");
    assert_eq!(
        body,
        json!({ "content": "Two chapters added.", "thinkText": "Planning two chapters." })
    );

    let chapters = store.all_chapters().await.expect("chapters");
    let titles: Vec<_> = chapters.iter().map(|c| c.title.as_str()).collect();
    assert_eq!(titles, vec!["The Map Room", "Ink and Salt"]);
    assert_eq!(chapters[1].number, 2);

    let requests = provider.requests.lock().expect("requests lock").clone();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].tools.len(), 8);
    assert!(requests[0].messages[1].content.contains("【character】Mira"));
    assert_eq!(requests[1].messages.last().map(|m| m.role), Some(Role::Tool));
}

#[tokio::test]
async fn outline_content_streams_as_sse_frames() {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    let outline = store
        .create_outline(OutlineDraft::new("Harbor Town", "location"))
        .await
        .expect("outline");

    let provider = PlannedProvider::new(vec![("Fog rolls in.", Vec::new())]);
    let runtime = build_runtime_with(provider, Arc::clone(&store), &QuillConfig::default())
        .expect("runtime builds");

    let messages = outline_content_conversation(
        runtime.store.as_ref(),
        &OutlineContentRequest::new(outline.id, "Describe the harbor"),
    )
    .await
    .expect("conversation builds");

    let events: Vec<ChatEvent> = runtime.chat.stream_turn(messages.clone()).collect().await;
    assert_eq!(
        events,
        vec![
            ChatEvent::ContentDelta("Fog ".to_string()),
            ChatEvent::ContentDelta("rolls ".to_string()),
            ChatEvent::ContentDelta("in.".to_string()),
            ChatEvent::Done,
        ]
    );

    let provider = PlannedProvider::new(vec![("Quiet.", Vec::new())]);
    let runtime = build_runtime_with(provider, store, &QuillConfig::default())
        .expect("runtime builds");
    let frames: Vec<_> = sse_response(runtime.chat.stream_turn(messages))
        .into_body()
        .collect()
        .await;
    assert_eq!(frames.len(), 2);
    assert_eq!(&frames[0][..], b"data: {\"content\":\"Quiet.\"}\n\n");
    assert_eq!(&frames[1][..], b"data: [DONE]\n\n");
}

#[tokio::test]
async fn provider_failure_is_a_server_error() {
    let provider = PlannedProvider::new(Vec::new());
    let runtime = build_runtime_with(
        provider,
        Arc::new(InMemoryWritingStore::new()),
        &QuillConfig::default(),
    )
    .expect("runtime builds");

    let result = runtime
        .chat
        .run_turn(vec![quill::ProtocolMessage::user("hello")])
        .await;
    let response = json_response(result);
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().contains("no reply planned"));
}
