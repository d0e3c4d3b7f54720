mod support;

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use qchat::prelude::*;
use qchat::sse::{DONE_FRAME, sse_body};
use qprovider::{ProviderError, Role, ToolCall};
use qstore::{ChapterDraft, WritingStore};
use qtooling::{ToolRegistry, ToolSpec};
use serde_json::json;

use support::{Reply, ScriptedProvider, kinds, writing_dispatcher};

#[tokio::test]
async fn streams_deltas_tool_results_and_done_in_production_order() {
    let (store, dispatcher) = writing_dispatcher();
    store
        .create_chapter(ChapterDraft::new("Arrival", "open on the docks"))
        .await
        .expect("seed chapter");
    let provider = ScriptedProvider::new(vec![
        Reply::tools(vec![ToolCall::new(
            "call_1",
            "get_chapter",
            json!({ "number": 1 }),
        )])
        .with_text(&["Let me ", "check."]),
        Reply::text(&["Chapter 1 is Arrival."]),
    ]);
    let service = ChatService::new(provider.clone(), dispatcher);

    let events = service
        .stream_turn(vec![ProtocolMessage::user("What is chapter 1?")])
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        kinds(&events),
        vec!["delta", "delta", "tool_result", "delta", "done"]
    );
    assert_eq!(events[0], ChatEvent::ContentDelta("Let me ".to_string()));
    match &events[2] {
        ChatEvent::ToolResult(output) => assert!(output.contains("\"title\": \"Arrival\"")),
        other => panic!("expected a tool result, got {other:?}"),
    }
    assert!(provider.requests().iter().all(|request| request.options.stream));
}

#[tokio::test]
async fn endless_tool_calls_never_reach_done() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::new(vec![Reply::tools(vec![ToolCall::new(
        "",
        "list_outlines",
        json!({}),
    )])]);
    let service = ChatService::new(provider, dispatcher);

    let events = service
        .stream_turn(vec![ProtocolMessage::user("keep going")])
        .take(25)
        .collect::<Vec<_>>()
        .await;

    assert_eq!(events.len(), 25);
    assert!(!events.contains(&ChatEvent::Done));
    assert!(
        events
            .iter()
            .all(|event| matches!(event, ChatEvent::ToolResult(_)))
    );
}

#[tokio::test]
async fn round_limit_ends_stream_with_error_then_done() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::new(vec![Reply::tools(vec![ToolCall::new(
        "",
        "list_outlines",
        json!({}),
    )])]);
    let service = ChatService::builder(provider)
        .tool_dispatcher(dispatcher)
        .max_tool_rounds(1)
        .build();

    let events = service
        .stream_turn(vec![ProtocolMessage::user("keep going")])
        .collect::<Vec<_>>()
        .await;

    assert_eq!(kinds(&events), vec!["tool_result", "error", "done"]);
}

#[tokio::test]
async fn provider_failure_becomes_one_error_event() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::failing(ProviderError::timeout("model took too long"));
    let service = ChatService::new(provider, dispatcher);

    let events = service
        .stream_turn(vec![ProtocolMessage::user("hello")])
        .collect::<Vec<_>>()
        .await;

    assert_eq!(kinds(&events), vec!["error", "done"]);
    match &events[0] {
        ChatEvent::Error(message) => assert!(message.contains("model took too long")),
        other => panic!("expected an error, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_history_streams_protocol_error() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::new(vec![Reply::text(&["unused"])]);
    let service = ChatService::new(provider.clone(), dispatcher);

    let events = service
        .stream_turn(vec![ProtocolMessage::new(
            ProtocolRole::Other("narrator".to_string()),
            "hi",
        )])
        .collect::<Vec<_>>()
        .await;

    assert_eq!(
        events,
        vec![
            ChatEvent::Error("unknown role: narrator".to_string()),
            ChatEvent::Done
        ]
    );
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn nothing_runs_until_the_stream_is_polled() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::new(vec![Reply::text(&["hi"])]);
    let service = ChatService::new(provider.clone(), dispatcher);

    let stream = service.stream_turn(vec![ProtocolMessage::user("hello")]);
    assert!(provider.requests().is_empty());
    drop(stream);
    assert!(provider.requests().is_empty());
}

#[tokio::test]
async fn sse_body_frames_a_full_run() {
    let (_store, dispatcher) = writing_dispatcher();
    let provider = ScriptedProvider::new(vec![Reply::text(&["Hello", " there"])]);
    let service = ChatService::new(provider, dispatcher);

    let frames = sse_body(service.stream_turn(vec![ProtocolMessage::user("hi")]))
        .collect::<Vec<_>>()
        .await;

    assert_eq!(frames.len(), 3);
    assert_eq!(&frames[0][..], b"data: {\"content\":\"Hello\"}\n\n");
    assert_eq!(&frames[1][..], b"data: {\"content\":\" there\"}\n\n");
    assert_eq!(&frames[2][..], DONE_FRAME.as_bytes());
}

/// Tools that sleep for their delay, then record their name in `log`.
fn delayed_dispatcher(
    tools: &[(&'static str, u64)],
    log: Arc<Mutex<Vec<&'static str>>>,
) -> Arc<ToolDispatcher> {
    let mut registry = ToolRegistry::new();
    for &(name, delay) in tools {
        let log = Arc::clone(&log);
        registry.register(
            ToolSpec::new(name, "records completion", json!({ "type": "object" }), move |_, _| {
                let log = Arc::clone(&log);
                async move {
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    log.lock().expect("log lock").push(name);
                    Ok(format!("{name} done"))
                }
            })
            .expect("schema compiles"),
        );
    }
    Arc::new(ToolDispatcher::new(Arc::new(registry)))
}

#[tokio::test]
async fn tool_results_stream_as_each_call_finishes() {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = delayed_dispatcher(&[("slow", 500), ("fast", 0)], Arc::clone(&log));
    let provider = ScriptedProvider::new(vec![
        Reply::tools(vec![
            ToolCall::new("call_slow", "slow", json!({})),
            ToolCall::new("call_fast", "fast", json!({})),
        ]),
        Reply::text(&["done"]),
    ]);
    let service = ChatService::builder(provider.clone())
        .tool_dispatcher(dispatcher)
        .tool_execution(ToolExecutionMode::Concurrent)
        .build();

    let started = Instant::now();
    let mut stream = service.stream_turn(vec![ProtocolMessage::user("go")]);
    let first = stream.next().await;
    assert_eq!(first, Some(ChatEvent::ToolResult("fast done".to_string())));
    assert!(
        started.elapsed() < Duration::from_millis(300),
        "fast result waited {:?}",
        started.elapsed()
    );

    let rest = stream.collect::<Vec<_>>().await;
    assert_eq!(
        rest,
        vec![
            ChatEvent::ToolResult("slow done".to_string()),
            ChatEvent::ContentDelta("done".to_string()),
            ChatEvent::Done,
        ]
    );

    let requests = provider.requests();
    assert_eq!(requests.len(), 2);
    let fed_back = requests[1]
        .messages
        .iter()
        .filter(|message| message.role == Role::Tool)
        .map(|message| message.content.as_str())
        .collect::<Vec<_>>();
    assert_eq!(fed_back, vec!["slow done", "fast done"]);
}

async fn drop_mid_round(mode: ToolExecutionMode) -> (Vec<&'static str>, usize) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let dispatcher = delayed_dispatcher(&[("write_a", 300), ("write_b", 0)], Arc::clone(&log));
    let provider = ScriptedProvider::new(vec![
        Reply::tools(vec![
            ToolCall::new("call_a", "write_a", json!({})),
            ToolCall::new("call_b", "write_b", json!({})),
        ]),
        Reply::text(&["done"]),
    ]);
    let service = ChatService::builder(provider.clone())
        .tool_dispatcher(dispatcher)
        .tool_execution(mode)
        .build();

    let mut stream = service.stream_turn(vec![ProtocolMessage::user("go")]);
    loop {
        match tokio::time::timeout(Duration::from_millis(100), stream.next()).await {
            Ok(Some(_)) => continue,
            Ok(None) => panic!("stream ended before write_a finished"),
            Err(_) => break,
        }
    }
    drop(stream);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let finished = log.lock().expect("log lock").clone();
    (finished, provider.requests().len())
}

#[tokio::test]
async fn dropping_a_sequential_stream_mid_round_lets_the_running_call_land() {
    let (finished, requests) = drop_mid_round(ToolExecutionMode::Sequential).await;
    assert_eq!(finished, vec!["write_a"]);
    assert_eq!(requests, 1);
}

#[tokio::test]
async fn dropping_a_concurrent_stream_mid_round_lets_every_started_call_land() {
    let (finished, requests) = drop_mid_round(ToolExecutionMode::Concurrent).await;
    assert_eq!(finished, vec!["write_b", "write_a"]);
    assert_eq!(requests, 1);
}
