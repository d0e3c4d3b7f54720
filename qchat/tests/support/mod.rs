#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use qchat::ChatEvent;
use qprovider::{
    BoxedEventStream, Message, ModelProvider, ModelRequest, ModelResponse, OutputItem,
    ProviderError, ProviderFuture, ProviderId, Role, StopReason, StreamEvent, TokenUsage,
    ToolCall, VecEventStream,
};
use qstore::{InMemoryWritingStore, WritingStore, writing_tool_registry};
use qtooling::ToolDispatcher;

/// One scripted model reply: streamed text fragments plus requested tool calls.
#[derive(Debug, Clone)]
pub struct Reply {
    pub deltas: Vec<String>,
    pub calls: Vec<ToolCall>,
}

impl Reply {
    pub fn text(parts: &[&str]) -> Self {
        Self {
            deltas: parts.iter().map(|part| part.to_string()).collect(),
            calls: Vec::new(),
        }
    }

    pub fn tools(calls: Vec<ToolCall>) -> Self {
        Self {
            deltas: Vec::new(),
            calls,
        }
    }

    pub fn with_text(mut self, parts: &[&str]) -> Self {
        self.deltas = parts.iter().map(|part| part.to_string()).collect();
        self
    }

    fn response(&self, model: String) -> ModelResponse {
        let mut output = Vec::new();
        let text = self.deltas.concat();
        if !text.is_empty() {
            output.push(OutputItem::Message(Message::new(Role::Assistant, text)));
        }
        output.extend(self.calls.iter().cloned().map(OutputItem::ToolCall));

        ModelResponse {
            provider: ProviderId::DeepSeek,
            model,
            output,
            stop_reason: if self.calls.is_empty() {
                StopReason::EndTurn
            } else {
                StopReason::ToolUse
            },
            usage: TokenUsage::default(),
        }
    }
}

/// Replays replies in order; once the script runs out the last reply repeats.
#[derive(Debug)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    pub requests: Mutex<Vec<ModelRequest>>,
    failure: Option<ProviderError>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Reply>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(replies.into()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            failure: None,
        })
    }

    pub fn failing(error: ProviderError) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
            failure: Some(error),
        })
    }

    pub fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    fn next_reply(&self, request: &ModelRequest) -> Result<Reply, ProviderError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let mut last = self.last.lock().expect("last lock");
        let reply = match self.script.lock().expect("script lock").pop_front() {
            Some(reply) => reply,
            None => last
                .clone()
                .ok_or_else(|| ProviderError::other("script is empty"))?,
        };
        *last = Some(reply.clone());
        Ok(reply)
    }
}

impl ModelProvider for ScriptedProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DeepSeek
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let reply = self.next_reply(&request)?;
            Ok(reply.response(request.model))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let reply = self.next_reply(&request)?;
            let mut events = reply
                .deltas
                .iter()
                .cloned()
                .map(|delta| Ok(StreamEvent::TextDelta(delta)))
                .collect::<Vec<_>>();
            events.extend(
                reply
                    .calls
                    .iter()
                    .cloned()
                    .map(|call| Ok(StreamEvent::ToolCallReady(call))),
            );
            events.push(Ok(StreamEvent::ResponseComplete(
                reply.response(request.model),
            )));

            Ok(Box::pin(VecEventStream::new(events)) as BoxedEventStream<'a>)
        })
    }
}

pub fn writing_dispatcher() -> (Arc<dyn WritingStore>, Arc<ToolDispatcher>) {
    let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
    let registry = writing_tool_registry(Arc::clone(&store)).expect("catalog builds");
    (store, Arc::new(ToolDispatcher::new(Arc::new(registry))))
}

pub fn kinds(events: &[ChatEvent]) -> Vec<&'static str> {
    events
        .iter()
        .map(|event| match event {
            ChatEvent::ContentDelta(_) => "delta",
            ChatEvent::ToolResult(_) => "tool_result",
            ChatEvent::Error(_) => "error",
            ChatEvent::Done => "done",
        })
        .collect()
}
