//! The tool-calling orchestration loop, single-shot and streamed.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use async_stream::stream;
use futures_util::stream::FuturesUnordered;
use futures_util::{Stream, StreamExt};
use qcommon::RunId;
use qprovider::{ModelProvider, ModelRequest, ModelResponse, StreamEvent, ToolCall};
use qtooling::{ToolDispatcher, ToolExecutionContext, ToolExecutionResult};
use tokio::task::{JoinError, JoinHandle};
use uuid::Uuid;

use crate::ids::ToolCallIds;
use crate::{
    ChatError, ChatEvent, ChatEventStream, ChatPolicy, ChatRunHooks, ChatTurnResult,
    NoopChatRunHooks, ProtocolMessage, ToolExecutionMode, to_native,
};

/// Drives a model through tool rounds until it answers without requesting tools.
///
/// Each call to [`run_turn`](Self::run_turn) or [`stream_turn`](Self::stream_turn)
/// owns its conversation; the service itself holds no per-run state and can be
/// shared across tasks.
#[derive(Clone)]
pub struct ChatService {
    provider: Arc<dyn ModelProvider>,
    dispatcher: Arc<ToolDispatcher>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatRunHooks>,
}

pub struct ChatServiceBuilder {
    provider: Arc<dyn ModelProvider>,
    dispatcher: Arc<ToolDispatcher>,
    policy: ChatPolicy,
    hooks: Arc<dyn ChatRunHooks>,
}

impl ChatServiceBuilder {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            dispatcher: Arc::new(ToolDispatcher::default()),
            policy: ChatPolicy::default(),
            hooks: Arc::new(NoopChatRunHooks),
        }
    }

    pub fn tool_dispatcher(mut self, dispatcher: Arc<ToolDispatcher>) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn policy(mut self, policy: ChatPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.policy.model = model.into();
        self
    }

    pub fn max_tool_rounds(mut self, rounds: u32) -> Self {
        self.policy.max_tool_rounds = Some(rounds);
        self
    }

    pub fn tool_execution(mut self, mode: ToolExecutionMode) -> Self {
        self.policy.tool_execution = mode;
        self
    }

    pub fn hooks(mut self, hooks: Arc<dyn ChatRunHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn build(self) -> ChatService {
        ChatService {
            provider: self.provider,
            dispatcher: self.dispatcher,
            policy: self.policy,
            hooks: self.hooks,
        }
    }
}

impl ChatService {
    pub fn new(provider: Arc<dyn ModelProvider>, dispatcher: Arc<ToolDispatcher>) -> Self {
        Self::builder(provider).tool_dispatcher(dispatcher).build()
    }

    pub fn builder(provider: Arc<dyn ModelProvider>) -> ChatServiceBuilder {
        ChatServiceBuilder::new(provider)
    }

    pub fn policy(&self) -> &ChatPolicy {
        &self.policy
    }

    /// Runs the conversation to completion and returns the final answer.
    pub async fn run_turn(
        &self,
        messages: Vec<ProtocolMessage>,
    ) -> Result<ChatTurnResult, ChatError> {
        let started_at = Instant::now();
        let mut run = Run::start(messages)?;

        match self.complete_rounds(&mut run).await {
            Ok(content) => {
                self.hooks
                    .on_run_success(&run.id, run.rounds, started_at.elapsed());
                Ok(ChatTurnResult {
                    content,
                    think_text: run.think_text,
                    rounds: run.rounds,
                    conversation: run.conversation,
                })
            }
            Err(error) => {
                self.hooks
                    .on_run_failure(&run.id, &error, started_at.elapsed());
                Err(error)
            }
        }
    }

    /// Runs the conversation as a lazy event stream.
    ///
    /// Nothing happens until the stream is polled. Failures become a single
    /// [`ChatEvent::Error`]; [`ChatEvent::Done`] always ends the stream. Each
    /// [`ChatEvent::ToolResult`] is yielded as soon as its call finishes, so in
    /// concurrent mode they can arrive out of request order. Dropping
    /// the stream stops further model rounds, while tool calls already
    /// dispatched run to completion.
    pub fn stream_turn(&self, messages: Vec<ProtocolMessage>) -> ChatEventStream<'static> {
        let service = self.clone();

        Box::pin(stream! {
            let started_at = Instant::now();
            let mut run = match Run::start(messages) {
                Ok(run) => run,
                Err(error) => {
                    yield ChatEvent::Error(error.message);
                    yield ChatEvent::Done;
                    return;
                }
            };

            let failure = 'rounds: loop {
                service.hooks.on_round_start(&run.id, run.rounds);

                let request = match service.model_request(&run, true) {
                    Ok(request) => request,
                    Err(error) => break Some(error),
                };
                let mut events = match service.provider.stream(request).await {
                    Ok(events) => events,
                    Err(error) => break Some(ChatError::from(error)),
                };

                let mut text = String::new();
                let mut ready_calls = Vec::new();
                let mut response = None::<ModelResponse>;
                let mut stream_error = None;
                while let Some(event) = events.next().await {
                    match event {
                        Ok(StreamEvent::TextDelta(delta)) => {
                            text.push_str(&delta);
                            yield ChatEvent::ContentDelta(delta);
                        }
                        Ok(StreamEvent::ToolCallReady(call)) => ready_calls.push(call),
                        Ok(StreamEvent::MessageComplete(_)) => {}
                        Ok(StreamEvent::ResponseComplete(complete)) => response = Some(complete),
                        Err(error) => {
                            stream_error = Some(ChatError::from(error));
                            break;
                        }
                    }
                }
                if let Some(error) = stream_error {
                    break Some(error);
                }

                if text.is_empty() {
                    let full = response.as_ref().map(ModelResponse::text).unwrap_or_default();
                    if !full.is_empty() {
                        text = full.clone();
                        yield ChatEvent::ContentDelta(full);
                    }
                }

                let calls = match response {
                    Some(complete) if complete.has_tool_calls() => complete.tool_calls(),
                    _ => ready_calls,
                };
                service
                    .hooks
                    .on_model_response(&run.id, run.rounds, calls.len());

                if calls.is_empty() {
                    run.conversation.push(ProtocolMessage::assistant(text));
                    break None;
                }
                if let Err(error) = service.check_round_limit(&run) {
                    break Some(error);
                }

                run.think_text.push_str(&text);
                let (calls, context) = run.begin_round(calls);
                let mut slots = empty_slots(calls.len());
                let mut results = service.execute_round(&calls, &context);
                while let Some((index, result)) = results.next().await {
                    match result {
                        Ok(result) => {
                            yield ChatEvent::ToolResult(result.output.clone());
                            slots[index] = Some(result);
                        }
                        Err(error) => break 'rounds Some(error),
                    }
                }
                if let Err(error) = run.record_round(calls, slots) {
                    break Some(error);
                }
            };

            match failure {
                Some(error) => {
                    service
                        .hooks
                        .on_run_failure(&run.id, &error, started_at.elapsed());
                    yield ChatEvent::Error(error.message);
                }
                None => {
                    service
                        .hooks
                        .on_run_success(&run.id, run.rounds, started_at.elapsed());
                }
            }

            yield ChatEvent::Done;
        })
    }

    async fn complete_rounds(&self, run: &mut Run) -> Result<String, ChatError> {
        loop {
            self.hooks.on_round_start(&run.id, run.rounds);

            let request = self.model_request(run, false)?;
            let response = self.provider.complete(request).await?;
            let calls = response.tool_calls();
            let text = response.text();
            self.hooks
                .on_model_response(&run.id, run.rounds, calls.len());

            if calls.is_empty() {
                run.conversation.push(ProtocolMessage::assistant(text.clone()));
                return Ok(text);
            }

            self.check_round_limit(run)?;
            run.think_text.push_str(&text);
            self.dispatch_round(run, calls).await?;
        }
    }

    fn model_request(&self, run: &Run, stream: bool) -> Result<ModelRequest, ChatError> {
        let messages = to_native(&run.conversation)?;

        ModelRequest::builder(self.policy.model.clone())
            .messages(messages)
            .options(self.policy.options)
            .streaming(stream)
            .tools(self.dispatcher.definitions())
            .metadata("run_id", run.id.as_str())
            .build()
            .map_err(|error| ChatError::invalid_request(error.message))
    }

    fn check_round_limit(&self, run: &Run) -> Result<(), ChatError> {
        match self.policy.max_tool_rounds {
            Some(limit) if run.rounds >= limit => Err(ChatError::round_limit(format!(
                "model still requested tools after {limit} tool rounds"
            ))),
            _ => Ok(()),
        }
    }

    /// Dispatches one round of calls and appends each call/result pair in request order.
    async fn dispatch_round(&self, run: &mut Run, calls: Vec<ToolCall>) -> Result<(), ChatError> {
        let (calls, context) = run.begin_round(calls);
        let mut slots = empty_slots(calls.len());
        let mut results = self.execute_round(&calls, &context);
        while let Some((index, result)) = results.next().await {
            slots[index] = Some(result?);
        }
        run.record_round(calls, slots)
    }

    /// Spawns the round's calls and yields `(request index, result)` as each one
    /// finishes.
    ///
    /// Every call runs on its own task, so dropping the returned stream leaves
    /// calls already started running to completion. Sequential mode starts the
    /// next call only after the previous one has finished.
    fn execute_round(&self, calls: &[ToolCall], context: &ToolExecutionContext) -> RoundResults {
        match self.policy.tool_execution {
            ToolExecutionMode::Sequential => {
                let dispatcher = Arc::clone(&self.dispatcher);
                let calls = calls.to_vec();
                let context = context.clone();
                Box::pin(stream! {
                    for (index, call) in calls.iter().enumerate() {
                        let handle = spawn_dispatch(&dispatcher, call, &context);
                        yield (index, settle(call, handle.await));
                    }
                })
            }
            ToolExecutionMode::Concurrent => {
                let pending = calls
                    .iter()
                    .enumerate()
                    .map(|(index, call)| {
                        let handle = spawn_dispatch(&self.dispatcher, call, context);
                        let call = call.clone();
                        async move { (index, settle(&call, handle.await)) }
                    })
                    .collect::<FuturesUnordered<_>>();
                Box::pin(pending)
            }
        }
    }
}

type RoundResults =
    Pin<Box<dyn Stream<Item = (usize, Result<ToolExecutionResult, ChatError>)> + Send>>;

fn spawn_dispatch(
    dispatcher: &Arc<ToolDispatcher>,
    call: &ToolCall,
    context: &ToolExecutionContext,
) -> JoinHandle<ToolExecutionResult> {
    let dispatcher = Arc::clone(dispatcher);
    let call = call.clone();
    let context = context.clone();
    tokio::spawn(async move { dispatcher.dispatch(call, context).await })
}

fn settle(
    call: &ToolCall,
    joined: Result<ToolExecutionResult, JoinError>,
) -> Result<ToolExecutionResult, ChatError> {
    match joined {
        Ok(result) => Ok(result),
        Err(error) if error.is_panic() => Ok(ToolExecutionResult::failure(
            call,
            format!("tool {} panicked", call.name),
        )),
        Err(_) => Err(ChatError::cancelled(format!(
            "tool {} was cancelled before completing",
            call.name
        ))),
    }
}

fn empty_slots(len: usize) -> Vec<Option<ToolExecutionResult>> {
    (0..len).map(|_| None).collect()
}

struct Run {
    id: RunId,
    conversation: Vec<ProtocolMessage>,
    ids: ToolCallIds,
    rounds: u32,
    think_text: String,
}

impl Run {
    fn start(messages: Vec<ProtocolMessage>) -> Result<Self, ChatError> {
        if messages.is_empty() {
            return Err(ChatError::invalid_request(
                "at least one message is required",
            ));
        }
        to_native(&messages)?;

        Ok(Self {
            id: RunId::new(format!("run_{}", Uuid::new_v4().simple())),
            ids: ToolCallIds::from_conversation(&messages),
            conversation: messages,
            rounds: 0,
            think_text: String::new(),
        })
    }

    fn begin_round(&mut self, calls: Vec<ToolCall>) -> (Vec<ToolCall>, ToolExecutionContext) {
        let calls = calls
            .into_iter()
            .map(|call| self.ids.assign(call))
            .collect::<Vec<_>>();
        let context = ToolExecutionContext::new(self.id.clone())
            .with_metadata("round", self.rounds.to_string());
        (calls, context)
    }

    fn record_round(
        &mut self,
        calls: Vec<ToolCall>,
        slots: Vec<Option<ToolExecutionResult>>,
    ) -> Result<(), ChatError> {
        let results = slots
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ChatError::cancelled("tool round ended before every call finished"))?;

        for (call, result) in calls.into_iter().zip(results) {
            self.conversation
                .push(ProtocolMessage::assistant_tool_call(call));
            self.conversation
                .push(ProtocolMessage::tool(result.tool_call_id, result.output));
        }
        self.rounds += 1;
        Ok(())
    }
}
