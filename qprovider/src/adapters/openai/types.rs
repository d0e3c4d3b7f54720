//! OpenAI adapter types and provider-agnostic conversion logic.

use std::fmt::Formatter;
use std::sync::Arc;

use serde_json::Value;

use crate::{
    Message, ModelResponse, OutputItem, ProviderId, Role, SecretString, StopReason, StreamEvent,
    TokenUsage, ToolCall, ToolDefinition,
};

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiRequest {
    pub model: String,
    pub messages: Vec<OpenAiMessage>,
    pub tools: Vec<OpenAiTool>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiMessage {
    pub role: OpenAiRole,
    pub content: String,
    pub tool_calls: Vec<OpenAiToolCall>,
    pub tool_call_id: Option<String>,
}

impl From<Message> for OpenAiMessage {
    fn from(value: Message) -> Self {
        Self {
            role: value.role.into(),
            content: value.content,
            tool_calls: value
                .tool_calls
                .into_iter()
                .map(OpenAiToolCall::from)
                .collect(),
            tool_call_id: value.tool_call_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiRole {
    System,
    User,
    Assistant,
    Tool,
}

impl OpenAiRole {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

impl From<Role> for OpenAiRole {
    fn from(value: Role) -> Self {
        match value {
            Role::System => Self::System,
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
            Role::Tool => Self::Tool,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenAiTool {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

impl From<ToolDefinition> for OpenAiTool {
    fn from(value: ToolDefinition) -> Self {
        Self {
            name: value.name,
            description: value.description,
            parameters: value.input_schema,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiResponse {
    pub model: String,
    pub message: OpenAiAssistantMessage,
    pub finish_reason: OpenAiFinishReason,
    pub usage: OpenAiUsage,
}

impl OpenAiResponse {
    pub(crate) fn into_model_response(self, provider: ProviderId) -> ModelResponse {
        let mut output = Vec::new();
        if !self.message.content.is_empty() {
            output.push(OutputItem::Message(Message::new(
                Role::Assistant,
                self.message.content,
            )));
        }

        output.extend(
            self.message
                .tool_calls
                .into_iter()
                .map(|tool_call| OutputItem::ToolCall(ToolCall::from(tool_call))),
        );

        ModelResponse {
            provider,
            model: self.model,
            output,
            stop_reason: self.finish_reason.into(),
            usage: self.usage.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenAiAssistantMessage {
    pub content: String,
    pub tool_calls: Vec<OpenAiToolCall>,
}

/// Tool call as it travels on the wire: arguments are a JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenAiToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

impl From<OpenAiToolCall> for ToolCall {
    fn from(value: OpenAiToolCall) -> Self {
        Self {
            id: value.id,
            name: value.name,
            arguments: parse_arguments(&value.arguments),
        }
    }
}

impl From<ToolCall> for OpenAiToolCall {
    fn from(value: ToolCall) -> Self {
        Self {
            id: value.id,
            name: value.name,
            arguments: value.arguments.to_string(),
        }
    }
}

/// Empty argument text becomes `{}`; text that is not JSON is kept as a string
/// value so schema validation reports it instead of the adapter dropping the call.
pub(crate) fn parse_arguments(raw: &str) -> Value {
    if raw.trim().is_empty() {
        return Value::Object(serde_json::Map::new());
    }

    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenAiFinishReason {
    Stop,
    Length,
    ToolCalls,
    Cancelled,
    Other,
}

impl From<OpenAiFinishReason> for StopReason {
    fn from(value: OpenAiFinishReason) -> Self {
        match value {
            OpenAiFinishReason::Stop => Self::EndTurn,
            OpenAiFinishReason::Length => Self::MaxTokens,
            OpenAiFinishReason::ToolCalls => Self::ToolUse,
            OpenAiFinishReason::Cancelled => Self::Cancelled,
            OpenAiFinishReason::Other => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenAiUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl From<OpenAiUsage> for TokenUsage {
    fn from(value: OpenAiUsage) -> Self {
        Self {
            input_tokens: value.prompt_tokens,
            output_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

#[derive(Clone)]
pub enum OpenAiAuth {
    ApiKey(Arc<SecretString>),
}

impl std::fmt::Debug for OpenAiAuth {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("OpenAiAuth::ApiKey([REDACTED])"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenAiStreamChunk {
    TextDelta(String),
    ToolCallReady(OpenAiToolCall),
    MessageComplete(OpenAiAssistantMessage),
    ResponseComplete(OpenAiResponse),
}

impl OpenAiStreamChunk {
    pub(crate) fn into_stream_event(self, provider: ProviderId) -> StreamEvent {
        match self {
            Self::TextDelta(delta) => StreamEvent::TextDelta(delta),
            Self::ToolCallReady(tool_call) => StreamEvent::ToolCallReady(tool_call.into()),
            Self::MessageComplete(message) => {
                let mut native = Message::new(Role::Assistant, message.content);
                native.tool_calls = message
                    .tool_calls
                    .into_iter()
                    .map(ToolCall::from)
                    .collect();
                StreamEvent::MessageComplete(native)
            }
            Self::ResponseComplete(response) => {
                StreamEvent::ResponseComplete(response.into_model_response(provider))
            }
        }
    }
}
