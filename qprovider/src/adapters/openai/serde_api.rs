//! OpenAI HTTP payload serde models and conversion helpers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ProviderError;

use super::types::{
    OpenAiAssistantMessage, OpenAiFinishReason, OpenAiMessage, OpenAiRequest, OpenAiResponse,
    OpenAiRole, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};

pub(crate) fn build_api_request(request: OpenAiRequest) -> Result<OpenAiApiRequest, ProviderError> {
    let messages = request
        .messages
        .into_iter()
        .map(OpenAiApiMessage::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    if messages.is_empty() {
        return Err(ProviderError::invalid_request(
            "chat completion request requires at least one message",
        ));
    }

    let tools = if request.tools.is_empty() {
        None
    } else {
        Some(
            request
                .tools
                .into_iter()
                .map(OpenAiApiTool::from)
                .collect::<Vec<_>>(),
        )
    };

    Ok(OpenAiApiRequest {
        model: request.model,
        messages,
        tools,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        stream: request.stream,
    })
}

pub(crate) fn parse_finish_reason(value: Option<&str>) -> OpenAiFinishReason {
    match value {
        Some("stop") => OpenAiFinishReason::Stop,
        Some("length") => OpenAiFinishReason::Length,
        Some("tool_calls") | Some("function_call") => OpenAiFinishReason::ToolCalls,
        Some("cancelled") => OpenAiFinishReason::Cancelled,
        _ => OpenAiFinishReason::Other,
    }
}

pub(crate) fn extract_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<OpenAiApiErrorEnvelope>(body).ok()?;
    Some(parsed.error.message)
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiErrorEnvelope {
    pub error: OpenAiApiError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiError {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiRequest {
    pub model: String,
    pub messages: Vec<OpenAiApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<OpenAiApiTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiMessage {
    pub role: String,
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<OpenAiApiToolCallOut>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl TryFrom<OpenAiMessage> for OpenAiApiMessage {
    type Error = ProviderError;

    fn try_from(value: OpenAiMessage) -> Result<Self, Self::Error> {
        match value.role {
            OpenAiRole::System | OpenAiRole::User if value.content.trim().is_empty() => {
                return Err(ProviderError::invalid_request(format!(
                    "{} message content must not be empty",
                    value.role.as_str()
                )));
            }
            OpenAiRole::Tool if value.tool_call_id.is_none() => {
                return Err(ProviderError::invalid_request(
                    "tool message requires a tool_call_id",
                ));
            }
            _ => {}
        }

        if value.tool_calls.iter().any(|call| call.id.trim().is_empty()) {
            return Err(ProviderError::invalid_request(
                "assistant tool calls must carry an id",
            ));
        }

        let tool_calls = if value.tool_calls.is_empty() {
            None
        } else {
            Some(
                value
                    .tool_calls
                    .into_iter()
                    .map(OpenAiApiToolCallOut::from)
                    .collect(),
            )
        };

        // Assistant turns that only request tools carry `content: null`.
        let content = if value.content.is_empty() && tool_calls.is_some() {
            None
        } else {
            Some(value.content)
        };

        Ok(Self {
            role: value.role.as_str().to_string(),
            content,
            tool_calls,
            tool_call_id: value.tool_call_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiToolCallOut {
    pub id: String,
    pub r#type: String,
    pub function: OpenAiApiToolFunction,
}

impl From<OpenAiToolCall> for OpenAiApiToolCallOut {
    fn from(value: OpenAiToolCall) -> Self {
        Self {
            id: value.id,
            r#type: "function".to_string(),
            function: OpenAiApiToolFunction {
                name: value.name,
                arguments: value.arguments,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiTool {
    pub r#type: String,
    pub function: OpenAiApiFunction,
}

impl From<OpenAiTool> for OpenAiApiTool {
    fn from(value: OpenAiTool) -> Self {
        Self {
            r#type: "function".to_string(),
            function: OpenAiApiFunction {
                name: value.name,
                description: value.description,
                parameters: value.parameters,
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct OpenAiApiFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiResponse {
    #[serde(default)]
    pub model: String,
    pub choices: Vec<OpenAiApiChoice>,
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiChoice {
    pub message: OpenAiApiAssistantMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiAssistantMessage {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiToolCall {
    #[serde(default)]
    pub id: Option<String>,
    pub function: OpenAiApiToolFunction,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct OpenAiApiToolFunction {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

#[derive(Debug, Deserialize, Default)]
pub(crate) struct OpenAiApiUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

impl From<OpenAiApiUsage> for OpenAiUsage {
    fn from(value: OpenAiApiUsage) -> Self {
        Self {
            prompt_tokens: value.prompt_tokens,
            completion_tokens: value.completion_tokens,
            total_tokens: value.total_tokens,
        }
    }
}

impl TryFrom<OpenAiApiResponse> for OpenAiResponse {
    type Error = ProviderError;

    fn try_from(value: OpenAiApiResponse) -> Result<Self, Self::Error> {
        let choice = value.choices.into_iter().next().ok_or_else(|| {
            ProviderError::protocol("chat completion response did not include choices")
        })?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|call| OpenAiToolCall {
                id: call.id.unwrap_or_default(),
                name: call.function.name,
                arguments: call.function.arguments,
            })
            .collect::<Vec<_>>();

        Ok(Self {
            model: value.model,
            message: OpenAiAssistantMessage {
                content: choice.message.content.unwrap_or_default(),
                tool_calls,
            },
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
            usage: value.usage.unwrap_or_default().into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<OpenAiApiStreamChoice>,
    pub usage: Option<OpenAiApiUsage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamChoice {
    pub delta: OpenAiApiStreamDelta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiStreamDelta {
    pub content: Option<String>,
    pub tool_calls: Option<Vec<OpenAiApiDeltaToolCall>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolCall {
    pub index: Option<u32>,
    pub id: Option<String>,
    pub function: Option<OpenAiApiDeltaToolFunction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OpenAiApiDeltaToolFunction {
    pub name: Option<String>,
    pub arguments: Option<String>,
}
