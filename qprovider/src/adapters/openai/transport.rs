//! OpenAI transport trait, SSE chunk accumulation, and reqwest-based HTTP implementation.

use std::collections::BTreeMap;
use std::pin::Pin;

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;
use reqwest::{Client, Response, StatusCode};

use crate::{ProviderError, ProviderFuture};

use super::serde_api::{
    OpenAiApiResponse, OpenAiApiStreamResponse, build_api_request, extract_error_message,
    parse_finish_reason,
};
use super::types::{
    OpenAiAssistantMessage, OpenAiAuth, OpenAiFinishReason, OpenAiRequest, OpenAiResponse,
    OpenAiStreamChunk, OpenAiToolCall, OpenAiUsage,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";

pub type OpenAiChunkStream<'a> =
    Pin<Box<dyn Stream<Item = Result<OpenAiStreamChunk, ProviderError>> + Send + 'a>>;

pub trait OpenAiTransport: Send + Sync + std::fmt::Debug {
    fn complete<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiResponse, ProviderError>>;

    fn stream<'a>(
        &'a self,
        request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>>;
}

/// Folds `data:` lines of a chat-completions SSE body into stream chunks.
///
/// Text deltas are surfaced as they arrive. Tool-call fragments are merged by
/// their `index` and only surfaced from [`finish`](Self::finish), once every
/// fragment has been seen, in index order.
#[derive(Debug, Default)]
pub struct OpenAiStreamAccumulator {
    buffer: Vec<u8>,
    content: String,
    tool_calls: BTreeMap<u32, OpenAiToolCall>,
    model: Option<String>,
    finish_reason: Option<OpenAiFinishReason>,
    usage: OpenAiUsage,
    finished: bool,
}

impl OpenAiStreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Buffers raw body bytes and processes every complete line.
    ///
    /// Multi-byte characters split across network chunks are reassembled before decoding.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<Vec<OpenAiStreamChunk>, ProviderError> {
        self.buffer.extend_from_slice(bytes);

        let mut chunks = Vec::new();
        loop {
            if self.finished {
                break;
            }

            let Some(newline_index) = self.buffer.iter().position(|byte| *byte == b'\n') else {
                break;
            };

            let line = self.buffer.drain(..=newline_index).collect::<Vec<_>>();
            let line = std::str::from_utf8(&line)
                .map_err(|err| ProviderError::protocol(format!("stream is not UTF-8: {err}")))?;
            chunks.extend(self.push_line(line)?);
        }

        Ok(chunks)
    }

    pub fn push_line(&mut self, line: &str) -> Result<Vec<OpenAiStreamChunk>, ProviderError> {
        let line = line.trim();
        let Some(payload) = line.strip_prefix("data:") else {
            return Ok(Vec::new());
        };

        let payload = payload.trim();
        if payload == "[DONE]" {
            self.finished = true;
            return Ok(Vec::new());
        }

        let parsed: OpenAiApiStreamResponse = serde_json::from_str(payload)
            .map_err(|err| ProviderError::protocol(format!("malformed stream chunk: {err}")))?;

        if self.model.is_none() {
            self.model = parsed.model.clone();
        }

        if let Some(usage) = parsed.usage {
            self.usage = usage.into();
        }

        let mut chunks = Vec::new();
        let Some(choice) = parsed.choices.into_iter().next() else {
            return Ok(chunks);
        };

        if let Some(delta_content) = choice.delta.content
            && !delta_content.is_empty()
        {
            self.content.push_str(&delta_content);
            chunks.push(OpenAiStreamChunk::TextDelta(delta_content));
        }

        for delta_call in choice.delta.tool_calls.unwrap_or_default() {
            let index = delta_call.index.unwrap_or(0);
            let entry = self.tool_calls.entry(index).or_default();

            if let Some(id) = delta_call.id
                && !id.is_empty()
            {
                entry.id = id;
            }

            if let Some(function) = delta_call.function {
                if let Some(name) = function.name
                    && !name.is_empty()
                {
                    entry.name = name;
                }

                if let Some(arguments) = function.arguments {
                    entry.arguments.push_str(&arguments);
                }
            }
        }

        if choice.finish_reason.is_some() {
            self.finish_reason = Some(parse_finish_reason(choice.finish_reason.as_deref()));
        }

        Ok(chunks)
    }

    /// Flushes any trailing unterminated line and emits the assembled tool calls
    /// followed by the completion milestones.
    pub fn finish(mut self, fallback_model: &str) -> Result<Vec<OpenAiStreamChunk>, ProviderError> {
        let mut chunks = Vec::new();
        if !self.finished && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            let rest = std::str::from_utf8(&rest)
                .map_err(|err| ProviderError::protocol(format!("stream is not UTF-8: {err}")))?;
            chunks.extend(self.push_line(rest)?);
        }

        let tool_calls = self.tool_calls.into_values().collect::<Vec<_>>();
        if tool_calls.iter().any(|call| call.name.is_empty()) {
            return Err(ProviderError::protocol(
                "stream ended with a tool call that has no function name",
            ));
        }

        chunks.extend(
            tool_calls
                .iter()
                .cloned()
                .map(OpenAiStreamChunk::ToolCallReady),
        );

        let finish_reason = self.finish_reason.unwrap_or(if tool_calls.is_empty() {
            OpenAiFinishReason::Other
        } else {
            OpenAiFinishReason::ToolCalls
        });

        let message = OpenAiAssistantMessage {
            content: self.content,
            tool_calls,
        };

        chunks.push(OpenAiStreamChunk::MessageComplete(message.clone()));
        chunks.push(OpenAiStreamChunk::ResponseComplete(OpenAiResponse {
            model: self.model.unwrap_or_else(|| fallback_model.to_string()),
            message,
            finish_reason,
            usage: self.usage,
        }));

        Ok(chunks)
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiHttpTransport {
    client: Client,
    base_url: String,
}

impl OpenAiHttpTransport {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            base_url: OPENAI_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn apply_auth(
        &self,
        builder: reqwest::RequestBuilder,
        auth: &OpenAiAuth,
    ) -> reqwest::RequestBuilder {
        match auth {
            OpenAiAuth::ApiKey(key) => builder.bearer_auth(key.expose()),
        }
    }

    async fn send(
        &self,
        request: OpenAiRequest,
        auth: &OpenAiAuth,
    ) -> Result<Response, ProviderError> {
        let api_request = build_api_request(request)?;
        let url = self.endpoint("chat/completions");
        let builder = self.client.post(url).json(&api_request);
        let response = self
            .apply_auth(builder, auth)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        if !response.status().is_success() {
            return Err(Self::parse_error(response).await);
        }

        Ok(response)
    }

    async fn parse_error(response: Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = extract_error_message(&body)
            .unwrap_or_else(|| format!("chat completion request failed with status {status}"));

        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderError::authentication(message)
            }
            StatusCode::PAYMENT_REQUIRED => ProviderError::authentication(message),
            StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
                ProviderError::timeout(message)
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ProviderError::invalid_request(message)
            }
            StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY => {
                ProviderError::unavailable(message)
            }
            _ => ProviderError::transport(message),
        }
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::timeout(err.to_string())
    } else {
        ProviderError::transport(err.to_string())
    }
}

impl OpenAiTransport for OpenAiHttpTransport {
    fn complete<'a>(
        &'a self,
        mut request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiResponse, ProviderError>> {
        Box::pin(async move {
            request.stream = false;
            let response = self.send(request, &auth).await?;
            let parsed: OpenAiApiResponse = response
                .json()
                .await
                .map_err(|err| ProviderError::protocol(err.to_string()))?;

            OpenAiResponse::try_from(parsed)
        })
    }

    fn stream<'a>(
        &'a self,
        mut request: OpenAiRequest,
        auth: OpenAiAuth,
    ) -> ProviderFuture<'a, Result<OpenAiChunkStream<'a>, ProviderError>> {
        Box::pin(async move {
            request.stream = true;
            let fallback_model = request.model.clone();
            let response = self.send(request, &auth).await?;

            let stream = try_stream! {
                let mut body = response.bytes_stream();
                let mut accumulator = OpenAiStreamAccumulator::new();

                while let Some(item) = body.next().await {
                    let bytes = item.map_err(map_reqwest_error)?;
                    for chunk in accumulator.push_bytes(&bytes)? {
                        yield chunk;
                    }

                    if accumulator.is_finished() {
                        break;
                    }
                }

                for chunk in accumulator.finish(&fallback_model)? {
                    yield chunk;
                }
            };

            Ok(Box::pin(stream) as OpenAiChunkStream<'a>)
        })
    }
}
