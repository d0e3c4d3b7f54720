//! OpenAI-compatible provider implementation over transport and shared models.

use std::sync::Arc;

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::{
    BoxedEventStream, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderFuture,
    ProviderId, SecretString,
};

use super::transport::OpenAiTransport;
use super::types::{OpenAiAuth, OpenAiMessage, OpenAiRequest, OpenAiTool};

pub const DEFAULT_MODEL: &str = "deepseek-chat";

#[derive(Clone)]
pub struct OpenAiProvider {
    api_key: Arc<SecretString>,
    transport: Arc<dyn OpenAiTransport>,
    provider_id: ProviderId,
    fallback_model: String,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_key", &"[REDACTED]")
            .field("transport", &self.transport)
            .field("provider_id", &self.provider_id)
            .field("fallback_model", &self.fallback_model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: SecretString, transport: Arc<dyn OpenAiTransport>) -> Self {
        Self {
            api_key: Arc::new(api_key),
            transport,
            provider_id: ProviderId::DeepSeek,
            fallback_model: DEFAULT_MODEL.to_string(),
        }
    }

    pub fn with_provider_id(mut self, provider_id: ProviderId) -> Self {
        self.provider_id = provider_id;
        self
    }

    /// Model used when a request leaves `model` blank.
    pub fn with_fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = model.into();
        self
    }

    fn auth(&self) -> Result<OpenAiAuth, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::authentication("no API key configured"));
        }

        Ok(OpenAiAuth::ApiKey(Arc::clone(&self.api_key)))
    }

    fn prepare(&self, mut request: ModelRequest) -> Result<ModelRequest, ProviderError> {
        if request.model.trim().is_empty() {
            request.model = self.fallback_model.clone();
        }

        request.validate()?;
        Ok(request)
    }

    pub(crate) fn build_openai_request(&self, request: ModelRequest, stream: bool) -> OpenAiRequest {
        let messages = request
            .messages
            .into_iter()
            .map(OpenAiMessage::from)
            .collect::<Vec<_>>();

        let tools = request
            .tools
            .into_iter()
            .map(OpenAiTool::from)
            .collect::<Vec<_>>();

        OpenAiRequest {
            model: request.model,
            messages,
            tools,
            temperature: request.options.temperature,
            max_tokens: request.options.max_tokens,
            stream,
        }
    }
}

impl ModelProvider for OpenAiProvider {
    fn id(&self) -> ProviderId {
        self.provider_id
    }

    fn complete<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<ModelResponse, ProviderError>> {
        Box::pin(async move {
            let request = self.prepare(request)?;
            let auth = self.auth()?;
            let openai_request = self.build_openai_request(request, false);
            let response = self.transport.complete(openai_request, auth).await?;
            Ok(response.into_model_response(self.provider_id))
        })
    }

    fn stream<'a>(
        &'a self,
        request: ModelRequest,
    ) -> ProviderFuture<'a, Result<BoxedEventStream<'a>, ProviderError>> {
        Box::pin(async move {
            let request = self.prepare(request)?;
            let auth = self.auth()?;
            let openai_request = self.build_openai_request(request, true);
            let mut chunks = self.transport.stream(openai_request, auth).await?;
            let provider_id = self.provider_id;

            let stream = try_stream! {
                while let Some(chunk) = chunks.next().await {
                    yield chunk?.into_stream_event(provider_id);
                }
            };

            Ok(Box::pin(stream) as BoxedEventStream<'a>)
        })
    }
}
