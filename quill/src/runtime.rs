//! Wiring of provider, store, tool catalog, and chat service from configuration.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use qchat::ChatService;
use qobserve::{SafeChatHooks, SafeToolHooks, TracingObservabilityHooks};
use qprovider::{ModelProvider, ProviderError};
use qstore::{StoreError, WritingStore, create_writing_store, writing_tool_registry};
use qtooling::{ToolDispatcher, ToolError};
use reqwest::Client;

use crate::config::{ConfigError, ModelConfig, QuillConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    Config,
    Provider,
    Store,
    Tooling,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeError {
    pub kind: RuntimeErrorKind,
    pub message: String,
}

impl RuntimeError {
    pub fn new(kind: RuntimeErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::new(RuntimeErrorKind::Config, value.to_string())
    }
}

impl From<ProviderError> for RuntimeError {
    fn from(value: ProviderError) -> Self {
        Self::new(RuntimeErrorKind::Provider, value.to_string())
    }
}

impl From<StoreError> for RuntimeError {
    fn from(value: StoreError) -> Self {
        Self::new(RuntimeErrorKind::Store, value.to_string())
    }
}

impl From<ToolError> for RuntimeError {
    fn from(value: ToolError) -> Self {
        Self::new(RuntimeErrorKind::Tooling, value.to_string())
    }
}

/// Everything a front end needs to serve writing-assistant requests.
#[derive(Clone)]
pub struct QuillRuntime {
    pub store: Arc<dyn WritingStore>,
    pub tools: Arc<ToolDispatcher>,
    pub chat: ChatService,
}

/// Opens the configured store and connects to the configured model endpoint.
pub fn build_runtime(config: &QuillConfig) -> Result<QuillRuntime, RuntimeError> {
    let provider = build_provider(&config.model)?;
    let store = create_writing_store(config.store_config())?;
    build_runtime_with(provider, store, config)
}

/// Builds a runtime around an existing provider and store.
pub fn build_runtime_with(
    provider: Arc<dyn ModelProvider>,
    store: Arc<dyn WritingStore>,
    config: &QuillConfig,
) -> Result<QuillRuntime, RuntimeError> {
    let registry = writing_tool_registry(Arc::clone(&store))?;

    let mut dispatcher = ToolDispatcher::new(Arc::new(registry))
        .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)));
    if let Some(timeout) = config.chat.tool_timeout() {
        dispatcher = dispatcher.with_timeout(timeout);
    }
    let tools = Arc::new(dispatcher);

    let chat = ChatService::builder(provider)
        .tool_dispatcher(Arc::clone(&tools))
        .policy(config.chat_policy())
        .hooks(Arc::new(SafeChatHooks::new(TracingObservabilityHooks)))
        .build();

    Ok(QuillRuntime { store, tools, chat })
}

/// OpenAI-compatible provider for the configured endpoint.
pub fn build_provider(config: &ModelConfig) -> Result<Arc<dyn ModelProvider>, RuntimeError> {
    let api_key = config.secret_api_key()?;
    let http = Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|err| ProviderError::transport(err.to_string()))?;

    build_openai_provider(api_key, http, config)
}

#[cfg(feature = "provider-openai")]
fn build_openai_provider(
    api_key: qprovider::SecretString,
    http: Client,
    config: &ModelConfig,
) -> Result<Arc<dyn ModelProvider>, RuntimeError> {
    use qprovider::ProviderId;
    use qprovider::adapters::openai::{OPENAI_BASE_URL, OpenAiHttpTransport, OpenAiProvider};

    let base_url = config.base_url.trim().trim_end_matches('/').to_string();
    let provider_id = if base_url == OPENAI_BASE_URL {
        ProviderId::OpenAi
    } else {
        ProviderId::DeepSeek
    };
    let transport = Arc::new(OpenAiHttpTransport::new(http).with_base_url(base_url));

    Ok(Arc::new(
        OpenAiProvider::new(api_key, transport)
            .with_provider_id(provider_id)
            .with_fallback_model(config.model.clone()),
    ))
}

#[cfg(not(feature = "provider-openai"))]
fn build_openai_provider(
    _api_key: qprovider::SecretString,
    _http: Client,
    _config: &ModelConfig,
) -> Result<Arc<dyn ModelProvider>, RuntimeError> {
    Err(ProviderError::invalid_request("provider-openai feature is not enabled on quill").into())
}
