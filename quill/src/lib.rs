//! Unified facade over the quill workspace crates.
//!
//! Most applications depend on this crate alone. It re-exports the chat loop,
//! the writing store and its tool catalog, and the provider contracts, and adds
//! configuration loading, runtime wiring, the chapter/outline generation flows,
//! and HTTP response helpers.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use quill::{InMemoryWritingStore, ToolDispatcher, WritingStore, writing_tool_registry};
//!
//! let store: Arc<dyn WritingStore> = Arc::new(InMemoryWritingStore::new());
//! let registry = writing_tool_registry(store).expect("catalog builds");
//! let dispatcher = ToolDispatcher::new(Arc::new(registry));
//!
//! assert_eq!(dispatcher.definitions().len(), 8);
//! ```

pub mod config;
pub mod generate;
pub mod http;
pub mod prelude;
pub mod runtime;

pub use qchat;
pub use qcommon;
pub use qobserve;
pub use qprovider;
pub use qstore;
pub use qtooling;

pub use qchat::{
    ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatPolicy, ChatRunHooks, ChatService,
    ChatServiceBuilder, ChatTurnResult, NoopChatRunHooks, ProtocolMessage, ProtocolRole,
    ToolExecutionMode, sse, to_native,
};
pub use qcommon::{BoxFuture, GenerationOptions, MetadataMap, RunId};
pub use qobserve::{
    MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks,
};
pub use qprovider::{
    Message, ModelProvider, ModelRequest, ModelResponse, ProviderError, ProviderErrorKind,
    ProviderId, Role, SecretString, StreamEvent, ToolCall, ToolDefinition,
};
pub use qstore::{
    Chapter, ChapterDraft, ChapterId, ChapterPatch, ChapterPreview, InMemoryWritingStore, Outline,
    OutlineDraft, OutlineId, SqliteWritingStore, StoreConfig, StoreError, StoreErrorKind,
    WritingStore, create_writing_store, writing_tool_registry,
};
pub use qtooling::{
    ToolDispatchHooks, ToolDispatcher, ToolError, ToolErrorKind, ToolExecutionContext,
    ToolExecutionResult, ToolRegistry, ToolSpec,
};

pub use config::{
    ChatSettings, ConfigError, ConfigErrorKind, ModelConfig, QuillConfig, StoreBackend,
    StoreSettings, ToolExecution,
};
pub use generate::{
    ChapterPlanRequest, GenerateError, GenerateErrorKind, OutlineContentRequest,
    chapter_list_conversation, outline_content_conversation,
};
pub use runtime::{
    QuillRuntime, RuntimeError, RuntimeErrorKind, build_provider, build_runtime,
    build_runtime_with,
};
