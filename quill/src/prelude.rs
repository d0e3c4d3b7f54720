//! Common imports for most quill applications.

pub use crate::{
    ChapterPlanRequest, OutlineContentRequest, QuillConfig, QuillRuntime, build_runtime,
    build_runtime_with, chapter_list_conversation, outline_content_conversation,
};
pub use crate::{
    ChatError, ChatEvent, ChatEventStream, ChatPolicy, ChatService, ChatTurnResult,
    InMemoryWritingStore, Message, ModelProvider, ProtocolMessage, ProtocolRole, ProviderError,
    Role, ToolCall, ToolDispatcher, ToolExecutionMode, WritingStore, writing_tool_registry,
};
