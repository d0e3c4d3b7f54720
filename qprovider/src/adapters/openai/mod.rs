//! OpenAI-compatible chat-completions adapter (OpenAI, DeepSeek, and other
//! endpoints that speak the same wire format).

mod provider;
mod serde_api;
mod transport;
mod types;

pub use provider::{DEFAULT_MODEL, OpenAiProvider};
pub use transport::{
    DEEPSEEK_BASE_URL, OPENAI_BASE_URL, OpenAiChunkStream, OpenAiHttpTransport,
    OpenAiStreamAccumulator, OpenAiTransport,
};
pub use types::{
    OpenAiAssistantMessage, OpenAiAuth, OpenAiFinishReason, OpenAiMessage, OpenAiRequest,
    OpenAiResponse, OpenAiRole, OpenAiStreamChunk, OpenAiTool, OpenAiToolCall, OpenAiUsage,
};
