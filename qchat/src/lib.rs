//! Conversational tool-calling orchestration.
//!
//! A [`ChatService`] converts a [`ProtocolMessage`] history to model-native
//! messages, asks the model for a response, dispatches any requested tools, and
//! repeats until the model answers without tools. Runs are available single-shot
//! ([`ChatService::run_turn`]) or as a [`ChatEventStream`] that can be framed as
//! server-sent events with [`sse::sse_body`].

mod error;
mod hooks;
mod ids;
mod protocol;
mod service;
pub mod sse;
mod types;

pub mod prelude {
    pub use crate::{
        ChatError, ChatErrorKind, ChatEvent, ChatEventStream, ChatPolicy, ChatRunHooks,
        ChatService, ChatServiceBuilder, ChatTurnResult, NoopChatRunHooks, ProtocolMessage,
        ProtocolRole, ToolExecutionMode, to_native,
    };
    pub use qcommon::{GenerationOptions, RunId};
    pub use qtooling::{ToolDispatcher, ToolRegistry};
}

pub use error::{ChatError, ChatErrorKind};
pub use hooks::{ChatRunHooks, NoopChatRunHooks};
pub use protocol::{ProtocolMessage, ProtocolRole, to_native};
pub use qcommon::{GenerationOptions, RunId};
pub use service::{ChatService, ChatServiceBuilder};
pub use types::{
    ChatEvent, ChatEventStream, ChatPolicy, ChatTurnResult, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE, ToolExecutionMode,
};
