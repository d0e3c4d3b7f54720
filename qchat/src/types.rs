//! Run policy, turn results, and chat event types.

use std::pin::Pin;

use futures_core::Stream;
use qcommon::GenerationOptions;

use crate::ProtocolMessage;

pub const DEFAULT_MODEL: &str = "deepseek-chat";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 32_768;

/// How the calls of one model round are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolExecutionMode {
    /// Every call of a round runs at once; results are still appended in request order.
    #[default]
    Concurrent,
    Sequential,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatPolicy {
    pub model: String,
    pub options: GenerationOptions,
    /// `None` lets the model keep calling tools for as long as it wants.
    pub max_tool_rounds: Option<u32>,
    pub tool_execution: ToolExecutionMode,
}

impl Default for ChatPolicy {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            options: GenerationOptions::default()
                .with_temperature(DEFAULT_TEMPERATURE)
                .with_max_tokens(DEFAULT_MAX_TOKENS),
            max_tool_rounds: None,
            tool_execution: ToolExecutionMode::Concurrent,
        }
    }
}

impl ChatPolicy {
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = Some(rounds);
        self
    }

    pub fn with_tool_execution(mut self, mode: ToolExecutionMode) -> Self {
        self.tool_execution = mode;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurnResult {
    /// Text of the final model response.
    pub content: String,
    /// Text the model produced alongside tool calls in earlier rounds.
    pub think_text: String,
    /// Completed tool rounds.
    pub rounds: u32,
    /// The full conversation, including every tool call and result appended by the run.
    pub conversation: Vec<ProtocolMessage>,
}

/// Incremental output of a streamed run. `Done` is emitted exactly once, last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    ContentDelta(String),
    ToolResult(String),
    Error(String),
    Done,
}

pub type ChatEventStream<'a> = Pin<Box<dyn Stream<Item = ChatEvent> + Send + 'a>>;
