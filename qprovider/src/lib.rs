//! Model capability contracts: the model-native message model, single-shot and
//! streaming invocation, and the OpenAI-compatible HTTP adapter.
//!
//! ```rust
//! use qprovider::{Message, ModelRequest, Role, ToolCall};
//! use serde_json::json;
//!
//! let call = ToolCall::new("call_1", "get_chapter", json!({ "number": 3 }));
//! let request = ModelRequest::new(
//!     "deepseek-chat",
//!     vec![
//!         Message::new(Role::User, "What happens in chapter 3?"),
//!         Message::assistant_tool_call(call),
//!         Message::tool_result("call_1", "{\"title\":\"The Crossing\"}"),
//!     ],
//! );
//!
//! assert!(request.validate().is_ok());
//! ```

pub mod adapters;
mod credentials;
mod error;
mod model;
pub mod prelude;
mod provider;
mod stream;

pub use credentials::SecretString;
pub use error::{ProviderError, ProviderErrorKind};
pub use model::{
    Message, ModelRequest, ModelRequestBuilder, ModelResponse, OutputItem, ProviderId, Role,
    StopReason, TokenUsage, ToolCall, ToolDefinition,
};
pub use provider::{ModelProvider, ProviderFuture};
pub use qcommon::{BoxFuture, GenerationOptions, MetadataMap};
pub use stream::{BoxedEventStream, ModelEventStream, StreamEvent, VecEventStream};
