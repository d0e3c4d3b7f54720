//! Common `qprovider` imports for downstream crates.

pub use crate::{
    BoxedEventStream, Message, ModelEventStream, ModelProvider, ModelRequest, ModelRequestBuilder,
    ModelResponse, OutputItem, ProviderError, ProviderErrorKind, ProviderFuture, ProviderId, Role,
    StopReason, StreamEvent, TokenUsage, ToolCall, ToolDefinition, VecEventStream,
};
pub use qcommon::{BoxFuture, GenerationOptions, MetadataMap};
