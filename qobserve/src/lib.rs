//! Observability hooks for tool dispatch and chat runs.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use qobserve::{MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks};
//! use qtooling::ToolDispatcher;
//!
//! let dispatcher = ToolDispatcher::default()
//!     .with_hooks(Arc::new(SafeToolHooks::new(TracingObservabilityHooks)));
//! let _chat_hooks = SafeChatHooks::new(MetricsObservabilityHooks);
//! # let _ = dispatcher;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeChatHooks, SafeToolHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
