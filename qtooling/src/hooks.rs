//! Lifecycle hooks for tool dispatch.
//!
//! ```rust
//! use qtooling::{NoopToolDispatchHooks, ToolDispatchHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ToolDispatchHooks) {}
//!
//! let hooks = NoopToolDispatchHooks;
//! assert_hooks_trait(&hooks);
//! ```

use std::time::Duration;

use qprovider::ToolCall;

use crate::{ToolError, ToolExecutionContext, ToolExecutionResult};

pub trait ToolDispatchHooks: Send + Sync {
    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {}

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
    }

    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopToolDispatchHooks;

impl ToolDispatchHooks for NoopToolDispatchHooks {}
