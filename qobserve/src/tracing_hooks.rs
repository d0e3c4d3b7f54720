//! Tracing-based hooks for tool dispatch and chat runs.
//!
//! ```rust
//! use qchat::ChatRunHooks;
//! use qobserve::TracingObservabilityHooks;
//!
//! fn accepts_chat_hooks(_hooks: &dyn ChatRunHooks) {}
//!
//! accepts_chat_hooks(&TracingObservabilityHooks);
//! ```

use std::time::Duration;

use qchat::{ChatError, ChatRunHooks};
use qcommon::RunId;
use qprovider::ToolCall;
use qtooling::{ToolDispatchHooks, ToolError, ToolExecutionContext, ToolExecutionResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObservabilityHooks;

impl ToolDispatchHooks for TracingObservabilityHooks {
    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        tracing::info!(
            phase = "tool",
            event = "dispatch_start",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            run_id = %context.run_id
        );
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        tracing::info!(
            phase = "tool",
            event = "dispatch_success",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            run_id = %context.run_id,
            output_len = result.output.len(),
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        tracing::warn!(
            phase = "tool",
            event = "dispatch_failure",
            tool_name = tool_call.name,
            tool_call_id = tool_call.id,
            run_id = %context.run_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            user_error = error.is_user_error(),
            error = %error
        );
    }
}

impl ChatRunHooks for TracingObservabilityHooks {
    fn on_round_start(&self, run_id: &RunId, round: u32) {
        tracing::debug!(phase = "chat", event = "round_start", run_id = %run_id, round);
    }

    fn on_model_response(&self, run_id: &RunId, round: u32, tool_calls: usize) {
        tracing::info!(
            phase = "chat",
            event = "model_response",
            run_id = %run_id,
            round,
            tool_calls
        );
    }

    fn on_run_success(&self, run_id: &RunId, rounds: u32, elapsed: Duration) {
        tracing::info!(
            phase = "chat",
            event = "run_success",
            run_id = %run_id,
            rounds,
            elapsed_ms = elapsed.as_millis() as u64
        );
    }

    fn on_run_failure(&self, run_id: &RunId, error: &ChatError, elapsed: Duration) {
        tracing::error!(
            phase = "chat",
            event = "run_failure",
            run_id = %run_id,
            elapsed_ms = elapsed.as_millis() as u64,
            error_kind = ?error.kind,
            user_error = error.is_user_error(),
            error = %error
        );
    }
}
