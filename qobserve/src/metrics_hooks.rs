//! Metrics-based hooks for tool dispatch and chat runs.

use std::time::Duration;

use qchat::{ChatError, ChatRunHooks};
use qcommon::RunId;
use qprovider::ToolCall;
use qtooling::{ToolDispatchHooks, ToolError, ToolExecutionContext, ToolExecutionResult};

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObservabilityHooks;

impl ToolDispatchHooks for MetricsObservabilityHooks {
    fn on_dispatch_start(&self, tool_call: &ToolCall, _context: &ToolExecutionContext) {
        metrics::counter!(
            "quill_tool_dispatch_start_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "quill_tool_dispatch_success_total",
            "tool_name" => tool_call.name.clone()
        )
        .increment(1);
        metrics::histogram!(
            "quill_tool_dispatch_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "success"
        )
        .record(elapsed.as_secs_f64());
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        metrics::counter!(
            "quill_tool_dispatch_failure_total",
            "tool_name" => tool_call.name.clone(),
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!(
            "quill_tool_dispatch_duration_seconds",
            "tool_name" => tool_call.name.clone(),
            "status" => "failure"
        )
        .record(elapsed.as_secs_f64());
    }
}

impl ChatRunHooks for MetricsObservabilityHooks {
    fn on_model_response(&self, _run_id: &RunId, _round: u32, tool_calls: usize) {
        metrics::counter!("quill_chat_model_response_total").increment(1);
        metrics::histogram!("quill_chat_tool_calls_per_response").record(tool_calls as f64);
    }

    fn on_run_success(&self, _run_id: &RunId, rounds: u32, elapsed: Duration) {
        metrics::counter!("quill_chat_run_success_total").increment(1);
        metrics::histogram!("quill_chat_tool_rounds_per_run").record(rounds as f64);
        metrics::histogram!("quill_chat_run_duration_seconds", "status" => "success")
            .record(elapsed.as_secs_f64());
    }

    fn on_run_failure(&self, _run_id: &RunId, error: &ChatError, elapsed: Duration) {
        metrics::counter!(
            "quill_chat_run_failure_total",
            "error_kind" => format!("{:?}", error.kind)
        )
        .increment(1);
        metrics::histogram!("quill_chat_run_duration_seconds", "status" => "failure")
            .record(elapsed.as_secs_f64());
    }
}
