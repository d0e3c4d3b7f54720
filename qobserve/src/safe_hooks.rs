use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use qchat::{ChatError, ChatRunHooks};
use qcommon::RunId;
use qprovider::ToolCall;
use qtooling::{ToolDispatchHooks, ToolError, ToolExecutionContext, ToolExecutionResult};

/// Runs inner tool hooks, discarding any panic they raise.
pub struct SafeToolHooks<H> {
    inner: H,
}

impl<H> SafeToolHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ToolDispatchHooks for SafeToolHooks<H>
where
    H: ToolDispatchHooks,
{
    fn on_dispatch_start(&self, tool_call: &ToolCall, context: &ToolExecutionContext) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_dispatch_start(tool_call, context)
        }));
    }

    fn on_dispatch_success(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        result: &ToolExecutionResult,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_dispatch_success(tool_call, context, result, elapsed)
        }));
    }

    fn on_dispatch_failure(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
        error: &ToolError,
        elapsed: Duration,
    ) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner
                .on_dispatch_failure(tool_call, context, error, elapsed)
        }));
    }
}

/// Runs inner chat hooks, discarding any panic they raise.
pub struct SafeChatHooks<H> {
    inner: H,
}

impl<H> SafeChatHooks<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H> ChatRunHooks for SafeChatHooks<H>
where
    H: ChatRunHooks,
{
    fn on_round_start(&self, run_id: &RunId, round: u32) {
        let _ = catch_unwind(AssertUnwindSafe(|| self.inner.on_round_start(run_id, round)));
    }

    fn on_model_response(&self, run_id: &RunId, round: u32, tool_calls: usize) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_model_response(run_id, round, tool_calls)
        }));
    }

    fn on_run_success(&self, run_id: &RunId, rounds: u32, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_run_success(run_id, rounds, elapsed)
        }));
    }

    fn on_run_failure(&self, run_id: &RunId, error: &ChatError, elapsed: Duration) {
        let _ = catch_unwind(AssertUnwindSafe(|| {
            self.inner.on_run_failure(run_id, error, elapsed)
        }));
    }
}
