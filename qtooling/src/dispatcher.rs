//! Registry-backed dispatcher that turns every tool call into a result value.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_timer::Delay;
use futures_util::future::{Either, select};
use qprovider::{ToolCall, ToolDefinition};

use crate::{
    NoopToolDispatchHooks, ToolDispatchHooks, ToolError, ToolExecutionContext,
    ToolExecutionResult, ToolFuture, ToolRegistry,
};

/// Looks up, validates, and invokes tools.
///
/// [`dispatch`](Self::dispatch) never fails: lookup misses, schema violations,
/// handler errors, and timeouts are all folded into a result with `is_error`
/// set, so the conversation can carry them back to the model. The dispatcher
/// holds no lock of its own and can serve sibling calls concurrently.
#[derive(Clone)]
pub struct ToolDispatcher {
    registry: Arc<ToolRegistry>,
    hooks: Arc<dyn ToolDispatchHooks>,
    timeout: Option<Duration>,
}

impl Default for ToolDispatcher {
    fn default() -> Self {
        Self::new(Arc::new(ToolRegistry::new()))
    }
}

impl ToolDispatcher {
    pub fn new(registry: Arc<ToolRegistry>) -> Self {
        Self {
            registry,
            hooks: Arc::new(NoopToolDispatchHooks),
            timeout: None,
        }
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn ToolDispatchHooks>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn registry(&self) -> Arc<ToolRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub fn dispatch<'a>(
        &'a self,
        tool_call: ToolCall,
        context: ToolExecutionContext,
    ) -> ToolFuture<'a, ToolExecutionResult> {
        Box::pin(async move {
            let started_at = Instant::now();
            self.hooks.on_dispatch_start(&tool_call, &context);

            match self.execute(&tool_call, &context).await {
                Ok(output) => {
                    let result = ToolExecutionResult::success(&tool_call, output);
                    self.hooks.on_dispatch_success(
                        &tool_call,
                        &context,
                        &result,
                        started_at.elapsed(),
                    );
                    result
                }
                Err(error) => {
                    let error = error
                        .with_tool_name(tool_call.name.clone())
                        .with_tool_call_id(tool_call.id.clone());
                    self.hooks
                        .on_dispatch_failure(&tool_call, &context, &error, started_at.elapsed());
                    ToolExecutionResult::failure(&tool_call, error.message)
                }
            }
        })
    }

    async fn execute(
        &self,
        tool_call: &ToolCall,
        context: &ToolExecutionContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .registry
            .get(&tool_call.name)
            .ok_or_else(|| ToolError::not_found(format!("tool not found: {}", tool_call.name)))?;

        tool.validate(&tool_call.arguments)?;

        let invocation = tool.invoke(&tool_call.arguments, context);
        let Some(timeout) = self.timeout else {
            return invocation.await;
        };

        match select(invocation, Box::pin(Delay::new(timeout))).await {
            Either::Left((result, _)) => result,
            Either::Right(((), _)) => Err(ToolError::timeout(format!(
                "tool {} timed out after {}ms",
                tool_call.name,
                timeout.as_millis()
            ))),
        }
    }
}
