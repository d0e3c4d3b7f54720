use std::sync::{Arc, Mutex};
use std::time::Duration;

use qchat::{ChatError, ChatRunHooks};
use qcommon::RunId;
use qprovider::ToolCall;
use qtooling::{
    ToolDispatchHooks, ToolDispatcher, ToolError, ToolExecutionContext, ToolExecutionResult,
    ToolRegistry, ToolSpec,
};
use serde_json::json;

use crate::{MetricsObservabilityHooks, SafeChatHooks, SafeToolHooks, TracingObservabilityHooks};

fn sample_tool_call() -> ToolCall {
    ToolCall::new("call-1", "get_chapter", json!({ "number": 1 }))
}

fn sample_tool_context() -> ToolExecutionContext {
    ToolExecutionContext::new("run-1").with_metadata("round", "0")
}

fn exercise_tool_hooks(hooks: &dyn ToolDispatchHooks) {
    let call = sample_tool_call();
    let context = sample_tool_context();

    hooks.on_dispatch_start(&call, &context);
    hooks.on_dispatch_success(
        &call,
        &context,
        &ToolExecutionResult::success(&call, "{}"),
        Duration::from_millis(20),
    );
    hooks.on_dispatch_failure(
        &call,
        &context,
        &ToolError::execution("no chapter with number 1"),
        Duration::from_millis(20),
    );
}

fn exercise_chat_hooks(hooks: &dyn ChatRunHooks) {
    let run = RunId::from("run-1");

    hooks.on_round_start(&run, 0);
    hooks.on_model_response(&run, 0, 2);
    hooks.on_run_success(&run, 1, Duration::from_millis(40));
    hooks.on_run_failure(
        &run,
        &ChatError::round_limit("model still requested tools after 3 tool rounds"),
        Duration::from_millis(40),
    );
}

#[test]
fn tracing_hooks_smoke_test_all_callbacks() {
    exercise_tool_hooks(&TracingObservabilityHooks);
    exercise_chat_hooks(&TracingObservabilityHooks);
}

#[test]
fn metrics_hooks_smoke_test_all_callbacks() {
    exercise_tool_hooks(&MetricsObservabilityHooks);
    exercise_chat_hooks(&MetricsObservabilityHooks);
}

#[derive(Default, Clone)]
struct RecordingHooks {
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingHooks {
    fn push(&self, event: &'static str) {
        self.events.lock().expect("events lock").push(event);
    }
}

impl ToolDispatchHooks for RecordingHooks {
    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        self.push("start");
    }

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        self.push("success");
    }

    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        self.push("failure");
    }
}

impl ChatRunHooks for RecordingHooks {
    fn on_round_start(&self, _run_id: &RunId, _round: u32) {
        self.push("round_start");
    }

    fn on_model_response(&self, _run_id: &RunId, _round: u32, _tool_calls: usize) {
        self.push("model_response");
    }

    fn on_run_success(&self, _run_id: &RunId, _rounds: u32, _elapsed: Duration) {
        self.push("run_success");
    }

    fn on_run_failure(&self, _run_id: &RunId, _error: &ChatError, _elapsed: Duration) {
        self.push("run_failure");
    }
}

struct PanicHooks;

impl ToolDispatchHooks for PanicHooks {
    fn on_dispatch_start(&self, _tool_call: &ToolCall, _context: &ToolExecutionContext) {
        panic!("start panic");
    }

    fn on_dispatch_success(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _result: &ToolExecutionResult,
        _elapsed: Duration,
    ) {
        panic!("success panic");
    }

    fn on_dispatch_failure(
        &self,
        _tool_call: &ToolCall,
        _context: &ToolExecutionContext,
        _error: &ToolError,
        _elapsed: Duration,
    ) {
        panic!("failure panic");
    }
}

impl ChatRunHooks for PanicHooks {
    fn on_round_start(&self, _run_id: &RunId, _round: u32) {
        panic!("round panic");
    }

    fn on_model_response(&self, _run_id: &RunId, _round: u32, _tool_calls: usize) {
        panic!("response panic");
    }

    fn on_run_success(&self, _run_id: &RunId, _rounds: u32, _elapsed: Duration) {
        panic!("success panic");
    }

    fn on_run_failure(&self, _run_id: &RunId, _error: &ChatError, _elapsed: Duration) {
        panic!("failure panic");
    }
}

#[test]
fn safe_hooks_delegate_when_inner_succeeds() {
    let inner = RecordingHooks::default();
    let events = Arc::clone(&inner.events);

    exercise_tool_hooks(&SafeToolHooks::new(inner.clone()));
    exercise_chat_hooks(&SafeChatHooks::new(inner));

    assert_eq!(
        *events.lock().expect("events lock"),
        vec![
            "start",
            "success",
            "failure",
            "round_start",
            "model_response",
            "run_success",
            "run_failure",
        ]
    );
}

#[test]
fn safe_hooks_swallow_panics() {
    exercise_tool_hooks(&SafeToolHooks::new(PanicHooks));
    exercise_chat_hooks(&SafeChatHooks::new(PanicHooks));
}

#[tokio::test]
async fn panicking_hooks_do_not_disturb_dispatch() {
    let mut registry = ToolRegistry::new();
    registry.register(
        ToolSpec::new(
            "get_chapter",
            "Fetch a chapter",
            json!({ "type": "object" }),
            |_, _| async { Ok("{\"title\":\"Arrival\"}".to_string()) },
        )
        .expect("schema compiles"),
    );
    let dispatcher = ToolDispatcher::new(Arc::new(registry))
        .with_hooks(Arc::new(SafeToolHooks::new(PanicHooks)));

    let result = dispatcher
        .dispatch(sample_tool_call(), sample_tool_context())
        .await;

    assert!(!result.is_error);
    assert_eq!(result.output, "{\"title\":\"Arrival\"}");
}
