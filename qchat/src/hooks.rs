//! Lifecycle hooks for orchestration runs.
//!
//! ```rust
//! use qchat::{ChatRunHooks, NoopChatRunHooks};
//!
//! fn assert_hooks_trait(_hooks: &dyn ChatRunHooks) {}
//!
//! assert_hooks_trait(&NoopChatRunHooks);
//! ```

use std::time::Duration;

use qcommon::RunId;

use crate::ChatError;

pub trait ChatRunHooks: Send + Sync {
    fn on_round_start(&self, _run_id: &RunId, _round: u32) {}

    fn on_model_response(&self, _run_id: &RunId, _round: u32, _tool_calls: usize) {}

    fn on_run_success(&self, _run_id: &RunId, _rounds: u32, _elapsed: Duration) {}

    fn on_run_failure(&self, _run_id: &RunId, _error: &ChatError, _elapsed: Duration) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopChatRunHooks;

impl ChatRunHooks for NoopChatRunHooks {}
