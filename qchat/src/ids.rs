//! Run-scoped tool call id assignment.

use std::collections::HashSet;

use qprovider::ToolCall;
use uuid::Uuid;

use crate::ProtocolMessage;

/// Hands out ids for model tool calls that arrive without one, or with one
/// already used earlier in the run.
#[derive(Debug, Default)]
pub(crate) struct ToolCallIds {
    counter: u64,
    seen: HashSet<String>,
}

impl ToolCallIds {
    pub(crate) fn from_conversation(conversation: &[ProtocolMessage]) -> Self {
        let seen = conversation
            .iter()
            .filter_map(|message| message.tool_call.as_ref())
            .map(|call| call.id.clone())
            .collect();

        Self { counter: 0, seen }
    }

    pub(crate) fn assign(&mut self, call: ToolCall) -> ToolCall {
        if call.has_id() && !self.seen.contains(&call.id) {
            self.seen.insert(call.id.clone());
            return call;
        }

        loop {
            self.counter += 1;
            let suffix = Uuid::new_v4().simple().to_string();
            let id = format!("toolcall_{}_{}", self.counter, &suffix[..8]);
            if self.seen.insert(id.clone()) {
                return call.with_id(id);
            }
        }
    }
}
