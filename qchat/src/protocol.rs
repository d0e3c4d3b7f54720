//! Application message protocol and its conversion to model-native messages.
//!
//! ```rust
//! use qchat::{ProtocolMessage, to_native};
//! use qprovider::{Role, ToolCall};
//! use serde_json::json;
//!
//! let history = vec![
//!     ProtocolMessage::user("Add a chapter about the storm"),
//!     ProtocolMessage::assistant_tool_call(ToolCall::new(
//!         "call_1",
//!         "create_chapter",
//!         json!({ "items": [{ "title": "Storm", "prompt": "the storm hits" }] }),
//!     )),
//!     ProtocolMessage::tool("call_1", "created chapter id 4 (number 4)"),
//! ];
//!
//! let native = to_native(&history).expect("history is well formed");
//! assert_eq!(native[1].role, Role::Assistant);
//! assert!(native[1].content.is_empty());
//! assert_eq!(native[2].tool_call_id.as_deref(), Some("call_1"));
//! ```

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use qprovider::{Message, Role, ToolCall};
use serde::{Deserialize, Serialize};

use crate::ChatError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProtocolRole {
    System,
    User,
    Assistant,
    Tool,
    /// A role this crate does not understand. Rejected by [`to_native`].
    Other(String),
}

impl ProtocolRole {
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
            Self::Other(role) => role,
        }
    }
}

impl Display for ProtocolRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ProtocolRole {
    fn from(value: String) -> Self {
        match value.as_str() {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            "tool" => Self::Tool,
            _ => Self::Other(value),
        }
    }
}

impl From<ProtocolRole> for String {
    fn from(value: ProtocolRole) -> Self {
        value.as_str().to_string()
    }
}

impl From<Role> for ProtocolRole {
    fn from(value: Role) -> Self {
        match value {
            Role::System => Self::System,
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
            Role::Tool => Self::Tool,
        }
    }
}

/// One entry of the caller-facing conversation.
///
/// An assistant entry carrying `tool_call` has empty content, and every tool
/// entry answers a tool call made earlier in the same conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProtocolMessage {
    pub role: ProtocolRole,
    #[serde(default, alias = "text")]
    pub content: String,
    #[serde(default, alias = "toolCall", skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,
    #[serde(default, alias = "toolCallId", skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ProtocolMessage {
    pub fn new(role: ProtocolRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ProtocolRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ProtocolRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ProtocolRole::Assistant, content)
    }

    pub fn assistant_tool_call(call: ToolCall) -> Self {
        Self {
            role: ProtocolRole::Assistant,
            content: String::new(),
            tool_call: Some(call),
            tool_call_id: None,
        }
    }

    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ProtocolRole::Tool,
            content: content.into(),
            tool_call: None,
            tool_call_id: Some(tool_call_id.into()),
        }
    }
}

/// Converts a protocol conversation into model-native messages, in order.
///
/// Fails on an unknown role, an assistant tool call without an id, or a tool
/// entry that does not answer an earlier tool call.
pub fn to_native(messages: &[ProtocolMessage]) -> Result<Vec<Message>, ChatError> {
    let mut issued = HashSet::new();
    let mut native = Vec::with_capacity(messages.len());

    for (index, message) in messages.iter().enumerate() {
        let converted = match &message.role {
            ProtocolRole::System => Message::new(Role::System, message.content.clone()),
            ProtocolRole::User => Message::new(Role::User, message.content.clone()),
            ProtocolRole::Assistant => match &message.tool_call {
                Some(call) => {
                    if !call.has_id() {
                        return Err(ChatError::protocol(format!(
                            "assistant tool call at index {index} has no id"
                        )));
                    }
                    issued.insert(call.id.as_str());
                    Message::assistant_tool_call(call.clone())
                }
                None => Message::new(Role::Assistant, message.content.clone()),
            },
            ProtocolRole::Tool => {
                let Some(tool_call_id) = message.tool_call_id.as_deref() else {
                    return Err(ChatError::protocol(format!(
                        "tool message at index {index} has no tool_call_id"
                    )));
                };
                if !issued.contains(tool_call_id) {
                    return Err(ChatError::protocol(format!(
                        "tool message at index {index} answers unknown tool call id: {tool_call_id}"
                    )));
                }
                Message::tool_result(tool_call_id, message.content.clone())
            }
            ProtocolRole::Other(role) => {
                return Err(ChatError::protocol(format!("unknown role: {role}")));
            }
        };

        native.push(converted);
    }

    Ok(native)
}
