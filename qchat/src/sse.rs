//! Server-sent event framing for chat event streams.
//!
//! ```rust
//! use qchat::{ChatEvent, sse};
//!
//! assert_eq!(
//!     sse::encode_event(&ChatEvent::ContentDelta("Hi".into())),
//!     "data: {\"content\":\"Hi\"}\n\n"
//! );
//! assert_eq!(sse::encode_event(&ChatEvent::Done), "data: [DONE]\n\n");
//! ```

use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use serde_json::json;

use crate::{ChatEvent, ChatEventStream};

pub const DONE_FRAME: &str = "data: [DONE]\n\n";

pub fn encode_event(event: &ChatEvent) -> String {
    let payload = match event {
        ChatEvent::ContentDelta(content) => json!({ "content": content }),
        ChatEvent::ToolResult(output) => json!({ "toolCallResult": output }),
        ChatEvent::Error(message) => json!({ "error": message }),
        ChatEvent::Done => return DONE_FRAME.to_string(),
    };

    format!("data: {payload}\n\n")
}

/// Maps each chat event to one SSE frame, preserving order.
pub fn sse_body<'a>(events: ChatEventStream<'a>) -> impl Stream<Item = Bytes> + Send + 'a {
    events.map(|event| Bytes::from(encode_event(&event)))
}
