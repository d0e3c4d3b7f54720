//! HTTP response shapes for serving chat runs.
//!
//! These helpers build [`http::Response`] values and leave the choice of server
//! to the caller: streamed runs become `text/event-stream` bodies of SSE frames,
//! single-shot runs become JSON.
//!
//! ```rust
//! use http::StatusCode;
//! use quill::http::json_response;
//! use quill::ChatError;
//!
//! let response = json_response(Err(ChatError::invalid_request("no messages")));
//! assert_eq!(response.status(), StatusCode::BAD_REQUEST);
//! assert_eq!(response.body(), "{\"error\":\"InvalidRequest: no messages\"}");
//! ```

use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use http::header::{CACHE_CONTROL, CONNECTION, CONTENT_TYPE, HeaderValue};
use http::{Response, StatusCode};
use qchat::{ChatError, ChatEventStream, ChatTurnResult, sse};
use serde::Serialize;
use serde_json::json;

pub type SseBody = Pin<Box<dyn Stream<Item = Bytes> + Send + 'static>>;

/// JSON body of a successful single-shot run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnReply {
    pub content: String,
    pub think_text: String,
}

impl From<ChatTurnResult> for TurnReply {
    fn from(value: ChatTurnResult) -> Self {
        Self {
            content: value.content,
            think_text: value.think_text,
        }
    }
}

/// Wraps a chat event stream as a server-sent event response.
pub fn sse_response(events: ChatEventStream<'static>) -> Response<SseBody> {
    let body: SseBody = Box::pin(sse::sse_body(events));
    let mut response = Response::new(body);

    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

    response
}

/// `200 {content, thinkText}` on success; `{error}` with 400 for caller
/// mistakes and 500 for everything else.
pub fn json_response(result: Result<ChatTurnResult, ChatError>) -> Response<String> {
    match result {
        Ok(turn) => {
            let body = serde_json::to_string(&TurnReply::from(turn))
                .unwrap_or_else(|err| json!({ "error": err.to_string() }).to_string());
            with_json_headers(Response::new(body))
        }
        Err(error) => error_response(status_for(&error), &error.to_string()),
    }
}

pub fn error_response(status: StatusCode, message: &str) -> Response<String> {
    let mut response = with_json_headers(Response::new(json!({ "error": message }).to_string()));
    *response.status_mut() = status;
    response
}

pub fn status_for(error: &ChatError) -> StatusCode {
    if error.is_user_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn with_json_headers(mut response: Response<String>) -> Response<String> {
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
