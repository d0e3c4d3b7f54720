//! Chat-layer errors and classification.

use std::error::Error;
use std::fmt::{Display, Formatter};

use qprovider::ProviderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// The caller's message history is malformed.
    Protocol,
    InvalidRequest,
    ModelInvocation,
    RoundLimit,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Protocol, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn model_invocation(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::ModelInvocation, message)
    }

    pub fn round_limit(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::RoundLimit, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::Cancelled, message)
    }

    /// Errors the caller can fix by changing the request.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self.kind,
            ChatErrorKind::Protocol | ChatErrorKind::InvalidRequest
        )
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::model_invocation(value.to_string())
    }
}
