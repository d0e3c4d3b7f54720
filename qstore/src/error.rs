//! Store errors for chapter and outline persistence.

use std::error::Error;
use std::fmt::{Display, Formatter};

use qtooling::ToolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    Storage,
    NotFound,
    InvalidRequest,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Storage, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::NotFound, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::InvalidRequest, message)
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for StoreError {}

impl From<StoreError> for ToolError {
    fn from(value: StoreError) -> Self {
        match value.kind {
            StoreErrorKind::InvalidRequest => ToolError::invalid_arguments(value.message),
            StoreErrorKind::NotFound | StoreErrorKind::Storage => {
                ToolError::execution(value.message)
            }
        }
    }
}
