//! Serializable error shape returned to tool callers.

use std::fmt;

use serde::Serialize;

use crate::error::{Error, ErrorKind};

/// An [`Error`] reduced to a kind and a message.
///
/// ```json
/// { "kind": "not_found", "message": "Browser tab not found: Result (after 4 steps)" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolError {
    /// Coarse classification.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
}

impl ToolError {
    /// Renders as a JSON object.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::json!({ "kind": self.kind, "message": self.message }).to_string()
    }
}

impl From<&Error> for ToolError {
    fn from(error: &Error) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

impl From<Error> for ToolError {
    fn from(error: Error) -> Self {
        Self::from(&error)
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error: {}", self.message)
    }
}

impl std::error::Error for ToolError {}
