use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by the backend. The response body is plain text and is
/// shown to the viewer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub message: String,
}

impl ApiError {
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Message to surface to the viewer; falls back to the status line when
    /// the backend sent an empty body.
    pub fn display_message(&self) -> String {
        let trimmed = self.message.trim();
        if trimmed.is_empty() {
            format!("request failed with status {}", self.status)
        } else {
            trimmed.to_string()
        }
    }
}
