//! Crate-wide error taxonomy
//!
//! Closed set of failure kinds surfaced to the presentation layer. The
//! orchestrator is the only place these become outbound `error` notifications.

use std::time::Duration;
use thiserror::Error;

use crate::client::BackendError;
use crate::document::DocumentError;

/// Errors that can surface from a chat operation
#[derive(Debug, Error)]
pub enum ChatError {
    /// Local validation failure; no backend call was made
    #[error("{0}")]
    Validation(String),

    /// Connection could not be established (DNS, refused, offline)
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete within the configured timeout
    #[error("Request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// The backend received the request and rejected it
    #[error("Backend error {status}: {body}")]
    Api { status: u16, body: String },

    /// Writing the document to disk failed
    #[error("File system error: {0}")]
    FileSystem(String),

    /// Catch-all for unexpected failures
    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ChatError {
    /// Whether the user can safely re-issue the failed operation
    ///
    /// Timeouts and connection failures are transient; everything else
    /// reflects a rejected or locally invalid request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChatError::Network(_) | ChatError::Timeout(_))
    }
}

impl From<BackendError> for ChatError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout(d) => ChatError::Timeout(d),
            BackendError::Network(msg) => ChatError::Network(msg),
            BackendError::Api { status, body } => ChatError::Api { status, body },
        }
    }
}

impl From<DocumentError> for ChatError {
    fn from(err: DocumentError) -> Self {
        ChatError::FileSystem(err.to_string())
    }
}
