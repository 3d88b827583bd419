//! Error types shared by the content and preview layers

use thiserror::Error;

/// Errors raised while talking to the content source or mapping its documents
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Unknown content ref: {0}")]
    InvalidRef(String),

    #[error("Cursor does not belong to this content source: {0}")]
    InvalidCursor(String),

    #[error("Content source answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Malformed document {id}: {reason}")]
    Malformed { id: String, reason: String },
}

impl ContentError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        ContentError::Malformed {
            id: id.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether the error means the document does not exist (as opposed to a failed fetch)
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound(_))
    }
}

impl From<serde_json::Error> for ContentError {
    fn from(err: serde_json::Error) -> Self {
        ContentError::Decode(err.to_string())
    }
}

/// Errors raised by the preview token exchange
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreviewError {
    #[error("Invalid token")]
    InvalidToken,

    #[error("Cannot sign preview cookie: {0}")]
    Signing(String),
}
