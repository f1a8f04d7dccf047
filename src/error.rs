//! Typed errors for the library layers.
//!
//! The HTTP boundary flattens all of these into `{"error": "<message>"}`;
//! only [`IngestError::is_client_error`] decides between 400 and 500.

use thiserror::Error;

/// Errors raised while extracting text from an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("text file is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Errors raised by the upload-and-index pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file format. Upload a .pdf or .txt file.")]
    UnsupportedFormat { filename: String },

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("failed to store document: {0}")]
    Storage(#[from] std::io::Error),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("embedding failed: {0}")]
    Embedding(anyhow::Error),

    #[error("embedding provider returned {got} vectors for {expected} chunks")]
    EmbeddingCount { expected: usize, got: usize },

    #[error("vector index error: {0}")]
    Index(anyhow::Error),
}

impl IngestError {
    /// True for failures caused by the request itself rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            IngestError::UnsupportedFormat { .. } | IngestError::InvalidFilename(_)
        )
    }
}

/// Errors raised by sign-up and log-in.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Please enter a username and password.")]
    MissingCredentials,
    #[error("Username already exists!")]
    UsernameTaken,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("user store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Errors raised by chat-session snapshots.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no saved chat named {0:?}")]
    UnknownSession(String),
}

/// Errors raised by the HTTP client talking to the backend.
///
/// Any non-200 response collapses into [`ClientError::Status`]; the server's
/// message is kept only for diagnostics.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("backend returned {status}")]
    Status { status: u16, detail: String },
    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_format_is_client_error() {
        let err = IngestError::UnsupportedFormat {
            filename: "a.docx".to_string(),
        };
        assert!(err.is_client_error());
        assert!(err.to_string().contains(".pdf or .txt"));
    }

    #[test]
    fn test_index_error_is_server_error() {
        let err = IngestError::Index(anyhow::anyhow!("disk full"));
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("disk full"));
    }
}
