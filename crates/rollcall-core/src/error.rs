use thiserror::Error;

/// Application-wide error types for Rollcall.
///
/// Extraction itself never fails: a missing panel or an unreadable node
/// degrades to fewer names. These variants cover the edges around it
/// (attaching a page, delivering results, configuration).
#[derive(Error, Debug)]
pub enum AppError {
    /// A request needed a meeting document but none is attached.
    #[error("No meeting document attached")]
    NoDocument,

    /// Pushing an update to the subscriber channel failed.
    #[error("Notify error: {0}")]
    NotifyError(String),

    /// A captured page could not be turned into a tree.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Capturing the page from its source failed.
    #[error("Capture error: {0}")]
    CaptureError(String),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Operation timed out.
    #[error("Timed out after {0} seconds")]
    Timeout(u64),
}

impl AppError {
    /// Returns true if the error means the page is unreachable right now and
    /// the caller should retry on a later capture.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NoDocument | AppError::Timeout(_) => true,
            AppError::CaptureError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("not found")
            }
            _ => false,
        }
    }
}
