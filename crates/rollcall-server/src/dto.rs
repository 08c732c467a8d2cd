use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// A captured page pushed by the capturing side.
#[derive(Debug, Deserialize)]
pub struct DocumentUpload {
    pub url: String,
    pub html: String,
}

#[derive(Debug, Serialize)]
pub struct DocumentAccepted {
    pub revision: u64,
    pub elements: usize,
    pub meeting_page: bool,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub document: &'static str,
    pub monitor: &'static str,
    pub revision: u64,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
