use std::future::Future;

use rollcall_core::error::AppError;

/// A page as captured from its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCapture {
    pub url: String,
    pub html: String,
}

impl PageCapture {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }
}

/// Somewhere a meeting page can be captured from.
pub trait CaptureSource: Send + Sync {
    /// Capture the page as it is right now.
    ///
    /// Returns `Ok(None)` when the source is reachable but has no meeting
    /// page to offer yet.
    fn capture(&self) -> impl Future<Output = Result<Option<PageCapture>, AppError>> + Send;
}
