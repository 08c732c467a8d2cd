use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rollcall_core::error::AppError;

use crate::source::{CaptureSource, PageCapture};

/// Reads a saved page from disk on every capture.
///
/// The page URL cannot be recovered from the file, so it is supplied by the
/// caller. A missing file is not an error: the page simply isn't there yet.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    url: String,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl CaptureSource for FileSource {
    async fn capture(&self) -> Result<Option<PageCapture>, AppError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(html) => Ok(Some(PageCapture::new(self.url.clone(), html))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "Capture file not found yet");
                Ok(None)
            }
            Err(e) => Err(AppError::CaptureError(format!(
                "Failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }
}
