use std::time::Duration;

use rollcall_core::error::AppError;
use rollcall_core::{LiveDocument, compute_hash};
use tokio_util::sync::CancellationToken;

use crate::parser::parse_html;
use crate::source::CaptureSource;

/// Keeps a [`LiveDocument`] in step with a [`CaptureSource`].
///
/// Each poll captures the page, and only when its content hash differs from
/// the previous capture is it parsed and swapped in. Every swap is one
/// mutation as far as document subscribers are concerned.
pub struct Mirror<S: CaptureSource> {
    source: S,
    document: LiveDocument,
    poll_interval: Duration,
    last_hash: Option<String>,
}

impl<S: CaptureSource> Mirror<S> {
    pub fn new(source: S, document: LiveDocument) -> Self {
        Self {
            source,
            document,
            poll_interval: Duration::from_secs(1),
            last_hash: None,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn document(&self) -> &LiveDocument {
        &self.document
    }

    /// Capture once. Returns true if the document was replaced.
    pub async fn sync_once(&mut self) -> Result<bool, AppError> {
        let Some(capture) = self.source.capture().await? else {
            return Ok(false);
        };

        let hash = compute_hash(&format!("{}\n{}", capture.url, capture.html));
        if self.last_hash.as_deref() == Some(hash.as_str()) {
            tracing::trace!(hash = %&hash[..8], "Capture unchanged");
            return Ok(false);
        }

        let snapshot = parse_html(&capture.html);
        let revision = self.document.replace(capture.url, snapshot);
        tracing::debug!(hash = %&hash[..8], revision, "Mirrored new capture");
        self.last_hash = Some(hash);
        Ok(true)
    }

    /// Poll until cancelled. Capture errors are logged and retried on the
    /// next tick.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        tracing::info!(interval_ms = self.poll_interval.as_millis() as u64, "Mirror started");
        loop {
            if cancel_token.is_cancelled() {
                break;
            }

            if let Err(e) = self.sync_once().await {
                if e.is_retryable() {
                    tracing::debug!(error = %e, "Capture failed, retrying");
                } else {
                    tracing::warn!(error = %e, "Capture failed");
                }
            }

            tokio::select! {
                () = tokio::time::sleep(self.poll_interval) => {}
                () = cancel_token.cancelled() => break,
            }
        }
        tracing::info!("Mirror stopped");
    }
}
