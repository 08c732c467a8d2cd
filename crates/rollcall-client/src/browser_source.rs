use std::sync::Arc;
use std::time::Duration;

use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use rollcall_core::error::AppError;
use url::Url;

use crate::source::{CaptureSource, PageCapture};

/// Captures the meeting tab of an already running Chromium over the Chrome
/// DevTools Protocol.
///
/// Start the browser with `--remote-debugging-port=9222` and pass the
/// `webSocketDebuggerUrl` reported at `http://localhost:9222/json/version`.
///
/// ```rust,no_run
/// use rollcall_client::{BrowserSource, CaptureSource};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let source = BrowserSource::connect("ws://127.0.0.1:9222/devtools/browser/abc", "meet.google.com").await?;
/// if let Some(capture) = source.capture().await? {
///     println!("{} ({} bytes)", capture.url, capture.html.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BrowserSource {
    browser: Arc<Browser>,
    meeting_host: String,
    timeout: Duration,
}

impl BrowserSource {
    /// Connect with a **10 s** capture timeout.
    pub async fn connect(ws_url: &str, meeting_host: impl Into<String>) -> Result<Self, AppError> {
        Self::connect_with_timeout(ws_url, meeting_host, Duration::from_secs(10)).await
    }

    pub async fn connect_with_timeout(
        ws_url: &str,
        meeting_host: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AppError> {
        let (mut browser, mut handler) = Browser::connect(ws_url)
            .await
            .map_err(|e| AppError::CaptureError(format!("Failed to connect to browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection to work.
        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        browser
            .fetch_targets()
            .await
            .map_err(|e| AppError::CaptureError(format!("Failed to list browser tabs: {e}")))?;
        tracing::info!(%ws_url, "Connected to browser");

        Ok(Self {
            browser: Arc::new(browser),
            meeting_host: meeting_host.into(),
            timeout,
        })
    }

    async fn find_meeting_tab(&self) -> Result<Option<(Page, String)>, AppError> {
        let pages = self
            .browser
            .pages()
            .await
            .map_err(|e| AppError::CaptureError(format!("Failed to list pages: {e}")))?;

        for page in pages {
            let Ok(Some(url)) = page.url().await else {
                continue;
            };
            let on_host = Url::parse(&url)
                .ok()
                .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(&self.meeting_host)))
                .unwrap_or(false);
            if on_host {
                return Ok(Some((page, url)));
            }
        }
        Ok(None)
    }
}

impl CaptureSource for BrowserSource {
    async fn capture(&self) -> Result<Option<PageCapture>, AppError> {
        let timeout = self.timeout;

        let result = tokio::time::timeout(timeout, async {
            let Some((page, url)) = self.find_meeting_tab().await? else {
                tracing::debug!(meeting_host = %self.meeting_host, "No meeting tab open");
                return Ok(None);
            };

            let html = page.content().await.map_err(|e| {
                AppError::CaptureError(format!("Failed to read page content: {e}"))
            })?;

            Ok::<_, AppError>(Some(PageCapture::new(url, html)))
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(AppError::Timeout(timeout.as_secs())),
        }
    }
}
