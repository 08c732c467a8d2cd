use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::MonitorConfig;
use crate::error::AppError;
use crate::session::run_extraction;
use crate::traits::{DocumentHost, MutationFeed, Notifier};

/// Lifecycle of a [`ChangeMonitor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Idle,
    Observing,
}

impl MonitorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MonitorState::Idle => "idle",
            MonitorState::Observing => "observing",
        }
    }
}

impl fmt::Display for MonitorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Events emitted by the monitor for monitoring/logging.
#[derive(Debug, Clone)]
pub enum MonitorEvent<'a> {
    Started {
        monitor_id: Uuid,
    },
    Stopped {
        monitor_id: Uuid,
    },
    /// A session was scheduled. `revision` is `None` for the initial trigger.
    Triggered {
        monitor_id: Uuid,
        revision: Option<u64>,
    },
    /// A mutation arrived while a session was already pending.
    Coalesced {
        monitor_id: Uuid,
        revision: Option<u64>,
    },
    SessionCompleted {
        monitor_id: Uuid,
        participants: &'a [String],
    },
    NotifyFailed {
        monitor_id: Uuid,
        error: &'a str,
    },
}

/// Trait for receiving monitor events (decoupled logging).
pub trait MonitorReporter: Send + Sync + 'static {
    fn report(&self, event: MonitorEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMonitorReporter;

impl MonitorReporter for TracingMonitorReporter {
    fn report(&self, event: MonitorEvent<'_>) {
        match event {
            MonitorEvent::Started { monitor_id } => {
                tracing::info!(%monitor_id, "Monitoring started");
            }
            MonitorEvent::Stopped { monitor_id } => {
                tracing::info!(%monitor_id, "Monitoring stopped");
            }
            MonitorEvent::Triggered {
                monitor_id,
                revision,
            } => {
                tracing::debug!(%monitor_id, ?revision, "Extraction scheduled");
            }
            MonitorEvent::Coalesced {
                monitor_id,
                revision,
            } => {
                tracing::trace!(%monitor_id, ?revision, "Mutation coalesced into pending extraction");
            }
            MonitorEvent::SessionCompleted {
                monitor_id,
                participants,
            } => {
                tracing::info!(%monitor_id, count = participants.len(), "Participants updated");
            }
            MonitorEvent::NotifyFailed { monitor_id, error } => {
                tracing::warn!(%monitor_id, %error, "Failed to push participant update");
            }
        }
    }
}

struct Inner<H, N, R> {
    id: Uuid,
    host: H,
    notifier: N,
    reporter: R,
    config: MonitorConfig,
    /// `Some` while observing; cancelling the token ends the subscription.
    listener: Mutex<Option<CancellationToken>>,
    in_flight: AtomicBool,
}

/// Watches a [`DocumentHost`] and re-extracts participants after each burst
/// of mutations, pushing every result to a [`Notifier`].
///
/// At most one session is pending or running at a time; mutations that
/// arrive meanwhile are dropped. Cloning yields another handle to the same
/// monitor. Must be used from within a tokio runtime.
pub struct ChangeMonitor<H, N, R = TracingMonitorReporter> {
    inner: Arc<Inner<H, N, R>>,
}

impl<H, N, R> Clone for ChangeMonitor<H, N, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H, N> ChangeMonitor<H, N, TracingMonitorReporter>
where
    H: DocumentHost,
    N: Notifier,
{
    pub fn new(host: H, notifier: N, config: MonitorConfig) -> Self {
        Self::with_reporter(host, notifier, config, TracingMonitorReporter)
    }
}

impl<H, N, R> ChangeMonitor<H, N, R>
where
    H: DocumentHost,
    N: Notifier,
    R: MonitorReporter,
{
    pub fn with_reporter(host: H, notifier: N, config: MonitorConfig, reporter: R) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: Uuid::new_v4(),
                host,
                notifier,
                reporter,
                config,
                listener: Mutex::new(None),
                in_flight: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    pub fn state(&self) -> MonitorState {
        if self.inner.listener().is_some() {
            MonitorState::Observing
        } else {
            MonitorState::Idle
        }
    }

    /// Whether a session is pending or running.
    pub fn is_extracting(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire)
    }

    /// Subscribe to mutations and schedule an initial extraction.
    ///
    /// Starting while already observing replaces the old subscription.
    pub fn start(&self) -> Result<(), AppError> {
        let token = CancellationToken::new();
        {
            let mut listener = self.inner.listener();
            if let Some(old) = listener.take() {
                old.cancel();
                tracing::debug!(monitor_id = %self.inner.id, "Replacing existing subscription");
            }
            let feed = self.inner.host.subscribe()?;
            *listener = Some(token.clone());
            tokio::spawn(listen(Arc::clone(&self.inner), feed, token));
        }

        self.inner.reporter.report(MonitorEvent::Started {
            monitor_id: self.inner.id,
        });
        schedule(&self.inner, None);
        Ok(())
    }

    /// Cancel the subscription. A session that is already scheduled still
    /// runs and delivers its result.
    pub fn stop(&self) {
        let Some(token) = self.inner.listener().take() else {
            return;
        };
        token.cancel();
        self.inner.reporter.report(MonitorEvent::Stopped {
            monitor_id: self.inner.id,
        });
    }

    /// Schedule a session as if a mutation had arrived.
    pub fn trigger(&self) {
        schedule(&self.inner, None);
    }

    /// Wait for the page to load and start if it is the meeting page.
    ///
    /// Returns whether monitoring was started.
    pub async fn auto_start(&self) -> Result<bool, AppError> {
        self.inner.host.loaded().await;
        if !self.inner.host.is_meeting_page() {
            tracing::info!(
                monitor_id = %self.inner.id,
                meeting_host = %self.inner.config.meeting_host,
                "Attached page is not a meeting page, not monitoring"
            );
            return Ok(false);
        }
        tokio::time::sleep(self.inner.config.settle_delay).await;
        self.start()?;
        Ok(true)
    }
}

impl<H, N, R> Inner<H, N, R>
where
    H: DocumentHost,
    N: Notifier,
    R: MonitorReporter,
{
    fn listener(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_session(&self) {
        let participants = match self.host.document() {
            Some(tree) => run_extraction(&tree),
            None => {
                tracing::warn!(monitor_id = %self.id, "No document attached, skipping extraction");
                return;
            }
        };

        self.reporter.report(MonitorEvent::SessionCompleted {
            monitor_id: self.id,
            participants: &participants,
        });

        if let Err(e) = self.notifier.notify(&participants).await {
            let error = e.to_string();
            self.reporter.report(MonitorEvent::NotifyFailed {
                monitor_id: self.id,
                error: &error,
            });
        }
    }
}

async fn listen<H, N, R>(inner: Arc<Inner<H, N, R>>, mut feed: MutationFeed, token: CancellationToken)
where
    H: DocumentHost,
    N: Notifier,
    R: MonitorReporter,
{
    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            next = feed.next() => match next {
                Some(revision) if !token.is_cancelled() => schedule(&inner, Some(revision)),
                Some(_) => break,
                None => {
                    tracing::debug!(monitor_id = %inner.id, "Mutation feed closed");
                    break;
                }
            },
        }
    }
}

fn schedule<H, N, R>(inner: &Arc<Inner<H, N, R>>, revision: Option<u64>)
where
    H: DocumentHost,
    N: Notifier,
    R: MonitorReporter,
{
    if inner.in_flight.swap(true, Ordering::AcqRel) {
        inner.reporter.report(MonitorEvent::Coalesced {
            monitor_id: inner.id,
            revision,
        });
        return;
    }

    inner.reporter.report(MonitorEvent::Triggered {
        monitor_id: inner.id,
        revision,
    });

    let inner = Arc::clone(inner);
    tokio::spawn(async move {
        tokio::time::sleep(inner.config.debounce).await;
        inner.run_session().await;
        inner.in_flight.store(false, Ordering::Release);
    });
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::live::LiveDocument;
    use crate::testutil::{Recorded, RecordingNotifier, RecordingReporter, meeting_page};

    const MEET_URL: &str = "https://meet.google.com/abc-defg-hij";

    fn attached() -> LiveDocument {
        let live = LiveDocument::new("meet.google.com");
        live.replace(MEET_URL, meeting_page(&["Alice Johnson", "Bob Smith (You)"]));
        live
    }

    fn monitor(
        live: &LiveDocument,
        notifier: &RecordingNotifier,
        reporter: &RecordingReporter,
    ) -> ChangeMonitor<LiveDocument, RecordingNotifier, RecordingReporter> {
        ChangeMonitor::with_reporter(
            live.clone(),
            notifier.clone(),
            MonitorConfig::default(),
            reporter.clone(),
        )
    }

    async fn settle(ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn burst_of_mutations_yields_one_session() {
        let live = attached();
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        assert_eq!(monitor.state(), MonitorState::Observing);
        assert!(monitor.is_extracting());

        for _ in 0..5 {
            live.replace(MEET_URL, meeting_page(&["Alice Johnson", "Carol Davis"]));
        }
        settle(1500).await;

        assert_eq!(reporter.sessions(), 1);
        assert_eq!(reporter.count(&Recorded::Coalesced), 5);
        assert_eq!(notifier.count(), 1);
        assert_eq!(
            notifier.last().unwrap(),
            vec!["Alice Johnson".to_string(), "Carol Davis".to_string()]
        );
        assert!(!monitor.is_extracting());
    }

    #[tokio::test(start_paused = true)]
    async fn mutation_after_session_schedules_another() {
        let live = attached();
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        settle(1500).await;
        live.replace(MEET_URL, meeting_page(&["Dana Lee"]));
        settle(1500).await;

        assert_eq!(notifier.count(), 2);
        assert_eq!(notifier.last().unwrap(), vec!["Dana Lee".to_string()]);
        assert_eq!(reporter.count(&Recorded::Triggered), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_then_mutate_triggers_nothing() {
        let live = attached();
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        settle(1500).await;
        assert_eq!(notifier.count(), 1);

        monitor.stop();
        assert_eq!(monitor.state(), MonitorState::Idle);
        for _ in 0..3 {
            live.replace(MEET_URL, meeting_page(&["Erin Walsh"]));
        }
        settle(3000).await;

        assert_eq!(notifier.count(), 1);
        assert_eq!(reporter.sessions(), 1);
        assert_eq!(live.receiver_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn pending_session_still_delivers_after_stop() {
        let live = attached();
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        monitor.stop();
        settle(1500).await;

        assert_eq!(notifier.count(), 1);
        assert_eq!(reporter.count(&Recorded::Stopped), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn start_and_stop_are_idempotent() {
        let live = attached();
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        monitor.start().unwrap();
        settle(1).await;
        assert_eq!(live.receiver_count(), 1);
        assert_eq!(monitor.state(), MonitorState::Observing);

        monitor.stop();
        monitor.stop();
        settle(1).await;
        assert_eq!(live.receiver_count(), 0);
        assert_eq!(reporter.count(&Recorded::Stopped), 1);

        settle(1500).await;
        // The second start coalesced into the first start's session.
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn notify_failure_does_not_stop_monitoring() {
        let live = attached();
        let notifier = RecordingNotifier::with_error(AppError::NotifyError("closed".into()));
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        monitor.start().unwrap();
        settle(1500).await;
        assert_eq!(reporter.count(&Recorded::NotifyFailed), 1);
        assert_eq!(notifier.count(), 0);
        assert_eq!(monitor.state(), MonitorState::Observing);

        live.replace(MEET_URL, meeting_page(&["Alice Johnson"]));
        settle(1500).await;
        assert_eq!(notifier.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_start_waits_for_meeting_page() {
        let live = LiveDocument::new("meet.google.com");
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        let handle = tokio::spawn({
            let monitor = monitor.clone();
            async move { monitor.auto_start().await }
        });
        settle(5000).await;
        assert_eq!(monitor.state(), MonitorState::Idle);

        live.replace(MEET_URL, meeting_page(&["Alice Johnson"]));
        assert!(handle.await.unwrap().unwrap());
        assert_eq!(monitor.state(), MonitorState::Observing);

        settle(1500).await;
        assert_eq!(notifier.last().unwrap(), vec!["Alice Johnson".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_start_ignores_other_pages() {
        let live = LiveDocument::new("meet.google.com");
        live.replace("https://example.com/", meeting_page(&["Alice Johnson"]));
        let notifier = RecordingNotifier::new();
        let reporter = RecordingReporter::new();
        let monitor = monitor(&live, &notifier, &reporter);

        assert!(!monitor.auto_start().await.unwrap());
        assert_eq!(monitor.state(), MonitorState::Idle);
        assert_eq!(reporter.count(&Recorded::Started), 0);
    }
}
