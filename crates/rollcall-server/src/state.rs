use rollcall_core::{BroadcastNotifier, ChangeMonitor, ControlChannel, LiveDocument, MonitorConfig};

/// Shared application state, available to all route handlers via `State<Arc<AppState>>`.
pub struct AppState {
    /// The page most recently pushed to `PUT /v1/document`.
    pub document: LiveDocument,
    /// Source of `GET /v1/events` streams.
    pub notifier: BroadcastNotifier,
    pub channel: ControlChannel<LiveDocument, BroadcastNotifier>,
}

impl AppState {
    pub fn new(config: MonitorConfig) -> Self {
        let document = LiveDocument::new(config.meeting_host.clone());
        let notifier = BroadcastNotifier::default();
        let monitor = ChangeMonitor::new(document.clone(), notifier.clone(), config);
        Self {
            document,
            notifier,
            channel: ControlChannel::new(monitor),
        }
    }

    pub fn monitor(&self) -> &ChangeMonitor<LiveDocument, BroadcastNotifier> {
        self.channel.monitor()
    }
}
