pub mod classifier;
pub mod config;
pub mod error;
pub mod harvester;
pub mod live;
pub mod locator;
pub mod models;
pub mod monitor;
pub mod notifier;
pub mod pattern;
pub mod protocol;
pub mod session;
pub mod snapshot;
pub mod traits;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::MonitorConfig;
pub use error::AppError;
pub use live::LiveDocument;
pub use models::{ParticipantName, ParticipantSet, compute_hash};
pub use monitor::{ChangeMonitor, MonitorState, TracingMonitorReporter};
pub use notifier::BroadcastNotifier;
pub use protocol::{ControlChannel, Event, Request, Response};
pub use session::{ExtractionReport, ExtractionSession, run_extraction};
pub use snapshot::{ElementSpec, NodeId, Snapshot, SnapshotBuilder};
pub use traits::{DocumentHost, HostTree, MutationFeed, NodeContent, Notifier};
