//! Test utilities: page fixtures and recording implementations of the
//! notifier and monitor reporter traits.
//!
//! Recorders use `Arc<Mutex<_>>` so clones handed to the code under test
//! share what they saw with the assertion side.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::AppError;
use crate::monitor::{MonitorEvent, MonitorReporter};
use crate::snapshot::{ElementSpec, NodeId, Snapshot};
use crate::traits::{HostTree, NodeContent, Notifier};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn list_item(text: &str) -> ElementSpec {
    ElementSpec::new("div").attr("role", "listitem").text(text)
}

/// `<div role="list" aria-label="Participants">` with one item per text.
pub fn participants_list(items: &[&str]) -> ElementSpec {
    ElementSpec::new("div")
        .attr("role", "list")
        .attr("aria-label", "Participants")
        .children(items.iter().map(|t| list_item(t)))
}

/// A panel with a heading row and a sibling list, without list labelling.
pub fn heading_panel(heading: &str, names: &[&str]) -> ElementSpec {
    ElementSpec::new("div")
        .attr("class", "panel")
        .child(
            ElementSpec::new("div")
                .attr("class", "header")
                .child(ElementSpec::new("h2").text(heading)),
        )
        .child(
            ElementSpec::new("div")
                .attr("class", "people-list")
                .children(names.iter().map(|n| ElementSpec::new("div").child(
                    ElementSpec::new("span").text(*n),
                ))),
        )
}

/// A video tile carrying the participant id and self-name attributes.
pub fn video_tile(id: &str, name: &str) -> ElementSpec {
    ElementSpec::new("div")
        .attr("data-participant-id", id)
        .child(
            ElementSpec::new("div")
                .attr("data-self-name", name)
                .child(ElementSpec::new("img").attr("alt", "")),
        )
}

/// A snapshot whose host also renders layout-aware text for chosen nodes.
pub struct RenderedTree {
    snapshot: Snapshot,
    rendered: HashMap<NodeId, String>,
}

impl RenderedTree {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            rendered: HashMap::new(),
        }
    }

    pub fn render(mut self, node: NodeId, text: &str) -> Self {
        self.rendered.insert(node, text.to_string());
        self
    }
}

impl HostTree for RenderedTree {
    type Node = NodeId;

    fn document(&self) -> NodeId {
        self.snapshot.document()
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.snapshot.parent(node)
    }

    fn contents(&self, node: &NodeId) -> Vec<NodeContent<NodeId>> {
        self.snapshot.contents(node)
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.snapshot.tag_name(node)
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.snapshot.attribute(node, name)
    }

    fn rendered_text(&self, node: &NodeId) -> Option<String> {
        self.rendered.get(node).cloned()
    }
}

/// A full meeting page: toolbar chrome, a labelled participants list.
pub fn meeting_page(names: &[&str]) -> Snapshot {
    Snapshot::from_spec(
        ElementSpec::new("html").child(
            ElementSpec::new("body")
                .child(
                    ElementSpec::new("div")
                        .attr("role", "toolbar")
                        .child(ElementSpec::new("button").text("Turn off microphone"))
                        .child(ElementSpec::new("button").text("Leave call")),
                )
                .child(
                    ElementSpec::new("aside")
                        .attr("role", "complementary")
                        .child(ElementSpec::new("div").text("Add people"))
                        .child(participants_list(names)),
                ),
        ),
    )
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// Notifier that records every pushed list.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub pushes: Arc<Mutex<Vec<Vec<String>>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifier whose next push fails.
    pub fn with_error(error: AppError) -> Self {
        Self {
            pushes: Arc::default(),
            error: Arc::new(Mutex::new(Some(error))),
        }
    }

    pub fn count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    pub fn last(&self) -> Option<Vec<String>> {
        self.pushes.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, participants: &[String]) -> Result<(), AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        self.pushes.lock().unwrap().push(participants.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingReporter
// ---------------------------------------------------------------------------

/// Simplified, owned copy of a [`MonitorEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Started,
    Stopped,
    Triggered,
    Coalesced,
    SessionCompleted(usize),
    NotifyFailed,
}

/// Reporter that keeps an ordered log of monitor events.
#[derive(Clone, Default)]
pub struct RecordingReporter {
    pub events: Arc<Mutex<Vec<Recorded>>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, wanted: &Recorded) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| *e == wanted)
            .count()
    }

    pub fn sessions(&self) -> usize {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| matches!(e, Recorded::SessionCompleted(_)))
            .count()
    }
}

impl MonitorReporter for RecordingReporter {
    fn report(&self, event: MonitorEvent<'_>) {
        let recorded = match event {
            MonitorEvent::Started { .. } => Recorded::Started,
            MonitorEvent::Stopped { .. } => Recorded::Stopped,
            MonitorEvent::Triggered { .. } => Recorded::Triggered,
            MonitorEvent::Coalesced { .. } => Recorded::Coalesced,
            MonitorEvent::SessionCompleted { participants, .. } => {
                Recorded::SessionCompleted(participants.len())
            }
            MonitorEvent::NotifyFailed { .. } => Recorded::NotifyFailed,
        };
        self.events.lock().unwrap().push(recorded);
    }
}
