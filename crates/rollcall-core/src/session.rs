use serde::Serialize;

use crate::classifier::extract_name;
use crate::harvester::{admit_text, harvest};
use crate::locator::{LocatorStrategy, locate, locate_after};
use crate::models::{ParticipantName, ParticipantSet};
use crate::pattern::{AttrMatch, Pattern};
use crate::traits::HostTree;

const PARTICIPANT_TILE: Pattern = Pattern::attrs(&[AttrMatch::Present("data-participant-id")]);

/// Tile-shaped elements anywhere in the document, read with `extract_name`.
pub const VIDEO_TILES: &[Pattern] = &[
    Pattern::attrs(&[AttrMatch::Present("data-self-name")]).within(&PARTICIPANT_TILE),
    PARTICIPANT_TILE,
    Pattern::attrs(&[AttrMatch::Class("participant-name")]),
    Pattern::attrs(&[AttrMatch::Contains("aria-label", "video")]),
    Pattern::attrs(&[AttrMatch::Present("data-fps-request-screencast-cap")]),
];

/// Broad attribute matches, read from each element's direct text only.
pub const ATTRIBUTE_SCAN: &[Pattern] = &[
    PARTICIPANT_TILE,
    Pattern::attrs(&[AttrMatch::Present("data-self-name")]),
    Pattern::attrs(&[AttrMatch::Equals("role", "listitem")]),
    Pattern::attrs(&[AttrMatch::Contains("aria-label", "participant")]),
    Pattern::attrs(&[AttrMatch::Contains("aria-label", "video")]),
    Pattern::attrs(&[AttrMatch::Class("participant")]),
    Pattern::attrs(&[AttrMatch::Class("name")]),
];

/// Page text that only shows up while the people panel is open.
pub const PANEL_INDICATORS: &[&str] = &[
    "Add people",
    "Search for people",
    "Contributors",
    "Participants",
    "In call",
];

const TROUBLESHOOTING: &[&str] = &[
    "Make sure you are in an active meeting",
    "Open the people panel",
    "Make sure there are other participants in the meeting",
    "Check that a \"Contributors\" or \"In call\" section is visible",
    "Try reloading the meeting page and rejoining",
];

/// Outcome of one extraction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionReport {
    /// Names in first-seen order.
    pub participants: Vec<String>,
    /// Strategy whose root produced names, if any did.
    pub located: Option<LocatorStrategy>,
    /// Every strategy whose root was harvested, in order.
    pub roots_tried: Vec<LocatorStrategy>,
    /// New names contributed by the located roots.
    pub from_roots: usize,
    /// New names contributed by the video-tile pass.
    pub from_video_tiles: usize,
    /// New names contributed by the attribute scan.
    pub from_attributes: usize,
}

impl ExtractionReport {
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

/// One full extraction pass over a tree.
///
/// Stateless between runs: every session starts from an empty set and reads
/// only the tree it was given.
pub struct ExtractionSession<'a, T: HostTree> {
    tree: &'a T,
    set: ParticipantSet,
    report: ExtractionReport,
}

impl<'a, T: HostTree> ExtractionSession<'a, T> {
    pub fn new(tree: &'a T) -> Self {
        Self {
            tree,
            set: ParticipantSet::new(),
            report: ExtractionReport::default(),
        }
    }

    /// Locate, harvest, then run the document-wide passes.
    ///
    /// Never fails. When nothing is found the report is empty and
    /// troubleshooting guidance is logged.
    pub fn run(mut self) -> ExtractionReport {
        tracing::debug!("Starting participant extraction");

        self.report.from_roots = self.harvest_roots();
        self.report.from_video_tiles = self.video_tile_pass();
        self.report.from_attributes = self.attribute_pass();

        self.report.participants = self.set.into_vec();
        if self.report.participants.is_empty() {
            suggest_troubleshooting();
        } else {
            tracing::info!(
                count = self.report.participants.len(),
                located = ?self.report.located,
                "Extracted participants"
            );
        }
        self.report
    }

    fn harvest_roots(&mut self) -> usize {
        let before = self.set.len();
        let mut next = locate(self.tree);

        if next
            .as_ref()
            .is_none_or(|l| l.strategy != LocatorStrategy::ParticipantsList)
        {
            check_panel_state(self.tree);
        }

        while let Some(located) = next {
            self.report.roots_tried.push(located.strategy);
            let outcome = harvest(self.tree, &located.root, &mut self.set);
            tracing::debug!(
                strategy = %located.strategy,
                stage = ?outcome.stage,
                added = outcome.added,
                "Harvested root"
            );
            if outcome.found_any() {
                self.report.located = Some(located.strategy);
                break;
            }
            next = locate_after(self.tree, Some(located.strategy));
        }

        self.set.len() - before
    }

    fn video_tile_pass(&mut self) -> usize {
        let before = self.set.len();
        for pattern in VIDEO_TILES {
            for node in select_document(self.tree, pattern) {
                if let Some(name) = extract_name(self.tree, &node).and_then(ParticipantName::from_cleaned)
                {
                    if self.set.insert(name) {
                        tracing::debug!(%pattern, "Found participant in video tile");
                    }
                }
            }
        }
        self.set.len() - before
    }

    fn attribute_pass(&mut self) -> usize {
        let before = self.set.len();
        for pattern in ATTRIBUTE_SCAN {
            for node in select_document(self.tree, pattern) {
                let text = self.tree.direct_text(&node);
                admit_text(&mut self.set, &text);
            }
        }
        self.set.len() - before
    }
}

/// Run one extraction pass and return the names in first-seen order.
pub fn run_extraction<T: HostTree>(tree: &T) -> Vec<String> {
    ExtractionSession::new(tree).run().participants
}

fn select_document<T: HostTree>(tree: &T, pattern: &Pattern) -> Vec<T::Node> {
    let root = tree.document();
    let mut nodes = Vec::new();
    if pattern.matches(tree, &root) {
        nodes.push(root.clone());
    }
    nodes.extend(tree.select_all(&root, pattern));
    nodes
}

/// Returns the panel indicators present in the page text, matched
/// case-insensitively.
pub fn panel_indicators<T: HostTree>(tree: &T) -> Vec<&'static str> {
    let page = tree.text_content(&tree.document()).to_lowercase();
    PANEL_INDICATORS
        .iter()
        .copied()
        .filter(|i| page.contains(&i.to_lowercase()))
        .collect()
}

fn check_panel_state<T: HostTree>(tree: &T) {
    let found = panel_indicators(tree);
    if found.is_empty() {
        tracing::warn!("People panel may not be open; open it in the meeting to list participants");
    } else {
        tracing::debug!(indicators = ?found, "Found people panel indicators");
    }
}

fn suggest_troubleshooting() {
    tracing::warn!("No participants found");
    for (i, hint) in TROUBLESHOOTING.iter().enumerate() {
        tracing::info!(step = i + 1, "{hint}");
    }
}
