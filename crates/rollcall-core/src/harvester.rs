//! Candidate harvesting: turning the subtree under a located root into names.

use crate::classifier::{clean, extract_name, is_valid_name};
use crate::models::{ParticipantName, ParticipantSet};
use crate::pattern::{AttrMatch, Pattern};
use crate::traits::HostTree;

/// Element selectors tried in order against a root.
pub const SUB_STRATEGIES: &[Pattern] = &[
    Pattern::attrs(&[AttrMatch::Equals("role", "listitem")]),
    Pattern::tag("li"),
    Pattern::tag("div").leaf(),
    Pattern::tag("span").leaf(),
    Pattern::attrs(&[AttrMatch::Present("data-participant-id")]),
    Pattern::attrs(&[AttrMatch::Present("data-self-name")]),
    Pattern::attrs(&[AttrMatch::Class("participant-item")]),
    Pattern::attrs(&[AttrMatch::Class("participant-name")]),
    Pattern::attrs(&[AttrMatch::Class("name")]),
];

/// Elements with more children than this are treated as containers by the
/// escalation scan.
const LEAF_SCAN_MAX_CHILDREN: usize = 2;

/// Which stage of [`harvest`] produced names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarvestStage {
    SubStrategies,
    LeafScan,
    TextNodes,
    Nothing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HarvestOutcome {
    pub stage: HarvestStage,
    /// Candidates that passed classification, duplicates included.
    pub accepted: usize,
    /// Names that were new to the set.
    pub added: usize,
}

impl HarvestOutcome {
    pub fn found_any(&self) -> bool {
        self.accepted > 0
    }
}

/// Harvest every name below `root` into `set`.
///
/// Runs the [`SUB_STRATEGIES`] table first. Only if none of them yields an
/// accepted name does it escalate to scanning near-leaf descendants, and then
/// to raw text fragments.
pub fn harvest<T: HostTree>(tree: &T, root: &T::Node, set: &mut ParticipantSet) -> HarvestOutcome {
    let before = set.len();

    let accepted = harvest_sub_strategies(tree, root, set);
    if accepted > 0 {
        return outcome(HarvestStage::SubStrategies, accepted, set.len() - before);
    }

    tracing::debug!("No names from sub-strategies, scanning near-leaf descendants");
    let accepted = harvest_leaf_scan(tree, root, set);
    if accepted > 0 {
        return outcome(HarvestStage::LeafScan, accepted, set.len() - before);
    }

    tracing::debug!("No names from near-leaf scan, walking text fragments");
    let accepted = harvest_text_nodes(tree, root, set);
    if accepted > 0 {
        return outcome(HarvestStage::TextNodes, accepted, set.len() - before);
    }

    outcome(HarvestStage::Nothing, 0, 0)
}

fn outcome(stage: HarvestStage, accepted: usize, added: usize) -> HarvestOutcome {
    HarvestOutcome {
        stage,
        accepted,
        added,
    }
}

fn harvest_sub_strategies<T: HostTree>(
    tree: &T,
    root: &T::Node,
    set: &mut ParticipantSet,
) -> usize {
    let mut accepted = 0;
    for pattern in SUB_STRATEGIES {
        let matched = tree.select_all(root, pattern);
        let mut hits = 0;
        for node in &matched {
            match extract_name(tree, node).and_then(ParticipantName::from_cleaned) {
                Some(name) => {
                    hits += 1;
                    set.insert(name);
                }
                None => {
                    tracing::trace!(text = %tree.text_content(node).trim(), "Rejected candidate");
                }
            }
        }
        tracing::debug!(%pattern, matched = matched.len(), accepted = hits, "Sub-strategy scanned");
        accepted += hits;
    }
    accepted
}

fn harvest_leaf_scan<T: HostTree>(tree: &T, root: &T::Node, set: &mut ParticipantSet) -> usize {
    tree.descendants(root)
        .iter()
        .filter(|node| tree.children(node).len() <= LEAF_SCAN_MAX_CHILDREN)
        .filter(|node| {
            let text = tree.text_content(node);
            let len = text.trim().chars().count();
            len > 2 && len < 100 && admit_text(set, &text)
        })
        .count()
}

fn harvest_text_nodes<T: HostTree>(tree: &T, root: &T::Node, set: &mut ParticipantSet) -> usize {
    tree.text_nodes(root)
        .iter()
        .filter(|text| admit_text(set, text))
        .count()
}

/// Strict path for unstructured text: validate, then clean, then add.
///
/// Returns true if the text was accepted, whether or not it was new.
pub(crate) fn admit_text(set: &mut ParticipantSet, text: &str) -> bool {
    let text = text.trim();
    if text.is_empty() || !is_valid_name(text) {
        return false;
    }
    match ParticipantName::from_cleaned(clean(text)) {
        Some(name) => {
            set.insert(name);
            true
        }
        None => false,
    }
}
