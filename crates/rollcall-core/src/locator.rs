//! Root location: finding the container most likely to hold the participant
//! list, trying each [`LocatorStrategy`] in order until one succeeds.

use std::fmt;

use serde::Serialize;

use crate::classifier::is_ui_text;
use crate::pattern::{AttrMatch, Pattern};
use crate::traits::HostTree;

/// Direct matches for the participants list element.
pub const PARTICIPANTS_LIST: &[Pattern] = &[
    Pattern::attrs(&[
        AttrMatch::Equals("role", "list"),
        AttrMatch::Equals("aria-label", "Participants"),
    ]),
    Pattern::attrs(&[AttrMatch::Equals("aria-label", "Participants")]),
    Pattern::attrs(&[
        AttrMatch::Equals("role", "list"),
        AttrMatch::Contains("aria-label", "participant"),
    ]),
    Pattern::attrs(&[
        AttrMatch::Equals("role", "list"),
        AttrMatch::Contains("aria-label", "Participant"),
    ]),
    Pattern::attrs(&[
        AttrMatch::Class("AE8xFb"),
        AttrMatch::Class("OrqRRb"),
        AttrMatch::Class("GvcuGe"),
        AttrMatch::Class("goTdfd"),
    ]),
    Pattern::attrs(&[AttrMatch::Equals("jsname", "jrQDbd")]),
];

/// Exact texts of the section heading above the list.
pub const SECTION_HEADINGS: &[&str] = &[
    "Contributors",
    "contributors",
    "CONTRIBUTORS",
    "Participants",
    "participants",
    "PARTICIPANTS",
    "People",
    "people",
    "PEOPLE",
];

/// Broad matches for the side panel that hosts the people list.
pub const GENERIC_PANEL: &[Pattern] = &[
    Pattern::attrs(&[AttrMatch::Equals("data-panel-id", "2")]),
    Pattern::attrs(&[AttrMatch::Contains("aria-label", "participant")]),
    Pattern::attrs(&[AttrMatch::Equals("role", "complementary")]),
    Pattern::attrs(&[AttrMatch::Equals("data-tab-id", "2")]),
];

/// Phrases that only appear in the panel's search/invite header.
const PANEL_CHROME: &[&str] = &["Add people", "Search for people"];

const MAX_LIST_CHILDREN: usize = 50;

/// One way of finding the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocatorStrategy {
    /// A list element explicitly labelled as the participants list.
    ParticipantsList,
    /// A "Participants"/"Contributors"/"People" heading and the list near it.
    HeadingSection,
    /// The side panel itself, matched by broad attributes.
    GenericPanel,
}

impl LocatorStrategy {
    /// Strategies in the order they are tried.
    pub const CHAIN: [LocatorStrategy; 3] = [
        LocatorStrategy::ParticipantsList,
        LocatorStrategy::HeadingSection,
        LocatorStrategy::GenericPanel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorStrategy::ParticipantsList => "participants_list",
            LocatorStrategy::HeadingSection => "heading_section",
            LocatorStrategy::GenericPanel => "generic_panel",
        }
    }

    pub fn attempt<T: HostTree>(&self, tree: &T) -> Option<T::Node> {
        match self {
            LocatorStrategy::ParticipantsList => first_match(tree, PARTICIPANTS_LIST),
            LocatorStrategy::HeadingSection => find_heading_section(tree),
            LocatorStrategy::GenericPanel => first_match(tree, GENERIC_PANEL),
        }
    }
}

impl fmt::Display for LocatorStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A root together with the strategy that found it.
#[derive(Debug, Clone, PartialEq)]
pub struct Located<N> {
    pub strategy: LocatorStrategy,
    pub root: N,
}

/// Run the chain, stopping at the first strategy that returns a root.
pub fn locate<T: HostTree>(tree: &T) -> Option<Located<T::Node>> {
    locate_after(tree, None)
}

/// Run the part of the chain that comes after `previous` (or all of it).
pub fn locate_after<T: HostTree>(
    tree: &T,
    previous: Option<LocatorStrategy>,
) -> Option<Located<T::Node>> {
    let start = previous
        .and_then(|p| LocatorStrategy::CHAIN.iter().position(|s| *s == p))
        .map_or(0, |i| i + 1);

    for strategy in &LocatorStrategy::CHAIN[start..] {
        if let Some(root) = strategy.attempt(tree) {
            tracing::debug!(%strategy, "Located participant root");
            return Some(Located {
                strategy: *strategy,
                root,
            });
        }
        tracing::debug!(%strategy, "Strategy found no root");
    }
    None
}

/// Returns true if `node` has the shape of a participant list: a handful of
/// children and no panel chrome in its text.
pub fn looks_like_participant_list<T: HostTree>(tree: &T, node: &T::Node) -> bool {
    let child_count = tree.children(node).len();
    if child_count == 0 || child_count >= MAX_LIST_CHILDREN {
        return false;
    }
    let text = tree.text_content(node);
    !is_ui_text(&text) && !PANEL_CHROME.iter().any(|p| text.contains(p))
}

fn first_match<T: HostTree>(tree: &T, patterns: &[Pattern]) -> Option<T::Node> {
    patterns.iter().find_map(|pattern| {
        let found = tree.select_first(pattern);
        if found.is_some() {
            tracing::debug!(%pattern, "Selector matched");
        }
        found
    })
}

fn find_heading_section<T: HostTree>(tree: &T) -> Option<T::Node> {
    let document = tree.document();
    let heading = std::iter::once(document.clone())
        .chain(tree.descendants(&document))
        .find(|node| {
            let text = tree.text_content(node);
            SECTION_HEADINGS.contains(&text.trim())
        })?;

    tracing::debug!(
        heading = %tree.text_content(&heading).trim(),
        "Found section heading"
    );

    let parent = tree.parent(&heading);
    let grandparent = parent.as_ref().and_then(|p| tree.parent(p));
    let candidates = [
        parent.clone(),
        grandparent.clone(),
        tree.next_sibling(&heading),
        parent.as_ref().and_then(|p| tree.next_sibling(p)),
        grandparent.as_ref().and_then(|g| tree.next_sibling(g)),
    ];

    candidates
        .into_iter()
        .flatten()
        .find(|c| looks_like_participant_list(tree, c))
        .or(parent)
        .or(Some(heading))
}
