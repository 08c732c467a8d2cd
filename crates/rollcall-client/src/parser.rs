use rollcall_core::snapshot::{Snapshot, SnapshotBuilder};
use scraper::{Html, Node};

/// Elements whose contents are never rendered as text.
const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Deepest element nesting kept in a snapshot, the document element
/// included. Elements below it are attached to the element at this depth,
/// the way Chromium's parser flattens over-nested markup.
pub const MAX_TREE_DEPTH: usize = 512;

/// Parse a captured page into a [`Snapshot`] rooted at `<html>`.
///
/// Parsing is lenient: malformed markup is repaired the way a browser would,
/// so this never fails. Comments and the contents of non-rendered elements
/// (scripts, styles) are dropped. Nesting beyond [`MAX_TREE_DEPTH`] is
/// flattened; no text is lost.
pub fn parse_html(html: &str) -> Snapshot {
    let document = Html::parse_document(html);
    let root = document.root_element();
    let mut builder = SnapshotBuilder::new(root.value().name(), root.value().attrs());

    // Each frame is a sibling iterator plus whether it belongs to an element
    // the builder opened (and must close when the frame runs out).
    let mut stack = vec![(root.children(), false)];
    let mut flattened = 0usize;
    while let Some((children, _)) = stack.last_mut() {
        let Some(child) = children.next() else {
            if let Some((_, true)) = stack.pop() {
                builder.close();
            }
            continue;
        };
        match child.value() {
            Node::Element(el) if SKIPPED_TAGS.contains(&el.name()) => {}
            Node::Element(el) => {
                builder.open(el.name(), el.attrs());
                if builder.depth() <= MAX_TREE_DEPTH {
                    stack.push((child.children(), true));
                } else {
                    builder.close();
                    flattened += 1;
                    stack.push((child.children(), false));
                }
            }
            Node::Text(text) => builder.text(&**text),
            _ => {}
        }
    }

    if flattened > 0 {
        tracing::warn!(flattened, max_depth = MAX_TREE_DEPTH, "Flattened over-nested elements");
    }
    let snapshot = builder.finish();
    tracing::debug!(bytes = html.len(), elements = snapshot.len(), "Parsed page capture");
    snapshot
}
