//! Owned, immutable copy of an interface tree.
//!
//! A [`Snapshot`] is what a page capture becomes once parsed: an arena of
//! elements and text fragments that implements [`HostTree`]. Snapshots are
//! shared behind `Arc`, so a session keeps reading the tree it started with
//! even if the live document moves on.

use crate::traits::{HostTree, NodeContent};

/// Index of an element inside a [`Snapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
enum Content {
    Element(NodeId),
    Text(String),
}

#[derive(Debug, Clone)]
struct Element {
    tag: String,
    attributes: Vec<(String, String)>,
    parent: Option<NodeId>,
    contents: Vec<Content>,
}

/// Arena-backed element tree.
#[derive(Debug, Clone)]
pub struct Snapshot {
    elements: Vec<Element>,
}

impl Snapshot {
    /// Build a snapshot whose document element is `root`.
    pub fn from_spec(root: ElementSpec) -> Self {
        let mut builder = SnapshotBuilder::new(&root.tag, root.attributes);
        let mut stack = vec![root.contents.into_iter()];
        while let Some(frame) = stack.last_mut() {
            match frame.next() {
                Some(SpecContent::Text(t)) => builder.text(t),
                Some(SpecContent::Element(child)) => {
                    builder.open(&child.tag, child.attributes);
                    stack.push(child.contents.into_iter());
                }
                None => {
                    stack.pop();
                    if !stack.is_empty() {
                        builder.close();
                    }
                }
            }
        }
        builder.finish()
    }

    /// A snapshot containing only an empty `<html>` element.
    pub fn empty() -> Self {
        Self::from_spec(ElementSpec::new("html"))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 1 && self.elements.iter().all(|e| e.contents.is_empty())
    }

    fn element(&self, node: &NodeId) -> &Element {
        &self.elements[node.0]
    }
}

/// Depth-first, push-style construction of a [`Snapshot`].
///
/// The builder keeps a cursor on the current element: [`open`](Self::open)
/// appends a child and moves into it, [`close`](Self::close) moves back out.
/// Nothing recurses, so arbitrarily deep input is fine.
#[derive(Debug)]
pub struct SnapshotBuilder {
    elements: Vec<Element>,
    open: Vec<NodeId>,
}

impl SnapshotBuilder {
    pub fn new<K, V>(root_tag: &str, attributes: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut builder = Self {
            elements: Vec::new(),
            open: Vec::new(),
        };
        builder.push_element(root_tag, attributes);
        builder
    }

    /// Append a child element to the current one and make it current.
    pub fn open<K, V>(&mut self, tag: &str, attributes: impl IntoIterator<Item = (K, V)>) -> NodeId
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.push_element(tag, attributes)
    }

    /// Append a text fragment to the current element.
    pub fn text(&mut self, text: impl Into<String>) {
        if let Some(current) = self.open.last() {
            self.elements[current.0]
                .contents
                .push(Content::Text(text.into()));
        }
    }

    /// Return to the parent of the current element. The document element
    /// stays open.
    pub fn close(&mut self) {
        if self.open.len() > 1 {
            self.open.pop();
        }
    }

    /// Number of open elements, the document element included.
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    pub fn finish(self) -> Snapshot {
        Snapshot {
            elements: self.elements,
        }
    }

    fn push_element<K, V>(&mut self, tag: &str, attributes: impl IntoIterator<Item = (K, V)>) -> NodeId
    where
        K: Into<String>,
        V: Into<String>,
    {
        let id = NodeId(self.elements.len());
        let parent = self.open.last().copied();
        self.elements.push(Element {
            tag: tag.to_ascii_lowercase(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            parent,
            contents: Vec::new(),
        });
        if let Some(parent) = parent {
            self.elements[parent.0].contents.push(Content::Element(id));
        }
        self.open.push(id);
        id
    }
}

impl HostTree for Snapshot {
    type Node = NodeId;

    fn document(&self) -> NodeId {
        NodeId(0)
    }

    fn parent(&self, node: &NodeId) -> Option<NodeId> {
        self.element(node).parent
    }

    fn contents(&self, node: &NodeId) -> Vec<NodeContent<NodeId>> {
        self.element(node)
            .contents
            .iter()
            .map(|c| match c {
                Content::Element(id) => NodeContent::Element(*id),
                Content::Text(t) => NodeContent::Text(t.clone()),
            })
            .collect()
    }

    fn tag_name(&self, node: &NodeId) -> String {
        self.element(node).tag.clone()
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        self.element(node)
            .attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }
}

#[derive(Debug, Clone)]
enum SpecContent {
    Element(ElementSpec),
    Text(String),
}

/// Builder description of an element and everything below it.
///
/// ```rust
/// use rollcall_core::snapshot::{ElementSpec, Snapshot};
///
/// let snapshot = Snapshot::from_spec(
///     ElementSpec::new("div")
///         .attr("role", "list")
///         .child(ElementSpec::new("div").attr("role", "listitem").text("Alice Johnson")),
/// );
/// assert_eq!(snapshot.len(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct ElementSpec {
    tag: String,
    attributes: Vec<(String, String)>,
    contents: Vec<SpecContent>,
}

impl ElementSpec {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            contents: Vec::new(),
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.contents.push(SpecContent::Text(text.into()));
        self
    }

    pub fn child(mut self, child: ElementSpec) -> Self {
        self.contents.push(SpecContent::Element(child));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = ElementSpec>) -> Self {
        self.contents
            .extend(children.into_iter().map(SpecContent::Element));
        self
    }

    /// Append an attribute in place; used by parsers walking foreign trees.
    pub fn push_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.push((name.into(), value.into()));
    }

    pub fn push_text(&mut self, text: impl Into<String>) {
        self.contents.push(SpecContent::Text(text.into()));
    }

    pub fn push_child(&mut self, child: ElementSpec) {
        self.contents.push(SpecContent::Element(child));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Snapshot {
        Snapshot::from_spec(
            ElementSpec::new("BODY")
                .text("Hello ")
                .child(ElementSpec::new("b").text("there"))
                .text(" friend")
                .child(
                    ElementSpec::new("ul")
                        .child(ElementSpec::new("li").text("one"))
                        .child(ElementSpec::new("li").text("two")),
                ),
        )
    }

    #[test]
    fn text_content_keeps_document_order() {
        let tree = sample();
        let root = tree.document();
        assert_eq!(tree.text_content(&root), "Hello there friendonetwo");
        assert_eq!(tree.direct_text(&root), "Hello  friend");
        assert_eq!(
            tree.text_nodes(&root),
            vec!["Hello ", "there", " friend", "one", "two"]
        );
    }

    #[test]
    fn navigation() {
        let tree = sample();
        let root = tree.document();
        assert_eq!(tree.tag_name(&root), "body");
        let kids = tree.children(&root);
        assert_eq!(kids.len(), 2);
        assert_eq!(tree.next_sibling(&kids[0]), Some(kids[1]));
        assert_eq!(tree.next_sibling(&kids[1]), None);
        assert_eq!(tree.parent(&kids[0]), Some(root));
        assert_eq!(tree.parent(&root), None);
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample();
        let root = tree.document();
        let tags: Vec<String> = tree
            .descendants(&root)
            .iter()
            .map(|n| tree.tag_name(n))
            .collect();
        assert_eq!(tags, vec!["b", "ul", "li", "li"]);
    }

    #[test]
    fn attributes_are_case_insensitive_by_name() {
        let tree = Snapshot::from_spec(ElementSpec::new("div").attr("Aria-Label", "Panel"));
        let root = tree.document();
        assert_eq!(tree.attribute(&root, "aria-label").as_deref(), Some("Panel"));
        assert_eq!(tree.attribute(&root, "role"), None);
    }

    #[test]
    fn builder_tracks_the_cursor() {
        let mut builder = SnapshotBuilder::new("HTML", [("lang", "en")]);
        builder.open("body", Vec::<(String, String)>::new());
        builder.text("Hi ");
        builder.open("b", [("class", "x")]);
        assert_eq!(builder.depth(), 3);
        builder.text("there");
        builder.close();
        builder.close();
        builder.close();
        assert_eq!(builder.depth(), 1);
        builder.text("!");

        let tree = builder.finish();
        let root = tree.document();
        assert_eq!(tree.tag_name(&root), "html");
        assert_eq!(tree.attribute(&root, "lang").as_deref(), Some("en"));
        assert_eq!(tree.text_content(&root), "Hi there!");
    }

    #[test]
    fn deep_trees_are_built_and_walked_without_recursion() {
        const DEPTH: usize = 50_000;
        let mut spec = ElementSpec::new("span").text("Alice Johnson");
        for _ in 0..DEPTH {
            spec = ElementSpec::new("div").child(spec);
        }

        let tree = Snapshot::from_spec(spec);
        let root = tree.document();
        assert_eq!(tree.len(), DEPTH + 1);
        assert_eq!(tree.text_content(&root), "Alice Johnson");
        assert_eq!(tree.text_nodes(&root), vec!["Alice Johnson"]);

        let deepest = tree.descendants(&root).pop().unwrap();
        assert_eq!(tree.tag_name(&deepest), "span");
        assert_eq!(
            std::iter::successors(Some(deepest), |n| tree.parent(n)).count(),
            DEPTH + 1
        );
    }

    #[test]
    fn empty_snapshot() {
        assert!(Snapshot::empty().is_empty());
        assert!(!sample().is_empty());
    }
}
