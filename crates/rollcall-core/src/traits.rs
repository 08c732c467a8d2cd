use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::error::AppError;
use crate::pattern::Pattern;

/// One entry in an element's ordered contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent<N> {
    Element(N),
    Text(String),
}

/// Read-only view of the meeting interface tree.
///
/// Implementors provide the primitive reads; traversal, text aggregation and
/// pattern queries are derived from them. Nodes are owned by the host and
/// only ever read.
pub trait HostTree {
    type Node: Clone + PartialEq + Debug;

    /// The outermost element of the page.
    fn document(&self) -> Self::Node;

    fn parent(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Child elements and text fragments, in document order.
    fn contents(&self, node: &Self::Node) -> Vec<NodeContent<Self::Node>>;

    /// Lowercase tag name.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    /// Layout-aware text as the host renders it, when the host can provide it.
    fn rendered_text(&self, _node: &Self::Node) -> Option<String> {
        None
    }

    fn children(&self, node: &Self::Node) -> Vec<Self::Node> {
        self.contents(node)
            .into_iter()
            .filter_map(|c| match c {
                NodeContent::Element(n) => Some(n),
                NodeContent::Text(_) => None,
            })
            .collect()
    }

    fn next_sibling(&self, node: &Self::Node) -> Option<Self::Node> {
        let parent = self.parent(node)?;
        let siblings = self.children(&parent);
        let pos = siblings.iter().position(|s| s == node)?;
        siblings.into_iter().nth(pos + 1)
    }

    /// Text fragments that are immediate children of `node`, joined and trimmed.
    fn direct_text(&self, node: &Self::Node) -> String {
        let mut text = String::new();
        for content in self.contents(node) {
            if let NodeContent::Text(t) = content {
                text.push_str(&t);
            }
        }
        text.trim().to_string()
    }

    /// All descendant text concatenated in document order, untrimmed.
    fn text_content(&self, node: &Self::Node) -> String {
        let mut text = String::new();
        for_each_text(self, node, |t| text.push_str(&t));
        text
    }

    /// Every element below `node` in pre-order, excluding `node` itself.
    fn descendants(&self, node: &Self::Node) -> Vec<Self::Node> {
        let mut out = Vec::new();
        let mut stack = self.children(node);
        stack.reverse();
        while let Some(next) = stack.pop() {
            let mut kids = self.children(&next);
            kids.reverse();
            stack.extend(kids);
            out.push(next);
        }
        out
    }

    /// Every text fragment below `node`, in document order.
    fn text_nodes(&self, node: &Self::Node) -> Vec<String> {
        let mut out = Vec::new();
        for_each_text(self, node, |t| out.push(t));
        out
    }

    /// Descendants of `scope` matching `pattern`, in document order.
    fn select_all(&self, scope: &Self::Node, pattern: &Pattern) -> Vec<Self::Node>
    where
        Self: Sized,
    {
        self.descendants(scope)
            .into_iter()
            .filter(|n| pattern.matches(self, n))
            .collect()
    }

    /// First element of the whole document matching `pattern`.
    fn select_first(&self, pattern: &Pattern) -> Option<Self::Node>
    where
        Self: Sized,
    {
        let root = self.document();
        if pattern.matches(self, &root) {
            return Some(root);
        }
        self.descendants(&root)
            .into_iter()
            .find(|n| pattern.matches(self, n))
    }
}

/// Visit every text fragment below `node` in document order, keeping an
/// explicit stack of sibling iterators instead of recursing.
fn for_each_text<T: HostTree + ?Sized>(tree: &T, node: &T::Node, mut visit: impl FnMut(String)) {
    let mut stack = vec![tree.contents(node).into_iter()];
    while let Some(frame) = stack.last_mut() {
        match frame.next() {
            Some(NodeContent::Text(t)) => visit(t),
            Some(NodeContent::Element(child)) => stack.push(tree.contents(&child).into_iter()),
            None => {
                stack.pop();
            }
        }
    }
}

impl<T: HostTree> HostTree for Arc<T> {
    type Node = T::Node;

    fn document(&self) -> Self::Node {
        (**self).document()
    }

    fn parent(&self, node: &Self::Node) -> Option<Self::Node> {
        (**self).parent(node)
    }

    fn contents(&self, node: &Self::Node) -> Vec<NodeContent<Self::Node>> {
        (**self).contents(node)
    }

    fn tag_name(&self, node: &Self::Node) -> String {
        (**self).tag_name(node)
    }

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String> {
        (**self).attribute(node, name)
    }

    fn rendered_text(&self, node: &Self::Node) -> Option<String> {
        (**self).rendered_text(node)
    }
}

/// A single subtree-mutation subscription.
///
/// Dropping the feed cancels the subscription.
#[derive(Debug)]
pub struct MutationFeed {
    rx: broadcast::Receiver<u64>,
}

impl MutationFeed {
    pub fn new(rx: broadcast::Receiver<u64>) -> Self {
        Self { rx }
    }

    /// Wait for the next mutation and return the document revision it produced.
    ///
    /// Returns `None` once the host has gone away.
    pub async fn next(&mut self) -> Option<u64> {
        loop {
            match self.rx.recv().await {
                Ok(revision) => return Some(revision),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Mutation feed lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

/// The live page hosting the meeting interface.
pub trait DocumentHost: Send + Sync + Clone + 'static {
    type Tree: HostTree + Send;

    /// A consistent view of the current tree, or `None` if no page is attached.
    fn document(&self) -> Option<Self::Tree>;

    /// Register for structural changes anywhere in the document.
    fn subscribe(&self) -> Result<MutationFeed, AppError>;

    /// Whether the attached page is the meeting host.
    fn is_meeting_page(&self) -> bool;

    /// Resolves once a document has been attached.
    fn loaded(&self) -> impl Future<Output = ()> + Send;
}

/// Delivers a finished participant list to the external subscriber channel.
pub trait Notifier: Send + Sync + Clone + 'static {
    fn notify(&self, participants: &[String]) -> impl Future<Output = Result<(), AppError>> + Send;
}
