//! Ancestor path maintained during traversal.

use crate::{Document, Node, NodeType};

/// Position of the visitor in the tree.
///
/// Holds the path from the root to the node currently being visited (root
/// first) and the document snapshot the pass started from. A cursor is
/// created fresh for every traversal; the default walk pushes a node before
/// dispatching to its `visit_*` method and pops it afterwards.
#[derive(Debug, Clone)]
pub struct Cursor {
    document: Document,
    path: Vec<Node>,
}

impl Cursor {
    /// Creates an empty cursor for a traversal of `document`.
    pub fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
            path: Vec::new(),
        }
    }

    /// The document snapshot the traversal started from.
    #[inline]
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The node currently being visited.
    #[inline]
    pub fn current(&self) -> Option<&Node> {
        self.path.last()
    }

    /// The parent of the current node.
    pub fn parent(&self) -> Option<&Node> {
        self.path.len().checked_sub(2).map(|index| &self.path[index])
    }

    /// Number of nodes on the path; the root has depth 1 while visited.
    #[inline]
    pub fn depth(&self) -> usize {
        self.path.len()
    }

    /// Nodes from the root down to the current node.
    #[inline]
    pub fn path(&self) -> &[Node] {
        &self.path
    }

    /// Ancestors of the current node, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = &Node> {
        let above = self.path.len().saturating_sub(1);
        self.path[..above].iter().rev()
    }

    /// Returns the nearest node of `node_type`, starting at the current node
    /// and moving outward.
    pub fn nearest_enclosing(&self, node_type: NodeType) -> Option<&Node> {
        self.path
            .iter()
            .rev()
            .find(|node| node.node_type() == node_type)
    }

    pub(crate) fn push(&mut self, node: Node) {
        self.path.push(node);
    }

    pub(crate) fn pop(&mut self) {
        self.path.pop();
    }
}
