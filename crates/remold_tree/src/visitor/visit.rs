//! Visitor trait for rewriting trees.
//!
//! Each `visit_*` method has a default implementation that walks children,
//! so a visitor overrides only the node kinds it cares about. Mutation is
//! expressed through the returned [`Rewrite`] only; the visited tree is
//! never modified.
//!
//! # Example
//!
//! ```rust
//! use remold_tree::{Cursor, Document, Node, Token, print_document};
//! use remold_tree::visitor::{Rewrite, Visitor};
//!
//! /// Upper-cases every literal.
//! struct Shout;
//!
//! impl Visitor<()> for Shout {
//!     fn visit_literal(&mut self, node: &Node, _ctx: &mut (), _cursor: &mut Cursor) -> Rewrite<Node> {
//!         let text = node.text().unwrap_or_default();
//!         if text.chars().any(|c| c.is_lowercase()) {
//!             Rewrite::Replaced(Node::literal(text.to_uppercase()).with_prefix(node.prefix()))
//!         } else {
//!             Rewrite::Unchanged
//!         }
//!     }
//! }
//!
//! let decl = Node::declaration(
//!     Node::literal("a"),
//!     Some(Token::bare(":")),
//!     Node::literal("b").with_prefix(" "),
//! );
//! let doc = Document::new(Node::block(None, vec![decl], None), "\n");
//!
//! let out = Shout.visit_document(&doc, &mut ()).unwrap_or(doc);
//! assert_eq!(print_document(&out), "A: B\n");
//! ```

use crate::{Cursor, Document, Node};

use super::walk::{walk_children, walk_document, walk_node};

/// Change signal returned by every rewriting method.
///
/// `Unchanged` means the caller keeps the node it passed in, which lets
/// unchanged subtrees be shared between tree versions.
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Rewrite<T> {
    Unchanged,
    Replaced(T),
}

impl<T> Rewrite<T> {
    #[inline]
    pub fn is_changed(&self) -> bool {
        matches!(self, Rewrite::Replaced(_))
    }

    /// Maps the replacement, if any.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Rewrite<U> {
        match self {
            Rewrite::Unchanged => Rewrite::Unchanged,
            Rewrite::Replaced(value) => Rewrite::Replaced(f(value)),
        }
    }

    /// Returns the replacement, or `original` when unchanged.
    pub fn unwrap_or(self, original: T) -> T {
        match self {
            Rewrite::Unchanged => original,
            Rewrite::Replaced(value) => value,
        }
    }

    pub fn into_option(self) -> Option<T> {
        match self {
            Rewrite::Unchanged => None,
            Rewrite::Replaced(value) => Some(value),
        }
    }
}

impl<T> From<Option<T>> for Rewrite<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Rewrite::Replaced(value),
            None => Rewrite::Unchanged,
        }
    }
}

/// Visitor trait for rewriting lossless trees.
///
/// `C` is the context threaded through the whole traversal (for recipes it
/// is the execution context). The trait is object safe, so visitors can be
/// boxed and composed at run time.
///
/// # Traversal order
///
/// Pre-order, depth-first, left-to-right: a node's `enter_node` hook and
/// `visit_*` method run before any of its children are visited, and children
/// are visited in print order.
pub trait Visitor<C> {
    /// Visits a whole document. The default builds a fresh [`Cursor`] and
    /// walks the root node.
    fn visit_document(&mut self, document: &Document, ctx: &mut C) -> Rewrite<Document> {
        walk_document(self, document, ctx)
    }

    /// Called before a node is dispatched, with the node already on the cursor.
    #[inline]
    fn enter_node(&mut self, _node: &Node, _ctx: &mut C, _cursor: &Cursor) {}

    /// Called after a node and all its children have been visited.
    #[inline]
    fn exit_node(&mut self, _node: &Node, _ctx: &mut C, _cursor: &Cursor) {}

    /// Visits any node by dispatching to the kind-specific method.
    #[inline]
    fn visit_node(&mut self, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node> {
        walk_node(self, node, ctx, cursor)
    }

    fn visit_block(&mut self, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node> {
        walk_children(self, node, ctx, cursor)
    }

    fn visit_declaration(
        &mut self,
        node: &Node,
        ctx: &mut C,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        walk_children(self, node, ctx, cursor)
    }

    fn visit_expression(
        &mut self,
        node: &Node,
        ctx: &mut C,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        walk_children(self, node, ctx, cursor)
    }

    /// Leaf; unchanged by default.
    fn visit_literal(&mut self, _node: &Node, _ctx: &mut C, _cursor: &mut Cursor) -> Rewrite<Node> {
        Rewrite::Unchanged
    }
}

impl<C, V: Visitor<C> + ?Sized> Visitor<C> for Box<V> {
    fn visit_document(&mut self, document: &Document, ctx: &mut C) -> Rewrite<Document> {
        (**self).visit_document(document, ctx)
    }

    fn enter_node(&mut self, node: &Node, ctx: &mut C, cursor: &Cursor) {
        (**self).enter_node(node, ctx, cursor)
    }

    fn exit_node(&mut self, node: &Node, ctx: &mut C, cursor: &Cursor) {
        (**self).exit_node(node, ctx, cursor)
    }

    fn visit_node(&mut self, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node> {
        (**self).visit_node(node, ctx, cursor)
    }

    fn visit_block(&mut self, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node> {
        (**self).visit_block(node, ctx, cursor)
    }

    fn visit_declaration(
        &mut self,
        node: &Node,
        ctx: &mut C,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        (**self).visit_declaration(node, ctx, cursor)
    }

    fn visit_expression(
        &mut self,
        node: &Node,
        ctx: &mut C,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        (**self).visit_expression(node, ctx, cursor)
    }

    fn visit_literal(&mut self, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node> {
        (**self).visit_literal(node, ctx, cursor)
    }
}
