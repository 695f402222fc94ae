//! Visitor protocol for lossless trees.
//!
//! # Overview
//!
//! - [`Visitor`] - rewriting traversal returning a [`Rewrite`] change signal
//! - [`walk_document`], [`walk_node`], [`walk_children`] - default traversal
//! - [`Inspector`] - read-only traversal with early termination
//!
//! Visitors receive the node, the caller's context and a [`Cursor`](crate::Cursor)
//! describing where in the tree they are. They never mutate the tree: a
//! replacement is returned, and the walk rebuilds only the ancestors of
//! replaced nodes.

mod inspect;
mod visit;
mod walk;

pub use inspect::{InspectResult, Inspector, inspect_children, inspect_node};
pub use visit::{Rewrite, Visitor};
pub use walk::{walk_children, walk_document, walk_node};
