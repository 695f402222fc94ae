//! # remold_tree
//!
//! Lossless tree definitions for remold.
//!
//! A tree built by a parser keeps every character of its source: each node
//! stores the verbatim text preceding it (`prefix`), so printing the tree
//! reproduces the input byte for byte until something is edited.
//!
//! ## Architecture
//!
//! - Nodes are immutable, reference-counted handles; edits return new nodes
//!   and share every unchanged subtree
//! - Typed markers attach cross-cutting facts to nodes and documents
//! - The [`visitor`] module defines the rewriting and read-only traversals
//! - The [`printer`] turns a tree back into text
//!
//! ## Example
//!
//! ```rust
//! use remold_tree::{Document, Node, Token, print_document};
//!
//! let decl = Node::declaration(
//!     Node::literal("a"),
//!     Some(Token::bare(":")),
//!     Node::literal("b").with_prefix("  "),
//! );
//! let doc = Document::new(Node::block(None, vec![decl], None), "\n");
//!
//! assert_eq!(print_document(&doc), "a:  b\n");
//! ```

mod cursor;
mod document;
mod marker;
mod node;
mod node_type;
pub mod printer;
pub mod visitor;

pub use cursor::Cursor;
pub use document::Document;
pub use marker::{Marker, MarkerAny, MarkerPolicy, Markers};
pub use node::{Block, Children, Declaration, Expression, Literal, Node, NodeId, NodeKind, Token};
pub use node_type::NodeType;
pub use printer::{print_document, print_node};

// Re-export commonly used visitor items for convenience
pub use visitor::{Inspector, Rewrite, Visitor};
