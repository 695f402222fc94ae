//! Lossless tree node definition.
//!
//! Every node keeps the verbatim text that precedes its first significant
//! character (`prefix`), so printing the tree reproduces the source exactly.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::{Marker, Markers, NodeType};

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a node or document.
///
/// Ids survive `with_*` rebuilds, so a recipe can recognise "the same"
/// node across tree versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeId(u64);

impl NodeId {
    /// Draws a fresh id.
    pub fn next() -> Self {
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Delimiter text that is not a node of its own (`{`, `}`, `:`).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Token {
    /// Verbatim text before the token.
    pub prefix: String,
    /// The token text itself.
    pub text: String,
}

impl Token {
    /// Creates a token with the given prefix and text.
    pub fn new(prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            text: text.into(),
        }
    }

    /// Creates a token with an empty prefix.
    pub fn bare(text: impl Into<String>) -> Self {
        Self::new(String::new(), text)
    }
}

/// Ordered container, optionally delimited.
///
/// The document root is a `Block` without delimiters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub open: Option<Token>,
    pub children: Vec<Node>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close: Option<Token>,
}

/// `name`, optional delimiter, `value`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<Token>,
    pub value: Node,
}

/// Two or more operands printed back to back.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Expression {
    pub operands: Vec<Node>,
}

/// Verbatim significant text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Literal {
    pub text: String,
}

/// Kind-specific payload of a [`Node`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum NodeKind {
    Block(Block),
    Declaration(Declaration),
    Expression(Expression),
    Literal(Literal),
}

impl NodeKind {
    /// Returns the tag of this kind.
    #[inline]
    pub const fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Block(_) => NodeType::Block,
            NodeKind::Declaration(_) => NodeType::Declaration,
            NodeKind::Expression(_) => NodeType::Expression,
            NodeKind::Literal(_) => NodeType::Literal,
        }
    }
}

struct NodeData {
    id: NodeId,
    prefix: String,
    markers: Markers,
    kind: NodeKind,
}

/// An immutable node of the lossless tree.
///
/// `Node` is a reference-counted handle: cloning it is cheap and shares the
/// whole subtree. Edits never happen in place; the `with_*` builders return
/// a new node (keeping the id) and leave the original untouched, so earlier
/// versions of a tree stay valid.
///
/// # Example
///
/// ```rust
/// use remold_tree::{Node, NodeType, Token};
///
/// let decl = Node::declaration(
///     Node::literal("a"),
///     Some(Token::bare(":")),
///     Node::literal("b").with_prefix("  "),
/// );
///
/// assert_eq!(decl.node_type(), NodeType::Declaration);
/// assert_eq!(decl.to_string(), "a:  b");
/// ```
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    /// Creates a node with a fresh id, an empty prefix and no markers.
    pub fn new(kind: NodeKind) -> Self {
        Self(Arc::new(NodeData {
            id: NodeId::next(),
            prefix: String::new(),
            markers: Markers::new(),
            kind,
        }))
    }

    /// Creates a `Block` node.
    pub fn block(open: Option<Token>, children: Vec<Node>, close: Option<Token>) -> Self {
        Self::new(NodeKind::Block(Block {
            open,
            children,
            close,
        }))
    }

    /// Creates a `Declaration` node.
    pub fn declaration(name: Node, delimiter: Option<Token>, value: Node) -> Self {
        Self::new(NodeKind::Declaration(Declaration {
            name,
            delimiter,
            value,
        }))
    }

    /// Creates an `Expression` node.
    pub fn expression(operands: Vec<Node>) -> Self {
        debug_assert!(operands.len() >= 2, "expression needs two or more operands");
        Self::new(NodeKind::Expression(Expression { operands }))
    }

    /// Creates a `Literal` node.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::new(NodeKind::Literal(Literal { text: text.into() }))
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.0.prefix
    }

    #[inline]
    pub fn markers(&self) -> &Markers {
        &self.0.markers
    }

    #[inline]
    pub fn kind(&self) -> &NodeKind {
        &self.0.kind
    }

    #[inline]
    pub fn node_type(&self) -> NodeType {
        self.0.kind.node_type()
    }

    pub fn as_block(&self) -> Option<&Block> {
        match &self.0.kind {
            NodeKind::Block(block) => Some(block),
            _ => None,
        }
    }

    pub fn as_declaration(&self) -> Option<&Declaration> {
        match &self.0.kind {
            NodeKind::Declaration(declaration) => Some(declaration),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&Expression> {
        match &self.0.kind {
            NodeKind::Expression(expression) => Some(expression),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match &self.0.kind {
            NodeKind::Literal(literal) => Some(literal),
            _ => None,
        }
    }

    /// Returns the text of a `Literal` node.
    pub fn text(&self) -> Option<&str> {
        self.as_literal().map(|literal| literal.text.as_str())
    }

    /// Iterates over the direct child nodes in print order.
    pub fn children(&self) -> Children<'_> {
        match &self.0.kind {
            NodeKind::Block(block) => Children::Slice(block.children.iter()),
            NodeKind::Expression(expression) => Children::Slice(expression.operands.iter()),
            NodeKind::Declaration(declaration) => {
                Children::Pair([&declaration.name, &declaration.value].into_iter())
            }
            NodeKind::Literal(_) => Children::Empty,
        }
    }

    /// Returns a copy of this node with a different prefix.
    pub fn with_prefix(&self, prefix: impl Into<String>) -> Self {
        self.rebuild(prefix.into(), self.0.markers.clone(), self.0.kind.clone())
    }

    /// Returns a copy of this node with a different marker set.
    pub fn with_markers(&self, markers: Markers) -> Self {
        self.rebuild(self.0.prefix.clone(), markers, self.0.kind.clone())
    }

    /// Returns a copy of this node with `marker` attached per its policy.
    pub fn with_marker<M: Marker>(&self, marker: M) -> Self {
        self.with_markers(self.0.markers.with_marker(marker))
    }

    /// Returns a copy of this node with a different payload.
    pub fn with_kind(&self, kind: NodeKind) -> Self {
        self.rebuild(self.0.prefix.clone(), self.0.markers.clone(), kind)
    }

    fn rebuild(&self, prefix: String, markers: Markers, kind: NodeKind) -> Self {
        Self(Arc::new(NodeData {
            id: self.0.id,
            prefix,
            markers,
            kind,
        }))
    }

    /// Returns true if both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Node::ptr_eq(self, other)
            || (self.0.prefix == other.0.prefix
                && self.0.kind == other.0.kind
                && self.0.markers == other.0.markers)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.0.id)
            .field("prefix", &self.0.prefix)
            .field("markers", &self.0.markers)
            .field("kind", &self.0.kind)
            .finish()
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let with_markers = !self.0.markers.is_empty();
        let len = if with_markers { 3 } else { 2 };
        let mut state = serializer.serialize_struct("Node", len)?;
        state.serialize_field("prefix", &self.0.prefix)?;
        if with_markers {
            state.serialize_field("markers", &self.0.markers)?;
        }
        state.serialize_field("kind", &self.0.kind)?;
        state.end()
    }
}

/// Iterator over the direct children of a node.
pub enum Children<'a> {
    Slice(std::slice::Iter<'a, Node>),
    Pair(std::array::IntoIter<&'a Node, 2>),
    Empty,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Children::Slice(iter) => iter.next(),
            Children::Pair(iter) => iter.next(),
            Children::Empty => None,
        }
    }
}
