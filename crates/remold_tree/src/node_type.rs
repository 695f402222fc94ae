//! Node type tags for the lossless tree.

use serde::{Deserialize, Serialize};

/// Kind tag of a [`Node`](crate::Node).
///
/// Every [`NodeKind`](crate::NodeKind) variant maps to exactly one tag. Tags
/// are what cursor lookups and dispatch match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum NodeType {
    /// Ordered container, optionally delimited (`{ ... }`).
    Block,
    /// Named declaration: `name`, optional delimiter, value.
    Declaration,
    /// Sequence of two or more operands on one line.
    Expression,
    /// Leaf carrying verbatim significant text.
    Literal,
}

impl NodeType {
    /// Returns true if nodes of this type can contain other nodes.
    #[inline]
    pub const fn is_parent(&self) -> bool {
        matches!(
            self,
            NodeType::Block | NodeType::Declaration | NodeType::Expression
        )
    }

    /// Returns true if this node type is a leaf.
    #[inline]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, NodeType::Literal)
    }
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeType::Block => "Block",
            NodeType::Declaration => "Declaration",
            NodeType::Expression => "Expression",
            NodeType::Literal => "Literal",
        };
        write!(f, "{}", name)
    }
}
