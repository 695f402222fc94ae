//! Read-only traversal.
//!
//! `Inspector` is the query-side counterpart of [`Visitor`](super::Visitor):
//! it never produces a new tree and can stop early through `ControlFlow`.

use std::ops::ControlFlow;

use crate::{Node, NodeType};

/// Result type for inspector methods to control traversal.
///
/// - `ControlFlow::Continue(())` - continue visiting children
/// - `ControlFlow::Break(())` - stop traversal early
pub type InspectResult = ControlFlow<()>;

/// Read-only visitor over lossless tree nodes.
///
/// Same pre-order, depth-first, left-to-right order as the rewriting walk.
pub trait Inspector {
    #[inline]
    fn enter_node(&mut self, _node: &Node) -> InspectResult {
        ControlFlow::Continue(())
    }

    #[inline]
    fn exit_node(&mut self, _node: &Node) -> InspectResult {
        ControlFlow::Continue(())
    }

    #[inline]
    fn inspect_node(&mut self, node: &Node) -> InspectResult {
        inspect_node(self, node)
    }

    fn inspect_block(&mut self, node: &Node) -> InspectResult {
        inspect_children(self, node)
    }

    fn inspect_declaration(&mut self, node: &Node) -> InspectResult {
        inspect_children(self, node)
    }

    fn inspect_expression(&mut self, node: &Node) -> InspectResult {
        inspect_children(self, node)
    }

    fn inspect_literal(&mut self, _node: &Node) -> InspectResult {
        ControlFlow::Continue(()) // Leaf
    }
}

/// Enters `node`, dispatches on its kind, then exits.
pub fn inspect_node<I: Inspector + ?Sized>(inspector: &mut I, node: &Node) -> InspectResult {
    inspector.enter_node(node)?;

    match node.node_type() {
        NodeType::Block => inspector.inspect_block(node),
        NodeType::Declaration => inspector.inspect_declaration(node),
        NodeType::Expression => inspector.inspect_expression(node),
        NodeType::Literal => inspector.inspect_literal(node),
    }?;

    inspector.exit_node(node)
}

/// Inspects every direct child of `node` in print order.
#[inline]
pub fn inspect_children<I: Inspector + ?Sized>(inspector: &mut I, node: &Node) -> InspectResult {
    for child in node.children() {
        inspector.inspect_node(child)?;
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Token;

    struct LiteralCollector {
        texts: Vec<String>,
    }

    impl Inspector for LiteralCollector {
        fn inspect_literal(&mut self, node: &Node) -> InspectResult {
            self.texts.extend(node.text().map(str::to_string));
            ControlFlow::Continue(())
        }
    }

    struct FirstDeclaration {
        found: Option<String>,
        visited: usize,
    }

    impl Inspector for FirstDeclaration {
        fn enter_node(&mut self, _node: &Node) -> InspectResult {
            self.visited += 1;
            ControlFlow::Continue(())
        }

        fn inspect_declaration(&mut self, node: &Node) -> InspectResult {
            self.found = node
                .as_declaration()
                .and_then(|d| d.name.text())
                .map(str::to_string);
            ControlFlow::Break(())
        }
    }

    fn sample() -> Node {
        let decl = |name: &str, value: &str| {
            Node::declaration(
                Node::literal(name),
                Some(Token::bare(":")),
                Node::literal(value).with_prefix(" "),
            )
        };
        Node::block(None, vec![decl("a", "1"), decl("b", "2")], None)
    }

    #[test]
    fn test_collects_in_order() {
        let mut collector = LiteralCollector { texts: Vec::new() };
        let flow = inspect_node(&mut collector, &sample());
        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(collector.texts, vec!["a", "1", "b", "2"]);
    }

    #[test]
    fn test_early_termination() {
        let mut finder = FirstDeclaration {
            found: None,
            visited: 0,
        };
        let flow = inspect_node(&mut finder, &sample());
        assert_eq!(flow, ControlFlow::Break(()));
        assert_eq!(finder.found.as_deref(), Some("a"));
        assert_eq!(finder.visited, 2);
    }
}
