//! Walk functions for rewriting traversal.
//!
//! These implement the default structural traversal used by the `Visitor`
//! trait. A parent is rebuilt only when at least one child was replaced;
//! every unchanged child is shared with the original tree.

use crate::{Block, Cursor, Declaration, Document, Expression, Node, NodeKind, NodeType};

use super::visit::{Rewrite, Visitor};

/// Walks a document's root with a fresh cursor.
pub fn walk_document<V, C>(visitor: &mut V, document: &Document, ctx: &mut C) -> Rewrite<Document>
where
    V: Visitor<C> + ?Sized,
{
    let mut cursor = Cursor::new(document);
    visitor
        .visit_node(document.root(), ctx, &mut cursor)
        .map(|root| document.with_root(root))
}

/// Walks a node by dispatching to the kind-specific visitor method.
///
/// This function:
/// 1. Pushes the node onto the cursor and calls `enter_node`
/// 2. Dispatches to the `visit_*` method for the node's kind
/// 3. Calls `exit_node` and pops the cursor
pub fn walk_node<V, C>(visitor: &mut V, node: &Node, ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Node>
where
    V: Visitor<C> + ?Sized,
{
    cursor.push(node.clone());
    visitor.enter_node(node, ctx, cursor);

    let result = match node.node_type() {
        NodeType::Block => visitor.visit_block(node, ctx, cursor),
        NodeType::Declaration => visitor.visit_declaration(node, ctx, cursor),
        NodeType::Expression => visitor.visit_expression(node, ctx, cursor),
        NodeType::Literal => visitor.visit_literal(node, ctx, cursor),
    };

    visitor.exit_node(node, ctx, cursor);
    cursor.pop();
    result
}

/// Walks all children of a node, rebuilding it if any child changed.
///
/// The rebuilt node keeps the id, prefix, markers and delimiter tokens of
/// the original.
pub fn walk_children<V, C>(
    visitor: &mut V,
    node: &Node,
    ctx: &mut C,
    cursor: &mut Cursor,
) -> Rewrite<Node>
where
    V: Visitor<C> + ?Sized,
{
    match node.kind() {
        NodeKind::Block(block) => walk_all(visitor, &block.children, ctx, cursor).map(|children| {
            node.with_kind(NodeKind::Block(Block {
                open: block.open.clone(),
                children,
                close: block.close.clone(),
            }))
        }),
        NodeKind::Declaration(declaration) => {
            let name = visitor.visit_node(&declaration.name, ctx, cursor);
            let value = visitor.visit_node(&declaration.value, ctx, cursor);
            if !name.is_changed() && !value.is_changed() {
                return Rewrite::Unchanged;
            }
            Rewrite::Replaced(node.with_kind(NodeKind::Declaration(Declaration {
                name: name.unwrap_or(declaration.name.clone()),
                delimiter: declaration.delimiter.clone(),
                value: value.unwrap_or(declaration.value.clone()),
            })))
        }
        NodeKind::Expression(expression) => walk_all(visitor, &expression.operands, ctx, cursor)
            .map(|operands| node.with_kind(NodeKind::Expression(Expression { operands }))),
        NodeKind::Literal(_) => Rewrite::Unchanged,
    }
}

/// Visits every node in `nodes`, returning a new list only if one changed.
fn walk_all<V, C>(visitor: &mut V, nodes: &[Node], ctx: &mut C, cursor: &mut Cursor) -> Rewrite<Vec<Node>>
where
    V: Visitor<C> + ?Sized,
{
    let mut rebuilt: Option<Vec<Node>> = None;

    for (index, child) in nodes.iter().enumerate() {
        match visitor.visit_node(child, ctx, cursor) {
            Rewrite::Replaced(replacement) => {
                rebuilt
                    .get_or_insert_with(|| nodes[..index].to_vec())
                    .push(replacement);
            }
            Rewrite::Unchanged => {
                if let Some(list) = rebuilt.as_mut() {
                    list.push(child.clone());
                }
            }
        }
    }

    rebuilt.into()
}
