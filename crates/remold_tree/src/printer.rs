//! Printer: turns a tree back into text.
//!
//! Each node contributes its prefix followed by its own significant text,
//! in pre-order. A document without edits prints back to its exact source.

use std::fmt;

use crate::{Document, Node, NodeKind, Token};

/// Prints a whole document, including the trailing `eof` text.
pub fn print_document(document: &Document) -> String {
    let mut out = String::with_capacity(document.source_len());
    write_node(&mut out, document.root());
    out.push_str(document.eof());
    out
}

/// Prints a single subtree.
pub fn print_node(node: &Node) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_token(out: &mut String, token: Option<&Token>) {
    if let Some(token) = token {
        out.push_str(&token.prefix);
        out.push_str(&token.text);
    }
}

fn write_node(out: &mut String, node: &Node) {
    out.push_str(node.prefix());
    match node.kind() {
        NodeKind::Block(block) => {
            write_token(out, block.open.as_ref());
            for child in &block.children {
                write_node(out, child);
            }
            write_token(out, block.close.as_ref());
        }
        NodeKind::Declaration(declaration) => {
            write_node(out, &declaration.name);
            write_token(out, declaration.delimiter.as_ref());
            write_node(out, &declaration.value);
        }
        NodeKind::Expression(expression) => {
            for operand in &expression.operands {
                write_node(out, operand);
            }
        }
        NodeKind::Literal(literal) => out.push_str(&literal.text),
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_node(self))
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&print_document(self))
    }
}
