//! Round-trip and edit scenarios through the settings parser.

use pretty_assertions::assert_eq;
use remold_parser::{OffsetError, Parser, SettingsParser};
use remold_tree::visitor::{Rewrite, Visitor};
use remold_tree::{Cursor, Node, print_document};

/// Sets the value of every declaration named `key`, keeping prefixes.
struct SetValue {
    key: &'static str,
    value: &'static str,
}

impl Visitor<()> for SetValue {
    fn visit_declaration(&mut self, node: &Node, _ctx: &mut (), _cursor: &mut Cursor) -> Rewrite<Node> {
        let Some(decl) = node.as_declaration() else {
            return Rewrite::Unchanged;
        };
        if decl.name.text() != Some(self.key) || decl.value.text() == Some(self.value) {
            return Rewrite::Unchanged;
        }
        let value = Node::literal(self.value).with_prefix(decl.value.prefix());
        let mut updated = decl.clone();
        updated.value = value;
        Rewrite::Replaced(node.with_kind(remold_tree::NodeKind::Declaration(updated)))
    }
}

#[test]
fn test_value_edit_keeps_spacing() {
    let doc = SettingsParser::new().parse("a:  b\n").unwrap();
    assert_eq!(print_document(&doc), "a:  b\n");

    let edited = SetValue { key: "a", value: "c" }
        .visit_document(&doc, &mut ())
        .unwrap_or(doc.clone());
    assert_eq!(print_document(&edited), "a:  c\n");

    // The original version is untouched.
    assert_eq!(print_document(&doc), "a:  b\n");
}

#[test]
fn test_nested_edit_leaves_everything_else_identical() {
    let source = "\
# Project settings
rootProject:   demo   # keep me

pluginManagement {
\trepositories {
\t\tgradlePluginPortal
\t}
}

plugins {
    id: com.example.tool version 1.2.0
}
";
    let doc = SettingsParser::new().parse(source).unwrap();
    let edited = SetValue {
        key: "rootProject",
        value: "renamed",
    }
    .visit_document(&doc, &mut ())
    .unwrap_or(doc);

    assert_eq!(
        print_document(&edited),
        source.replace("rootProject:   demo", "rootProject:   renamed")
    );
}

#[test]
fn test_noop_visitor_is_identity() {
    struct Noop;
    impl Visitor<()> for Noop {}

    let source = "a { b: c d }\n# tail";
    let doc = SettingsParser::new().parse(source).unwrap();
    let result = Noop.visit_document(&doc, &mut ());

    assert!(!result.is_changed());
    assert_eq!(print_document(&doc), source);
}

#[test]
fn test_stale_offset_after_larger_prefix() {
    use std::io::Read;

    let mut reader = remold_parser::FormatPreservingReader::new("alpha beta gamma".as_bytes());
    let mut sink = Vec::new();
    reader.read_to_end(&mut sink).unwrap();

    assert_eq!(reader.prefix_between(10, 11).unwrap(), " ");
    assert_eq!(
        reader.prefix_between(5, 6),
        Err(OffsetError::StaleOffset {
            requested: 5,
            retained_from: 10,
        })
    );
}
