//! `auto-format`: normalizes indentation, blank lines and `:` spacing.

use remold_tree::visitor::{walk_document, walk_node};
use remold_tree::{Block, Cursor, Declaration, Document, Node, NodeKind, Rewrite, Token, Visitor};

use super::parse_options;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::style::{BlankLinesStyle, SpacesStyle, Styles, TabsAndIndentsStyle};
use crate::{ExecutionContext, RecipeError};

/// Reformats whitespace according to the document's styles.
///
/// Only whitespace owned by line-leading nodes, closing braces, `:`
/// delimiters and the end of the file is touched. Comments keep their text
/// but are re-indented with the line they precede.
#[derive(Debug, Clone, Default)]
pub struct AutoFormat;

impl AutoFormat {
    pub const NAME: &'static str = "auto-format";

    pub fn new() -> Self {
        Self
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self, RecipeError> {
        let _: serde_json::Map<String, serde_json::Value> = parse_options(Self::NAME, options)?;
        if options.as_object().is_some_and(|map| !map.is_empty()) {
            return Err(RecipeError::invalid_options(Self::NAME, "takes no options"));
        }
        Ok(Self)
    }

    pub fn descriptor() -> RecipeDescriptor {
        RecipeDescriptor {
            name: Self::NAME,
            display_name: "Format whitespace",
            description: "Normalizes indentation, blank lines and spacing around `:`.",
            options: Vec::new(),
        }
    }
}

impl Recipe for AutoFormat {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Format whitespace"
    }

    fn description(&self) -> &str {
        "Normalizes indentation, blank lines and spacing around `:`."
    }

    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> {
        Box::new(AutoFormatVisitor::default())
    }
}

struct Resolved {
    blank_lines: BlankLinesStyle,
    tabs_and_indents: TabsAndIndentsStyle,
    spaces: SpacesStyle,
}

impl Resolved {
    fn from_document(document: &Document) -> Self {
        let mut styles = Styles::for_document(document);
        Self {
            blank_lines: styles.get(),
            tabs_and_indents: styles.get(),
            spaces: styles.get(),
        }
    }
}

#[derive(Default)]
struct AutoFormatVisitor {
    styles: Option<Resolved>,
}

impl AutoFormatVisitor {
    fn styles(&mut self, document: &Document) -> &Resolved {
        self.styles
            .get_or_insert_with(|| Resolved::from_document(document))
    }
}

impl Visitor<ExecutionContext> for AutoFormatVisitor {
    fn visit_document(&mut self, document: &Document, ctx: &mut ExecutionContext) -> Rewrite<Document> {
        let walked = walk_document(self, document, ctx);
        let changed = walked.is_changed();
        let current = walked.unwrap_or(document.clone());

        let keep = self.styles(document).blank_lines.keep_maximum;
        let eof = normalize_lines(current.eof(), "", keep);
        if eof != current.eof() {
            Rewrite::Replaced(current.with_eof(eof))
        } else if changed {
            Rewrite::Replaced(current)
        } else {
            Rewrite::Unchanged
        }
    }

    fn visit_node(&mut self, node: &Node, ctx: &mut ExecutionContext, cursor: &mut Cursor) -> Rewrite<Node> {
        self.styles(cursor.document());
        let depth = cursor
            .path()
            .iter()
            .filter(|ancestor| ancestor.as_block().is_some_and(|block| block.open.is_some()))
            .count();

        let walked = walk_node(self, node, ctx, cursor);
        let changed = walked.is_changed();
        let current = walked.unwrap_or(node.clone());

        let Some(styles) = self.styles.as_ref() else {
            return if changed { Rewrite::Replaced(current) } else { Rewrite::Unchanged };
        };
        match format_own(styles, &current, depth) {
            Some(formatted) => {
                ctx.increment("auto-format.nodes");
                Rewrite::Replaced(formatted)
            }
            None if changed => Rewrite::Replaced(current),
            None => Rewrite::Unchanged,
        }
    }
}

/// Formats the whitespace `node` owns directly; children are handled by
/// their own visits.
fn format_own(styles: &Resolved, node: &Node, depth: usize) -> Option<Node> {
    let keep = styles.blank_lines.keep_maximum;
    let indent = styles.tabs_and_indents.indent(depth);

    let mut formatted: Option<Node> = None;
    if node.prefix().contains('\n') {
        let prefix = normalize_lines(node.prefix(), &indent, keep);
        if prefix != node.prefix() {
            formatted = Some(node.with_prefix(prefix));
        }
    }

    let base = formatted.as_ref().unwrap_or(node);
    let kind = match base.kind() {
        NodeKind::Block(block) => {
            let close = block.close.as_ref().filter(|close| close.prefix.contains('\n'));
            close.and_then(|close| {
                let prefix = normalize_lines(&close.prefix, &indent, keep);
                (prefix != close.prefix).then(|| {
                    NodeKind::Block(Block {
                        open: block.open.clone(),
                        children: block.children.clone(),
                        close: Some(Token::new(prefix, close.text.clone())),
                    })
                })
            })
        }
        NodeKind::Declaration(declaration) => format_colon(&styles.spaces, declaration),
        NodeKind::Expression(_) | NodeKind::Literal(_) => None,
    };

    match kind {
        Some(kind) => Some(base.with_kind(kind)),
        None => formatted,
    }
}

fn format_colon(spaces: &SpacesStyle, declaration: &Declaration) -> Option<NodeKind> {
    let colon = declaration.delimiter.as_ref().filter(|token| token.text == ":")?;

    let before = if spaces.before_colon { " " } else { "" };
    let after = if spaces.after_colon { " " } else { "" };
    let colon_ok = colon.prefix.contains('\n') || colon.prefix == before;
    let value_prefix = declaration.value.prefix();
    let value_ok = value_prefix.contains('\n') || value_prefix == after;
    if colon_ok && value_ok {
        return None;
    }

    Some(NodeKind::Declaration(Declaration {
        name: declaration.name.clone(),
        delimiter: Some(if colon_ok {
            colon.clone()
        } else {
            Token::new(before, colon.text.clone())
        }),
        value: if value_ok {
            declaration.value.clone()
        } else {
            declaration.value.with_prefix(after)
        },
    }))
}

/// Rewrites the line structure of whitespace-and-comment text.
///
/// The text before the first newline belongs to the previous line and is
/// kept. Blank lines are emptied and at most `keep_maximum` consecutive ones
/// survive. Comment lines and the final line get `indent`.
fn normalize_lines(text: &str, indent: &str, keep_maximum: usize) -> String {
    let segments: Vec<&str> = text.split('\n').collect();
    if segments.len() < 2 {
        return text.to_string();
    }
    let last = segments.len() - 1;

    let mut lines: Vec<String> = Vec::with_capacity(segments.len());
    lines.push(segments[0].to_string());
    let mut blank_run = 0;
    for segment in &segments[1..last] {
        let carriage = if segment.ends_with('\r') { "\r" } else { "" };
        if segment.trim().is_empty() {
            blank_run += 1;
            if blank_run <= keep_maximum {
                lines.push(carriage.to_string());
            }
        } else {
            blank_run = 0;
            lines.push(format!("{indent}{}", segment.trim_start()));
        }
    }
    lines.push(indent.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use remold_parser::{Parser, SettingsParser};
    use rstest::rstest;

    use crate::pipeline::{Pipeline, apply_recipe};

    fn format(source: &str) -> String {
        format_document(SettingsParser::new().parse(source).unwrap())
    }

    fn format_document(document: Document) -> String {
        let mut ctx = ExecutionContext::new();
        apply_recipe(&AutoFormat::new(), &document, &mut ctx)
            .unwrap_or(document)
            .to_string()
    }

    #[rstest]
    #[case::single_newline("\n", "    ", 2, "\n    ")]
    #[case::keeps_two_blank_lines("\n\n\n", "", 2, "\n\n\n")]
    #[case::drops_extra_blank_lines("\n\n\n\n\n", "", 2, "\n\n\n")]
    #[case::empties_blank_lines("\n   \n  ", "  ", 2, "\n\n  ")]
    #[case::trailing_comment_kept("  # same line\n  ", "", 2, "  # same line\n")]
    #[case::comment_reindented("\n      # note\n  ", "  ", 2, "\n  # note\n  ")]
    #[case::blank_run_resets_after_comment("\n\n# a\n\n\nx", "", 1, "\n\n# a\n\n")]
    #[case::no_newline("   ", "    ", 2, "   ")]
    #[case::crlf("\r\n\r\n  ", "", 2, "\r\n\r\n")]
    fn test_normalize_lines(
        #[case] text: &str,
        #[case] indent: &str,
        #[case] keep: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(normalize_lines(text, indent, keep), expected);
    }

    #[test]
    fn test_reindents_blocks() {
        let source = "plugins {\nid: a version 1\n      id: b version 2\n        }\n";
        assert_eq!(
            format(source),
            "plugins {\n    id: a version 1\n    id: b version 2\n}\n"
        );
    }

    #[test]
    fn test_nested_blocks_and_comments() {
        let source = "pluginManagement {\n  repositories {\n  # portal\n  gradlePluginPortal\n  }\n}\n";
        assert_eq!(
            format(source),
            "pluginManagement {\n    repositories {\n        # portal\n        gradlePluginPortal\n    }\n}\n"
        );
    }

    #[test]
    fn test_colon_spacing() {
        assert_eq!(format("a :b\nc:    d\n"), "a: b\nc: d\n");
    }

    #[test]
    fn test_limits_blank_lines_between_items_and_at_eof() {
        assert_eq!(format("a: 1\n\n\n\n\nb: 2\n\n\n\n\n"), "a: 1\n\n\nb: 2\n\n\n");
    }

    #[test]
    fn test_uses_document_styles() {
        let document = SettingsParser::new()
            .parse("a :b\nblock {\n  c: d\n\n\nx: y\n}\n")
            .unwrap()
            .with_marker(TabsAndIndentsStyle {
                use_tab_character: true,
                indent_size: 4,
            })
            .with_marker(SpacesStyle {
                before_colon: true,
                after_colon: false,
            })
            .with_marker(BlankLinesStyle { keep_maximum: 0 });

        assert_eq!(
            format_document(document),
            "a :b\nblock {\n\tc :d\n\tx :y\n}\n"
        );
    }

    #[test]
    fn test_inline_content_untouched() {
        let source = "a: 1\nplugins { id: x version 1 }\n";
        assert_eq!(format(source), source);
    }

    #[test]
    fn test_formatted_output_is_unchanged() {
        let document = SettingsParser::new()
            .parse("plugins {\n    id: a version 1\n}\n")
            .unwrap();
        let mut ctx = ExecutionContext::new();
        assert!(!apply_recipe(&AutoFormat::new(), &document, &mut ctx).is_changed());
        assert_eq!(ctx.counter("auto-format.nodes"), 0);
    }

    #[test]
    fn test_pipeline_idempotence() {
        let pipeline = Pipeline::new().with_recipe(AutoFormat::new());
        let document = SettingsParser::new()
            .parse("a:b\n\n\n\n\nblock {\n        c :  d\n  nested {\n x: 1\n    }\n}\n")
            .unwrap();
        let first = pipeline.run(&document, &mut ExecutionContext::new());
        let second = pipeline.run(&first.document, &mut ExecutionContext::new());

        assert_eq!(
            first.document.to_string(),
            "a: b\n\n\nblock {\n    c: d\n    nested {\n        x: 1\n    }\n}\n"
        );
        assert!(first.converged);
        assert!(!second.changed);
    }

    #[rstest]
    #[case::null(serde_json::Value::Null, true)]
    #[case::empty(serde_json::json!({}), true)]
    #[case::unexpected(serde_json::json!({ "indent": 2 }), false)]
    fn test_options(#[case] options: serde_json::Value, #[case] ok: bool) {
        assert_eq!(AutoFormat::from_options(&options).is_ok(), ok);
    }
}
