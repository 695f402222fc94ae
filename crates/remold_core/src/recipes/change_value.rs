//! `change-value`: sets the value of declarations with a given key.

use remold_tree::visitor::walk_children;
use remold_tree::{Cursor, Declaration, Node, NodeKind, Rewrite, Visitor, print_node};
use serde::Deserialize;

use super::parse_options;
use crate::recipe::{Recipe, RecipeDescriptor, RecipeOption};
use crate::{ExecutionContext, RecipeError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChangeValueOptions {
    pub key: String,
    pub new_value: String,
}

/// Replaces the value of every `key: value` declaration named `key`.
///
/// Block values are left alone. The value's prefix and markers are kept.
#[derive(Debug, Clone)]
pub struct ChangeValue {
    options: ChangeValueOptions,
}

impl ChangeValue {
    pub const NAME: &'static str = "change-value";

    pub fn new(key: impl Into<String>, new_value: impl Into<String>) -> Result<Self, RecipeError> {
        Self::from_typed(ChangeValueOptions {
            key: key.into(),
            new_value: new_value.into(),
        })
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self, RecipeError> {
        Self::from_typed(parse_options(Self::NAME, options)?)
    }

    fn from_typed(options: ChangeValueOptions) -> Result<Self, RecipeError> {
        if options.key.trim().is_empty() {
            return Err(RecipeError::invalid_options(Self::NAME, "`key` must not be empty"));
        }
        if options.new_value.trim().is_empty()
            || options
                .new_value
                .contains(['\n', '\r', '{', '}', '#'])
        {
            return Err(RecipeError::invalid_options(
                Self::NAME,
                "`new_value` must be a non-empty single line without '{', '}' or '#'",
            ));
        }
        Ok(Self { options })
    }

    pub fn descriptor() -> RecipeDescriptor {
        RecipeDescriptor {
            name: Self::NAME,
            display_name: "Change value",
            description: "Sets the value of every declaration named `key`.",
            options: Self::option_list(),
        }
    }

    fn option_list() -> Vec<RecipeOption> {
        vec![
            RecipeOption::required("key", "Key", "Name of the declarations to change.")
                .with_example("rootProject"),
            RecipeOption::required("new_value", "New value", "Value to write.")
                .with_example("demo"),
        ]
    }
}

impl Recipe for ChangeValue {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Change value"
    }

    fn description(&self) -> &str {
        "Sets the value of every declaration named `key`."
    }

    fn options(&self) -> Vec<RecipeOption> {
        Self::option_list()
    }

    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> {
        Box::new(ChangeValueVisitor {
            options: &self.options,
        })
    }
}

struct ChangeValueVisitor<'a> {
    options: &'a ChangeValueOptions,
}

impl ChangeValueVisitor<'_> {
    /// Returns the declaration with its value replaced, or `None` if it
    /// does not apply or already holds the new value.
    fn set_value(&self, node: &Node) -> Option<Node> {
        let declaration = node.as_declaration()?;
        if declaration.name.text() != Some(self.options.key.as_str())
            || declaration.value.as_block().is_some()
        {
            return None;
        }

        let value = &declaration.value;
        let printed = print_node(value);
        if printed.strip_prefix(value.prefix()) == Some(self.options.new_value.as_str()) {
            return None;
        }

        let new_value = Node::literal(self.options.new_value.as_str())
            .with_prefix(value.prefix())
            .with_markers(value.markers().clone());
        Some(node.with_kind(NodeKind::Declaration(Declaration {
            name: declaration.name.clone(),
            delimiter: declaration.delimiter.clone(),
            value: new_value,
        })))
    }
}

impl Visitor<ExecutionContext> for ChangeValueVisitor<'_> {
    fn visit_declaration(
        &mut self,
        node: &Node,
        ctx: &mut ExecutionContext,
        cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        let walked = walk_children(self, node, ctx, cursor);
        let changed = walked.is_changed();
        let current = walked.unwrap_or(node.clone());

        match self.set_value(&current) {
            Some(updated) => {
                ctx.increment("change-value.changed");
                Rewrite::Replaced(updated)
            }
            None if changed => Rewrite::Replaced(current),
            None => Rewrite::Unchanged,
        }
    }
}
