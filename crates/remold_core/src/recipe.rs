//! The recipe abstraction.

use remold_tree::Visitor;
use serde::Serialize;

use crate::precondition::{Precondition, PreconditionFailure};
use crate::ExecutionContext;

/// A declared, user-facing option of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeOption {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub example: Option<&'static str>,
    pub required: bool,
}

impl RecipeOption {
    /// Declares a required option.
    pub const fn required(
        name: &'static str,
        display_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            display_name,
            description,
            example: None,
            required: true,
        }
    }

    /// Declares an optional option.
    pub const fn optional(
        name: &'static str,
        display_name: &'static str,
        description: &'static str,
    ) -> Self {
        Self {
            name,
            display_name,
            description,
            example: None,
            required: false,
        }
    }

    pub const fn with_example(mut self, example: &'static str) -> Self {
        self.example = Some(example);
        self
    }
}

/// A named transformation applied to whole documents.
///
/// A recipe is configuration plus a factory for a fresh visitor. The
/// pipeline asks for a new visitor for every document and stage, so visitor
/// state never leaks between documents.
///
/// # Example
///
/// ```rust
/// use remold_core::{ExecutionContext, Recipe};
/// use remold_tree::{Cursor, Node, Rewrite, Visitor};
///
/// struct Upper;
///
/// impl Visitor<ExecutionContext> for Upper {
///     fn visit_literal(&mut self, node: &Node, _: &mut ExecutionContext, _: &mut Cursor) -> Rewrite<Node> {
///         match node.text() {
///             Some(text) if text != text.to_uppercase() => {
///                 Rewrite::Replaced(Node::literal(text.to_uppercase()).with_prefix(node.prefix()))
///             }
///             _ => Rewrite::Unchanged,
///         }
///     }
/// }
///
/// struct UpperCase;
///
/// impl Recipe for UpperCase {
///     fn name(&self) -> &str { "upper-case" }
///     fn display_name(&self) -> &str { "Upper case" }
///     fn description(&self) -> &str { "Upper-cases every literal." }
///     fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> { Box::new(Upper) }
/// }
/// ```
pub trait Recipe: Send + Sync {
    /// Stable identifier used in configuration.
    fn name(&self) -> &str;

    fn display_name(&self) -> &str;

    fn description(&self) -> &str;

    /// Options this recipe accepts.
    fn options(&self) -> Vec<RecipeOption> {
        Vec::new()
    }

    /// Scopes the recipe to matching documents. `None` applies it everywhere.
    fn precondition(&self) -> Option<Box<dyn Precondition>> {
        None
    }

    /// What happens when the precondition cannot be evaluated.
    fn precondition_failure(&self) -> PreconditionFailure {
        PreconditionFailure::Skip
    }

    /// Creates the visitor for one document.
    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_>;
}

/// Static description of a registered recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub options: Vec<RecipeOption>,
}
