//! `find-text`: marks literals containing a piece of text.

use remold_tree::{Cursor, Node, Rewrite, Visitor};
use serde::Deserialize;

use super::parse_options;
use crate::markers::SearchResult;
use crate::recipe::{Recipe, RecipeDescriptor, RecipeOption};
use crate::{ExecutionContext, RecipeError};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindTextOptions {
    pub text: String,
}

/// Attaches a [`SearchResult`] to every literal containing `text`.
///
/// Only markers change, so the printed output is untouched.
#[derive(Debug, Clone)]
pub struct FindText {
    options: FindTextOptions,
}

impl FindText {
    pub const NAME: &'static str = "find-text";

    pub fn new(text: impl Into<String>) -> Result<Self, RecipeError> {
        Self::from_typed(FindTextOptions { text: text.into() })
    }

    pub fn from_options(options: &serde_json::Value) -> Result<Self, RecipeError> {
        Self::from_typed(parse_options(Self::NAME, options)?)
    }

    fn from_typed(options: FindTextOptions) -> Result<Self, RecipeError> {
        if options.text.is_empty() {
            return Err(RecipeError::invalid_options(Self::NAME, "`text` must not be empty"));
        }
        Ok(Self { options })
    }

    pub fn descriptor() -> RecipeDescriptor {
        RecipeDescriptor {
            name: Self::NAME,
            display_name: "Find text",
            description: "Marks every literal that contains `text`.",
            options: Self::option_list(),
        }
    }

    fn option_list() -> Vec<RecipeOption> {
        vec![RecipeOption::required("text", "Text", "Text to search for.").with_example("SNAPSHOT")]
    }
}

impl Recipe for FindText {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Find text"
    }

    fn description(&self) -> &str {
        "Marks every literal that contains `text`."
    }

    fn options(&self) -> Vec<RecipeOption> {
        Self::option_list()
    }

    fn visitor(&self) -> Box<dyn Visitor<ExecutionContext> + '_> {
        Box::new(FindTextVisitor {
            text: &self.options.text,
        })
    }
}

struct FindTextVisitor<'a> {
    text: &'a str,
}

impl Visitor<ExecutionContext> for FindTextVisitor<'_> {
    fn visit_literal(
        &mut self,
        node: &Node,
        ctx: &mut ExecutionContext,
        _cursor: &mut Cursor,
    ) -> Rewrite<Node> {
        let Some(literal) = node.text() else {
            return Rewrite::Unchanged;
        };
        if !literal.contains(self.text) {
            return Rewrite::Unchanged;
        }
        let already_marked = node
            .markers()
            .find_all::<SearchResult>()
            .any(|result| result.text == self.text);
        if already_marked {
            return Rewrite::Unchanged;
        }

        ctx.increment("find-text.matches");
        ctx.info(format!("found '{}' in '{}'", self.text, literal));
        Rewrite::Replaced(node.with_marker(SearchResult::new(self.text)))
    }
}
