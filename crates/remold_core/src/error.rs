//! Error types for recipes, pipelines and whole runs.

use std::path::PathBuf;

use thiserror::Error;

/// A precondition could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PreconditionError {
    pub message: String,
}

impl PreconditionError {
    /// Creates a new precondition error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Errors raised while building or applying a single recipe.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    /// The recipe's visitor reported a failure for the current document.
    #[error("Recipe '{recipe}' failed: {message}")]
    Stage { recipe: String, message: String },

    /// The guarding precondition failed under the `Fail` policy.
    #[error("Precondition of recipe '{recipe}' failed: {source}")]
    Precondition {
        recipe: String,
        #[source]
        source: PreconditionError,
    },

    /// Options supplied for the recipe did not deserialize or validate.
    #[error("Invalid options for recipe '{recipe}': {message}")]
    InvalidOptions { recipe: String, message: String },

    /// No recipe with this name is registered.
    #[error("Unknown recipe: {0}")]
    UnknownRecipe(String),
}

impl RecipeError {
    /// Creates a stage error.
    pub fn stage(recipe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            recipe: recipe.into(),
            message: message.into(),
        }
    }

    /// Creates an invalid options error.
    pub fn invalid_options(recipe: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidOptions {
            recipe: recipe.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the recipe this error belongs to.
    pub fn recipe(&self) -> &str {
        match self {
            Self::Stage { recipe, .. }
            | Self::Precondition { recipe, .. }
            | Self::InvalidOptions { recipe, .. } => recipe,
            Self::UnknownRecipe(name) => name,
        }
    }
}

/// Errors that stop a pipeline for one document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// A stage failed; later stages did not run.
    #[error(transparent)]
    Stage(#[from] RecipeError),

    /// The cancellation token fired between stages.
    ///
    /// `completed_stages` counts the stages of the last pass that finished.
    /// A cancellation seen at a cycle boundary counts the whole previous
    /// cycle; before the first cycle it is zero.
    #[error("Pipeline cancelled after {completed_stages} completed stage(s)")]
    Cancelled { completed_stages: usize },

    /// The printed output returned to an earlier state.
    #[error("Recipes keep undoing each other (cycle of length {cycle_length})")]
    CycleDetected { cycle_length: usize },
}

/// Errors surfaced by a whole run over files.
#[derive(Debug, Error)]
pub enum RunError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// File error.
    #[error("File error: {0}")]
    File(String),

    /// The source could not be parsed.
    #[error("Parse error in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: remold_parser::ParseError,
    },

    /// A recipe could not be built or a pipeline stopped.
    #[error(transparent)]
    Recipe(#[from] RecipeError),

    /// The pipeline stopped for this document.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The batch was aborted because another document failed first.
    #[error("Aborted after an earlier failure")]
    Aborted,
}

impl RunError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a file error.
    pub fn file(message: impl Into<String>) -> Self {
        Self::File(message.into())
    }

    /// Creates a parse error for `path`.
    pub fn parse(path: impl Into<PathBuf>, source: remold_parser::ParseError) -> Self {
        Self::Parse {
            path: path.into(),
            source,
        }
    }
}
