//! # remold_core
//!
//! Recipe execution for remold.
//!
//! This crate provides:
//! - The per-document [`ExecutionContext`]
//! - Preconditions and the [`guard`](precondition::guard) visitor
//! - The [`Recipe`] trait, built-in recipes and the [`RecipeRegistry`]
//! - The cycle-aware [`Pipeline`]
//! - Style markers and their resolution
//! - Configuration loading, file discovery and parallel runs
//!
//! ## Example
//!
//! ```rust
//! use remold_core::recipes::ChangeValue;
//! use remold_core::{ExecutionContext, Pipeline};
//! use remold_parser::{Parser, SettingsParser};
//!
//! let document = SettingsParser::new().parse("a:  b\n").unwrap();
//! let pipeline = Pipeline::new().with_recipe(ChangeValue::new("a", "c").unwrap());
//!
//! let outcome = pipeline.run(&document, &mut ExecutionContext::new());
//! assert!(outcome.is_ok());
//! assert_eq!(outcome.document.to_string(), "a:  c\n");
//! ```

mod config;
pub mod context;
mod engine;
mod error;
pub mod file_finder;
pub mod markers;
mod pipeline;
pub mod precondition;
mod recipe;
pub mod recipes;
mod registry;
pub mod runner;
pub mod style;

pub use config::{CONFIG_FILE_NAMES, RecipeConfig, RunConfig};
pub use context::{CancellationToken, ExecutionContext, Message, MessageLevel};
pub use engine::{Remolder, RunSummary};
pub use error::{PipelineError, PreconditionError, RecipeError, RunError};
pub use pipeline::{Pipeline, PipelineOutcome, apply_recipe};
pub use precondition::{Precondition, PreconditionFailure};
pub use recipe::{Recipe, RecipeDescriptor, RecipeOption};
pub use registry::{RecipeFactory, RecipeRegistry};
pub use runner::{BatchReport, DocumentReport, run_documents};
