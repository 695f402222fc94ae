//! Sequential recipe application with cycle handling.

use std::sync::Arc;

use blake3::Hash;
use remold_tree::{Document, Rewrite, Visitor, print_document};
use tracing::{debug, warn};

use crate::precondition::guard;
use crate::{ExecutionContext, PipelineError, Recipe};

const DEFAULT_MAX_CYCLES: usize = 3;

/// Result of running a pipeline on one document.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// The last fully produced document. On failure this is the output of
    /// the last successful stage.
    pub document: Document,
    /// Whether any stage replaced the document.
    pub changed: bool,
    /// Number of cycles started.
    pub cycles: usize,
    /// `true` when a whole cycle completed without changes.
    pub converged: bool,
    pub error: Option<PipelineError>,
}

impl PipelineOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// An ordered list of recipes folded over a document.
///
/// Every stage sees the previous stage's output. The whole list is repeated
/// while it keeps changing the document, up to `max_cycles` times.
#[derive(Clone)]
pub struct Pipeline {
    recipes: Vec<Arc<dyn Recipe>>,
    max_cycles: usize,
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            recipes: Vec::new(),
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }

    /// Appends a recipe as the last stage.
    pub fn with_recipe(mut self, recipe: impl Recipe + 'static) -> Self {
        self.recipes.push(Arc::new(recipe));
        self
    }

    pub fn push(&mut self, recipe: Arc<dyn Recipe>) {
        self.recipes.push(recipe);
    }

    /// Sets the maximum number of cycles. Values below one are raised to one.
    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles.max(1);
        self
    }

    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    pub fn recipes(&self) -> &[Arc<dyn Recipe>] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    /// Runs every stage over `document` until nothing changes.
    ///
    /// The printed output of every cycle is hashed; returning to an earlier
    /// output stops the run with [`PipelineError::CycleDetected`]. A cycle
    /// that changes only markers ends the run.
    pub fn run(&self, document: &Document, ctx: &mut ExecutionContext) -> PipelineOutcome {
        let mut current = document.clone();
        let mut changed = false;
        let mut history: Vec<Hash> = vec![hash_document(&current)];
        let mut cycles = 0;

        while cycles < self.max_cycles {
            if ctx.is_cancelled() {
                let completed_stages = if cycles == 0 { 0 } else { self.recipes.len() };
                return PipelineOutcome {
                    document: current,
                    changed,
                    cycles,
                    converged: false,
                    error: Some(PipelineError::Cancelled { completed_stages }),
                };
            }

            cycles += 1;
            ctx.set_cycle(cycles);
            let pass = self.run_pass(&current, ctx);
            changed |= pass.changed;
            current = pass.document;

            if let Some(error) = pass.error {
                return PipelineOutcome {
                    document: current,
                    changed,
                    cycles,
                    converged: false,
                    error: Some(error),
                };
            }
            if !pass.changed {
                return self.converged(current, changed, cycles);
            }

            let current_hash = hash_document(&current);
            if history.last() == Some(&current_hash) {
                return self.converged(current, changed, cycles);
            }
            if let Some(prev_idx) = history.iter().position(|h| *h == current_hash) {
                let cycle_length = history.len() - prev_idx;
                warn!("Recipes cycle with length {} after {} cycles", cycle_length, cycles);
                return PipelineOutcome {
                    document: current,
                    changed,
                    cycles,
                    converged: false,
                    error: Some(PipelineError::CycleDetected { cycle_length }),
                };
            }
            history.push(current_hash);
        }

        debug!(cycles, "stopped at the cycle limit");
        PipelineOutcome {
            document: current,
            changed,
            cycles,
            converged: false,
            error: None,
        }
    }

    fn converged(&self, document: Document, changed: bool, cycles: usize) -> PipelineOutcome {
        debug!(cycles, changed, "pipeline converged");
        PipelineOutcome {
            document,
            changed,
            cycles,
            converged: true,
            error: None,
        }
    }

    fn run_pass(&self, input: &Document, ctx: &mut ExecutionContext) -> Pass {
        let mut current = input.clone();
        let mut changed = false;

        for (index, recipe) in self.recipes.iter().enumerate() {
            if ctx.is_cancelled() {
                return Pass {
                    document: current,
                    changed,
                    error: Some(PipelineError::Cancelled {
                        completed_stages: index,
                    }),
                };
            }

            debug!(recipe = recipe.name(), cycle = ctx.cycle(), "running stage");
            ctx.set_recipe(Some(recipe.name()));
            let result = apply_recipe(recipe.as_ref(), &current, ctx);
            ctx.set_recipe(None);

            if let Some(error) = ctx.take_error() {
                warn!("Stage {} failed: {}", recipe.name(), error);
                return Pass {
                    document: current,
                    changed,
                    error: Some(PipelineError::Stage(error)),
                };
            }
            if let Rewrite::Replaced(document) = result {
                current = document;
                changed = true;
            }
        }

        Pass {
            document: current,
            changed,
            error: None,
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

struct Pass {
    document: Document,
    changed: bool,
    error: Option<PipelineError>,
}

/// Applies one recipe, guarded by its precondition if it declares one.
pub fn apply_recipe(
    recipe: &dyn Recipe,
    document: &Document,
    ctx: &mut ExecutionContext,
) -> Rewrite<Document> {
    let visitor = recipe.visitor();
    match recipe.precondition() {
        Some(precondition) => {
            let check = move |document: &Document, ctx: &ExecutionContext| {
                precondition.check(document, ctx)
            };
            guard(check, visitor)
                .named(recipe.name())
                .on_failure(recipe.precondition_failure())
                .visit_document(document, ctx)
        }
        None => {
            let mut visitor = visitor;
            visitor.visit_document(document, ctx)
        }
    }
}

fn hash_document(document: &Document) -> Hash {
    blake3::hash(print_document(document).as_bytes())
}
