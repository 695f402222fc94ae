//! Preconditions and the guard visitor that scopes a recipe to matching
//! documents.

use std::marker::PhantomData;

use remold_tree::{Cursor, Document, Marker, Node, Rewrite, Visitor};
use tracing::{debug, warn};

use crate::markers::SourceRole;
use crate::{ExecutionContext, PreconditionError, RecipeError};

/// A pure predicate over a document.
///
/// Implemented for closures of the matching shape.
pub trait Precondition: Send + Sync {
    fn check(&self, document: &Document, ctx: &ExecutionContext) -> Result<bool, PreconditionError>;
}

impl<F> Precondition for F
where
    F: Fn(&Document, &ExecutionContext) -> Result<bool, PreconditionError> + Send + Sync,
{
    fn check(&self, document: &Document, ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        self(document, ctx)
    }
}

/// True when the document carries `SourceRole` equal to `role`.
pub fn has_role(role: SourceRole) -> HasRole {
    HasRole(role)
}

#[derive(Debug, Clone)]
pub struct HasRole(SourceRole);

impl Precondition for HasRole {
    fn check(&self, document: &Document, _ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        Ok(document.markers().find_first::<SourceRole>() == Some(&self.0))
    }
}

/// True when the document carries at least one marker of type `M`.
pub fn has_marker<M: Marker>() -> HasMarker<M> {
    HasMarker(PhantomData)
}

#[derive(Debug)]
pub struct HasMarker<M>(PhantomData<fn() -> M>);

impl<M: Marker> Precondition for HasMarker<M> {
    fn check(&self, document: &Document, _ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        Ok(document.markers().contains::<M>())
    }
}

/// Negates `inner`. Evaluation errors pass through.
pub fn not<P: Precondition>(inner: P) -> Not<P> {
    Not(inner)
}

#[derive(Debug)]
pub struct Not<P>(P);

impl<P: Precondition> Precondition for Not<P> {
    fn check(&self, document: &Document, ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        self.0.check(document, ctx).map(|result| !result)
    }
}

/// True when every predicate holds. Stops at the first false or error.
pub fn all(predicates: Vec<Box<dyn Precondition>>) -> AllOf {
    AllOf(predicates)
}

pub struct AllOf(Vec<Box<dyn Precondition>>);

impl Precondition for AllOf {
    fn check(&self, document: &Document, ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        for predicate in &self.0 {
            if !predicate.check(document, ctx)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// True when any predicate holds. Stops at the first true or error.
pub fn any(predicates: Vec<Box<dyn Precondition>>) -> AnyOf {
    AnyOf(predicates)
}

pub struct AnyOf(Vec<Box<dyn Precondition>>);

impl Precondition for AnyOf {
    fn check(&self, document: &Document, ctx: &ExecutionContext) -> Result<bool, PreconditionError> {
        for predicate in &self.0 {
            if predicate.check(document, ctx)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

/// What a guard does when its precondition cannot be evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PreconditionFailure {
    /// Treat as false: leave the document unchanged and record a warning.
    #[default]
    Skip,
    /// Fail the stage with [`RecipeError::Precondition`].
    Fail,
}

/// Wraps `visitor` so it only runs on documents satisfying `precondition`.
///
/// The predicate is evaluated once, at the document root. When it is false
/// the document is returned unchanged and the wrapped visitor is never
/// invoked.
pub fn guard<P, V>(precondition: P, visitor: V) -> Guarded<P, V>
where
    P: Precondition,
    V: Visitor<ExecutionContext>,
{
    Guarded {
        precondition,
        visitor,
        on_failure: PreconditionFailure::default(),
        name: String::from("guard"),
    }
}

/// Visitor returned by [`guard`].
pub struct Guarded<P, V> {
    precondition: P,
    visitor: V,
    on_failure: PreconditionFailure,
    name: String,
}

impl<P, V> Guarded<P, V> {
    /// Sets the evaluation failure policy.
    pub fn on_failure(mut self, policy: PreconditionFailure) -> Self {
        self.on_failure = policy;
        self
    }

    /// Names the guarded recipe in logs and errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<P, V> Visitor<ExecutionContext> for Guarded<P, V>
where
    P: Precondition,
    V: Visitor<ExecutionContext>,
{
    fn visit_document(&mut self, document: &Document, ctx: &mut ExecutionContext) -> Rewrite<Document> {
        match self.precondition.check(document, ctx) {
            Ok(true) => self.visitor.visit_document(document, ctx),
            Ok(false) => {
                debug!(recipe = %self.name, "precondition not met, skipping document");
                Rewrite::Unchanged
            }
            Err(err) => match self.on_failure {
                PreconditionFailure::Skip => {
                    warn!("Skipping {}: precondition failed: {}", self.name, err);
                    ctx.warn(format!("precondition failed: {err}"));
                    Rewrite::Unchanged
                }
                PreconditionFailure::Fail => {
                    ctx.fail(RecipeError::Precondition {
                        recipe: self.name.clone(),
                        source: err,
                    });
                    Rewrite::Unchanged
                }
            },
        }
    }

    fn visit_node(&mut self, node: &Node, ctx: &mut ExecutionContext, cursor: &mut Cursor) -> Rewrite<Node> {
        self.visitor.visit_node(node, ctx, cursor)
    }
}
