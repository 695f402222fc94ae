//! Per-document execution context threaded through every recipe.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::RecipeError;

/// Shared flag used to stop pipelines between stages.
///
/// Clones observe the same flag, so one token can cancel a whole batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Severity of a context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageLevel {
    Info,
    Warning,
}

/// A note left by a recipe for the run report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipe: Option<String>,
    pub level: MessageLevel,
    pub text: String,
}

/// Mutable state shared by all stages of one document's pipeline.
///
/// Recipes use it for counters, scratch values and messages, and to report
/// a stage failure through [`fail`](Self::fail). A context belongs to a
/// single document; parallel runs create one per document.
#[derive(Debug, Default)]
pub struct ExecutionContext {
    cycle: usize,
    recipe: Option<String>,
    counters: HashMap<String, u64>,
    values: HashMap<String, serde_json::Value>,
    messages: Vec<Message>,
    cancellation: CancellationToken,
    error: Option<RecipeError>,
}

impl ExecutionContext {
    /// Creates an empty context with its own cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty context observing `token`.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancellation: token,
            ..Self::default()
        }
    }

    /// The current pipeline cycle, starting at 1. Zero outside a pipeline.
    pub fn cycle(&self) -> usize {
        self.cycle
    }

    /// Name of the recipe currently running, if any.
    pub fn current_recipe(&self) -> Option<&str> {
        self.recipe.as_deref()
    }

    /// Adds one to `name` and returns the new value.
    pub fn increment(&mut self, name: &str) -> u64 {
        self.add(name, 1)
    }

    /// Adds `amount` to `name` and returns the new value.
    pub fn add(&mut self, name: &str, amount: u64) -> u64 {
        let counter = self.counters.entry(name.to_string()).or_insert(0);
        *counter += amount;
        *counter
    }

    /// Returns the value of counter `name` (zero if never touched).
    pub fn counter(&self, name: &str) -> u64 {
        self.counters.get(name).copied().unwrap_or(0)
    }

    pub fn counters(&self) -> &HashMap<String, u64> {
        &self.counters
    }

    /// Stores a scratch value visible to later stages.
    pub fn put_value(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.values.insert(key.into(), value);
    }

    pub fn value(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Records an informational message for the current recipe.
    pub fn info(&mut self, text: impl Into<String>) {
        self.push_message(MessageLevel::Info, text.into());
    }

    /// Records a warning for the current recipe.
    pub fn warn(&mut self, text: impl Into<String>) {
        self.push_message(MessageLevel::Warning, text.into());
    }

    fn push_message(&mut self, level: MessageLevel, text: String) {
        self.messages.push(Message {
            recipe: self.recipe.clone(),
            level,
            text,
        });
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Marks the running stage as failed.
    ///
    /// The pipeline discards that stage's output and stops. Only the first
    /// failure of a stage is kept.
    pub fn fail(&mut self, error: RecipeError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Returns `true` if the running stage has been marked as failed.
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    pub(crate) fn take_error(&mut self) -> Option<RecipeError> {
        self.error.take()
    }

    pub(crate) fn set_cycle(&mut self, cycle: usize) {
        self.cycle = cycle;
    }

    pub(crate) fn set_recipe(&mut self, recipe: Option<&str>) {
        self.recipe = recipe.map(str::to_string);
    }

    /// Clears counters, values, messages and any pending failure.
    ///
    /// The cancellation token is kept.
    pub fn reset(&mut self) {
        let cancellation = self.cancellation.clone();
        *self = Self::with_cancellation(cancellation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_counters() {
        let mut ctx = ExecutionContext::new();
        assert_eq!(ctx.counter("visits"), 0);
        assert_eq!(ctx.increment("visits"), 1);
        assert_eq!(ctx.add("visits", 4), 5);
        assert_eq!(ctx.counter("visits"), 5);
    }

    #[test]
    fn test_messages_carry_recipe() {
        let mut ctx = ExecutionContext::new();
        ctx.set_recipe(Some("add-plugin"));
        ctx.warn("no matching version");
        ctx.set_recipe(None);
        ctx.info("done");

        assert_eq!(
            ctx.messages(),
            &[
                Message {
                    recipe: Some("add-plugin".into()),
                    level: MessageLevel::Warning,
                    text: "no matching version".into(),
                },
                Message {
                    recipe: None,
                    level: MessageLevel::Info,
                    text: "done".into(),
                },
            ]
        );
    }

    #[test]
    fn test_first_failure_wins() {
        let mut ctx = ExecutionContext::new();
        ctx.fail(RecipeError::stage("a", "first"));
        ctx.fail(RecipeError::stage("a", "second"));
        assert!(ctx.has_failed());
        assert_eq!(ctx.take_error(), Some(RecipeError::stage("a", "first")));
        assert!(!ctx.has_failed());
    }

    #[test]
    fn test_cancellation_is_shared_and_survives_reset() {
        let token = CancellationToken::new();
        let mut ctx = ExecutionContext::with_cancellation(token.clone());
        ctx.increment("x");
        ctx.put_value("k", serde_json::json!(1));
        token.cancel();
        ctx.reset();

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.counter("x"), 0);
        assert!(ctx.value("k").is_none());
    }
}
