//! Builds recipes by name from JSON options.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::config::RecipeConfig;
use crate::recipe::{Recipe, RecipeDescriptor};
use crate::recipes::{AddPlugin, AutoFormat, ChangeValue, FindText};
use crate::{Pipeline, RecipeError};

/// Builds a recipe from its JSON options.
pub type RecipeFactory = fn(&serde_json::Value) -> Result<Arc<dyn Recipe>, RecipeError>;

struct Entry {
    descriptor: fn() -> RecipeDescriptor,
    build: RecipeFactory,
}

/// Name -> factory table for recipes that can be configured.
pub struct RecipeRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl RecipeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Creates a registry holding every built-in recipe.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(AddPlugin::NAME, AddPlugin::descriptor, |options| {
            Ok(Arc::new(AddPlugin::from_options(options)?))
        });
        registry.register(AutoFormat::NAME, AutoFormat::descriptor, |options| {
            Ok(Arc::new(AutoFormat::from_options(options)?))
        });
        registry.register(ChangeValue::NAME, ChangeValue::descriptor, |options| {
            Ok(Arc::new(ChangeValue::from_options(options)?))
        });
        registry.register(FindText::NAME, FindText::descriptor, |options| {
            Ok(Arc::new(FindText::from_options(options)?))
        });
        registry
    }

    /// Registers a recipe, replacing any previous entry with the same name.
    pub fn register(
        &mut self,
        name: &'static str,
        descriptor: fn() -> RecipeDescriptor,
        build: RecipeFactory,
    ) {
        self.entries.insert(name, Entry { descriptor, build });
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /// Descriptors of every registered recipe, sorted by name.
    pub fn descriptors(&self) -> Vec<RecipeDescriptor> {
        self.entries.values().map(|entry| (entry.descriptor)()).collect()
    }

    /// Builds the recipe `name` with `options`.
    pub fn build(&self, name: &str, options: &serde_json::Value) -> Result<Arc<dyn Recipe>, RecipeError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| RecipeError::UnknownRecipe(name.to_string()))?;
        debug!(recipe = name, "building recipe");
        (entry.build)(options)
    }

    /// Builds a pipeline from configured recipes, in order.
    pub fn build_pipeline(
        &self,
        recipes: &[RecipeConfig],
        max_cycles: usize,
    ) -> Result<Pipeline, RecipeError> {
        let mut pipeline = Pipeline::new().with_max_cycles(max_cycles);
        for recipe in recipes {
            pipeline.push(self.build(recipe.name(), recipe.options())?);
        }
        Ok(pipeline)
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtins_are_sorted() {
        let registry = RecipeRegistry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["add-plugin", "auto-format", "change-value", "find-text"]);
    }

    #[test]
    fn test_build_by_name() {
        let registry = RecipeRegistry::with_builtins();
        let recipe = registry
            .build(
                "change-value",
                &serde_json::json!({ "key": "a", "new_value": "b" }),
            )
            .unwrap();
        assert_eq!(recipe.name(), "change-value");
        assert_eq!(recipe.options().len(), 2);
    }

    #[test]
    fn test_unknown_recipe() {
        let registry = RecipeRegistry::with_builtins();
        let err = registry.build("nope", &serde_json::Value::Null).err().unwrap();
        assert_eq!(err, RecipeError::UnknownRecipe("nope".into()));
    }

    #[test]
    fn test_build_pipeline_keeps_order() {
        let registry = RecipeRegistry::with_builtins();
        let recipes = vec![
            RecipeConfig::Name("auto-format".into()),
            RecipeConfig::Detail {
                name: "find-text".into(),
                options: serde_json::json!({ "text": "TODO" }),
            },
        ];
        let pipeline = registry.build_pipeline(&recipes, 5).unwrap();
        let names: Vec<_> = pipeline.recipes().iter().map(|r| r.name().to_string()).collect();
        assert_eq!(names, vec!["auto-format", "find-text"]);
        assert_eq!(pipeline.max_cycles(), 5);
    }

    #[test]
    fn test_descriptors_declare_options() {
        let registry = RecipeRegistry::with_builtins();
        let add_plugin = registry
            .descriptors()
            .into_iter()
            .find(|d| d.name == "add-plugin")
            .unwrap();
        let required: Vec<_> = add_plugin
            .options
            .iter()
            .map(|option| (option.name, option.required))
            .collect();
        assert_eq!(
            required,
            vec![("plugin_id", true), ("version", true), ("version_pattern", false)]
        );
    }
}
