//! Built-in recipes.

mod add_plugin;
mod auto_format;
mod change_value;
mod find_text;

pub use add_plugin::{AddPlugin, AddPluginOptions, VersionSelector};
pub use auto_format::AutoFormat;
pub use change_value::{ChangeValue, ChangeValueOptions};
pub use find_text::{FindText, FindTextOptions};

use serde::de::DeserializeOwned;

use crate::RecipeError;

/// Deserializes recipe options, treating `null` as an empty object.
pub(crate) fn parse_options<T: DeserializeOwned>(
    recipe: &str,
    options: &serde_json::Value,
) -> Result<T, RecipeError> {
    let value = match options {
        serde_json::Value::Null => serde_json::Value::Object(serde_json::Map::new()),
        other => other.clone(),
    };
    serde_json::from_value(value).map_err(|e| RecipeError::invalid_options(recipe, e.to_string()))
}
