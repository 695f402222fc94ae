//! Run configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use indexmap::IndexMap;
use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::RunError;
use crate::markers::{PluginRepositories, SourceRole};
use crate::style::StylesConfig;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Configuration file names looked up in the working directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &[".remold.jsonc", ".remold.json"];

/// Configuration for a run over files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Recipes to apply, in order.
    #[serde(default)]
    pub recipes: Vec<RecipeConfig>,

    /// File patterns to include.
    #[serde(default)]
    pub include: Vec<String>,

    /// File patterns to exclude.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Abort the whole batch on the first failing document.
    #[serde(default)]
    pub fail_fast: bool,

    /// Maximum number of pipeline cycles per document.
    #[serde(default = "default_max_cycles")]
    pub max_cycles: usize,

    /// Style markers attached to documents that carry none.
    #[serde(default)]
    pub styles: StylesConfig,

    /// File glob -> role of matching documents, tried in the order written.
    /// First match wins.
    #[serde(default = "default_roles")]
    pub roles: IndexMap<String, SourceRole>,

    /// Plugin repositories attached to settings documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plugin_repositories: Option<PluginRepositories>,

    /// Base directory for resolving relative patterns.
    /// This is usually the directory containing the configuration file.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

fn default_max_cycles() -> usize {
    3
}

fn default_roles() -> IndexMap<String, SourceRole> {
    IndexMap::from([
        ("**/build.*".to_string(), SourceRole::Build),
        ("**/settings.*".to_string(), SourceRole::Settings),
    ])
}

/// A configured recipe: its name, optionally with options.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum RecipeConfig {
    /// String shorthand: `"auto-format"`.
    Name(String),
    /// Detailed definition object.
    Detail {
        name: String,
        #[serde(default)]
        options: serde_json::Value,
    },
}

impl RecipeConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detail { name, .. } => name,
        }
    }

    pub fn options(&self) -> &serde_json::Value {
        static NO_OPTIONS: serde_json::Value = serde_json::Value::Null;
        match self {
            Self::Name(_) => &NO_OPTIONS,
            Self::Detail { options, .. } => options,
        }
    }
}

impl RunConfig {
    /// Creates a configuration with no recipes and default settings.
    pub fn new() -> Self {
        Self {
            recipes: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            fail_fast: false,
            max_cycles: default_max_cycles(),
            styles: StylesConfig::default(),
            roles: default_roles(),
            plugin_repositories: None,
            base_dir: None,
        }
    }

    /// Loads configuration from a file.
    ///
    /// Supports `.remold.jsonc` and `.remold.json`; comments and trailing
    /// commas are accepted in both.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| RunError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;

        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Looks for a configuration file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.is_file())
    }

    /// Parses configuration from a JSONC string with schema validation.
    pub fn from_json(json: &str) -> Result<Self, RunError> {
        let parse_options = ParseOptions::default();
        let value = jsonc_parser::parse_to_serde_value(json, &parse_options)
            .map_err(|e| RunError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let schema = CONFIG_SCHEMA
            .get_or_init(|| {
                let schema_json: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
                    .map_err(|e| format!("Invalid embedded config schema: {}", e))?;
                Validator::new(&schema_json)
                    .map_err(|e| format!("Invalid config schema compilation: {}", e))
            })
            .as_ref()
            .map_err(|e| RunError::config(e.clone()))?;

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(RunError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| RunError::config(format!("Invalid config: {}", e)))
    }

    /// Computes a hash identifying this configuration.
    pub fn hash(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_default();
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn test_config_new() {
        let config = RunConfig::new();
        assert!(config.recipes.is_empty());
        assert_eq!(config.max_cycles, 3);
        assert!(!config.fail_fast);
        assert_eq!(config.roles.get("**/settings.*"), Some(&SourceRole::Settings));
    }

    #[test]
    fn test_config_from_jsonc() {
        let json = r#"{
            // recipes run in order
            "recipes": [
                "auto-format",
                { "name": "change-value", "options": { "key": "a", "new_value": "b" } },
            ],
            "include": ["**/*.conf"],
            "fail_fast": true,
            "max_cycles": 5,
            "styles": { "tabs_and_indents": { "indent_size": 2 } },
            "roles": { "**/*.settings": "settings" },
            "plugin_repositories": {
                "repositories": ["gradlePluginPortal"],
                "versions": { "com.example.tool": ["1.0.0"] }
            }
        }"#;

        let config = RunConfig::from_json(json).unwrap();
        assert_eq!(config.recipes.len(), 2);
        assert_eq!(config.recipes[0], RecipeConfig::Name("auto-format".into()));
        assert_eq!(config.recipes[1].name(), "change-value");
        assert_eq!(config.recipes[1].options()["key"], "a");
        assert!(config.fail_fast);
        assert_eq!(config.max_cycles, 5);
        assert_eq!(
            config.styles.tabs_and_indents.as_ref().map(|s| s.indent_size),
            Some(2)
        );
        assert_eq!(config.roles.len(), 1);
        assert_eq!(
            config
                .plugin_repositories
                .as_ref()
                .map(|r| r.versions_of("com.example.tool").len()),
            Some(1)
        );
    }

    #[test]
    fn test_empty_document_is_default() {
        let config = RunConfig::from_json("").unwrap();
        assert!(config.recipes.is_empty());
        assert_eq!(config.max_cycles, 3);
    }

    #[test]
    fn test_config_validation_errors() {
        let err = RunConfig::from_json(r#"{ "max_cycles": 0 }"#).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));

        let err = RunConfig::from_json(r#"{ "recipes": [42] }"#).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));

        let err = RunConfig::from_json(r#"{ "unknown": true }"#).unwrap_err();
        assert!(err.to_string().contains("Config validation failed"));
    }

    #[test]
    fn test_invalid_json() {
        let err = RunConfig::from_json("{ invalid").unwrap_err();
        assert!(err.to_string().contains("Invalid JSON"));
    }

    #[test]
    fn test_from_file_sets_base_dir() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(".remold.jsonc");
        std::fs::write(&path, r#"{ "recipes": ["auto-format"] }"#).unwrap();

        assert_eq!(RunConfig::discover(dir.path()), Some(path.clone()));
        let config = RunConfig::from_file(&path).unwrap();
        assert_eq!(config.base_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_hash_tracks_content() {
        let a = RunConfig::new();
        let mut b = RunConfig::new();
        assert_eq!(a.hash(), b.hash());
        b.fail_fast = true;
        assert_ne!(a.hash(), b.hash());
        assert_eq!(a.hash().len(), 64);
    }
}
